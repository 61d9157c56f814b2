//! Public surface of the crate (spec §6): `canonicalize`, `parse_nquads`,
//! `serialize_dataset`.

use crate::canon;
use crate::error::CanonicalizationError;
use crate::hash::Algorithm;
use crate::nquads;
use crate::rdf::Dataset;

/// The two names `canonicalize` accepts for `options.algorithm`.
const URDNA2015: &str = "URDNA2015";
const URGNA2012: &str = "URGNA2012";

/// The one output format `canonicalize` accepts for `options.format`.
const APPLICATION_N_QUADS: &str = "application/n-quads";
const APPLICATION_N_QUADS_ALIAS: &str = "application/nquads";

/// Options accepted by [`canonicalize`] (spec §6).
///
/// `algorithm` must be `"URDNA2015"` or `"URGNA2012"`; any other value
/// fails with [`CanonicalizationError::UnknownAlgorithm`]. `format`, if
/// present, must be `"application/n-quads"` (alias `"application/nquads"`);
/// any other value fails with [`CanonicalizationError::UnknownFormat`].
#[derive(Debug, Clone)]
pub struct CanonicalizationOptions {
    pub algorithm: String,
    pub format: Option<String>,
}

impl Default for CanonicalizationOptions {
    /// `URDNA2015`, no format — the result is a [`CanonicalizationOutput::Dataset`].
    fn default() -> Self {
        CanonicalizationOptions {
            algorithm: URDNA2015.to_string(),
            format: None,
        }
    }
}

/// The result of [`canonicalize`]: either the joined N-Quads string (when
/// `options.format` was given) or the canonicalized dataset itself.
#[derive(Debug, Clone)]
pub enum CanonicalizationOutput {
    NQuads(String),
    Dataset(Dataset),
}

impl CanonicalizationOutput {
    /// Returns the N-Quads string, if this is that variant.
    pub fn as_nquads(&self) -> Option<&str> {
        match self {
            CanonicalizationOutput::NQuads(s) => Some(s),
            CanonicalizationOutput::Dataset(_) => None,
        }
    }

    /// Returns the dataset, if this is that variant.
    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            CanonicalizationOutput::Dataset(d) => Some(d),
            CanonicalizationOutput::NQuads(_) => None,
        }
    }
}

fn parse_algorithm(algorithm: &str) -> Result<Algorithm, CanonicalizationError> {
    match algorithm {
        URDNA2015 => Ok(Algorithm::Urdna2015),
        URGNA2012 => Ok(Algorithm::Urgna2012),
        other => Err(CanonicalizationError::UnknownAlgorithm(other.to_string())),
    }
}

/// Canonicalizes `dataset` per `options`, returning either a joined N-Quads
/// string or a parsed dataset depending on `options.format` (spec §6).
///
/// Isomorphic input datasets — equal as sets of quads up to blank node
/// relabeling — always produce identical output.
///
/// # Examples
///
/// ```
/// use rdf_canon_core::{canonicalize, parse_nquads, CanonicalizationOptions};
///
/// let input = parse_nquads("_:b0 <http://example.org/vocab#type> <http://example.org/vocab#Foo> .\n").unwrap();
///
/// let options = CanonicalizationOptions {
///     algorithm: "URDNA2015".to_string(),
///     format: Some("application/n-quads".to_string()),
/// };
/// let canonicalized = canonicalize(&input, &options).unwrap();
/// assert_eq!(
///     canonicalized.as_nquads().unwrap(),
///     "_:c14n0 <http://example.org/vocab#type> <http://example.org/vocab#Foo> .\n",
/// );
/// ```
pub fn canonicalize(
    dataset: &Dataset,
    options: &CanonicalizationOptions,
) -> Result<CanonicalizationOutput, CanonicalizationError> {
    let algorithm = parse_algorithm(&options.algorithm)?;
    let canonical = canon::canonicalize(dataset, algorithm)?;

    match &options.format {
        None => Ok(CanonicalizationOutput::Dataset(canonical)),
        Some(format) if format == APPLICATION_N_QUADS || format == APPLICATION_N_QUADS_ALIAS => {
            Ok(CanonicalizationOutput::NQuads(nquads::serialize_dataset(&canonical)))
        }
        Some(other) => Err(CanonicalizationError::UnknownFormat(other.clone())),
    }
}

/// Parses N-Quads text into a [`Dataset`] (spec §4.2, §6).
///
/// # Examples
///
/// ```
/// use rdf_canon_core::parse_nquads;
///
/// let dataset = parse_nquads("<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n").unwrap();
/// assert_eq!(dataset.len(), 1);
/// ```
pub fn parse_nquads(text: &str) -> Result<Dataset, CanonicalizationError> {
    nquads::parse(text)
}

/// Serializes `dataset` to N-Quads text, sorted lexicographically over
/// code units (spec §4.2, §6).
///
/// # Examples
///
/// ```
/// use rdf_canon_core::{parse_nquads, serialize_dataset};
///
/// let dataset = parse_nquads("<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n").unwrap();
/// assert_eq!(
///     serialize_dataset(&dataset),
///     "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n"
/// );
/// ```
pub fn serialize_dataset(dataset: &Dataset) -> String {
    nquads::serialize_dataset(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_return_a_dataset_not_a_string() {
        let dataset = parse_nquads("_:a <http://e/p> _:b .\n").unwrap();
        let result = canonicalize(&dataset, &CanonicalizationOptions::default()).unwrap();
        assert!(result.as_dataset().is_some());
        assert!(result.as_nquads().is_none());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dataset = parse_nquads("_:a <http://e/p> _:b .\n").unwrap();
        let options = CanonicalizationOptions {
            algorithm: "URDNA2015".to_string(),
            format: Some("text/turtle".to_string()),
        };
        let err = canonicalize(&dataset, &options).unwrap_err();
        assert_eq!(err, CanonicalizationError::UnknownFormat("text/turtle".to_string()));
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let dataset = parse_nquads("_:a <http://e/p> _:b .\n").unwrap();
        let options = CanonicalizationOptions {
            algorithm: "URGNA2015".to_string(),
            format: None,
        };
        let err = canonicalize(&dataset, &options).unwrap_err();
        assert_eq!(err, CanonicalizationError::UnknownAlgorithm("URGNA2015".to_string()));
    }

    #[test]
    fn both_algorithms_run_to_completion_on_a_two_node_cycle() {
        let dataset = parse_nquads("_:a <http://e/p> _:b .\n_:b <http://e/p> _:a .\n").unwrap();
        for algorithm in ["URDNA2015", "URGNA2012"] {
            let options = CanonicalizationOptions {
                algorithm: algorithm.to_string(),
                format: Some("application/nquads".to_string()),
            };
            let result = canonicalize(&dataset, &options).unwrap();
            let text = result.as_nquads().unwrap();
            assert!(text.contains("_:c14n0"));
            assert!(text.contains("_:c14n1"));
        }
    }
}
