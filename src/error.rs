use thiserror::Error;

/// Errors raised by the N-Quads codec and the canonicalization driver.
///
/// Every fallible entry point in this crate returns `Result<_, CanonicalizationError>`;
/// there are no panics and no partial results (spec §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// A line of N-Quads text did not match the grammar. Carries the
    /// offending 1-based line number.
    #[error("malformed N-Quad at line {0}")]
    MalformedQuad(usize),

    /// `canonicalize` was asked for an output format it doesn't understand.
    /// Carries the offending format string.
    #[error("unknown output format: {0}")]
    UnknownFormat(String),

    /// `canonicalize` was asked to run an algorithm that isn't URDNA2015 or
    /// URGNA2012. Carries the offending algorithm string.
    #[error("unknown canonicalization algorithm: {0}")]
    UnknownAlgorithm(String),

    /// A rewrite step looked up a canonical label that was never issued.
    /// Indicates a driver invariant was violated; not reachable from
    /// well-formed input.
    #[error("canonical identifier does not exist for the given blank node")]
    CanonicalIdentifierMissing,

    /// Hex-encoding a digest failed. Practically unreachable: digest output
    /// is always a fixed, valid byte length for SHA-256/SHA-1.
    #[error("base16 encoding of a digest failed")]
    Base16EncodingFailed,
}
