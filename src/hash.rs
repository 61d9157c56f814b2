//! First-degree and N-degree blank node hashing (spec §4.3–§4.5): turning a
//! blank node's local context into a fixed-length digest that is stable
//! under relabeling.

use crate::error::CanonicalizationError;
use crate::issuer::IdentifierIssuer;
use crate::nquads;
use crate::rdf::{BlankNode, GraphName, Quad, Subject, Term};
use digest::Digest;
use itertools::Itertools;
use sha1::Sha1;
use sha2::Sha256;
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::trace;

/// A blank node's quads, plus its first-degree hash once computed (spec §3:
/// `blank_node_info[id] = { quads, hash: optional_cached_first_degree_hash }`).
/// The hash is cached behind a `RefCell` so it can be filled in lazily
/// through the shared, otherwise read-only map that the N-degree search
/// passes around by reference (spec §9: "the first-degree hash is called
/// many times per blank node during N-degree recursion; memoize on the
/// blank node label").
#[derive(Default)]
pub struct BlankNodeInfo {
    pub quads: Vec<Quad>,
    hash: RefCell<Option<String>>,
}

impl BlankNodeInfo {
    pub fn new(quads: Vec<Quad>) -> Self {
        BlankNodeInfo {
            quads,
            hash: RefCell::new(None),
        }
    }
}

/// Maps a blank node's local label to its [`BlankNodeInfo`] — precomputed
/// once by the driver and threaded through every hash call (spec §4.3 step
/// 1, §4.5 step 1).
pub type QuadsByBlankNode = BTreeMap<String, BlankNodeInfo>;

/// Which canonicalization algorithm is in effect. The two differ in digest
/// choice, first-degree graph-name masking, predicate bracketing in
/// related-node hashing, and which components of a quad are considered
/// related at all (spec §4, §9).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Algorithm {
    Urdna2015,
    Urgna2012,
}

impl Algorithm {
    fn digest_hex(self, input: &str) -> Result<String, CanonicalizationError> {
        let bytes: Vec<u8> = match self {
            Algorithm::Urdna2015 => Sha256::digest(input.as_bytes()).to_vec(),
            Algorithm::Urgna2012 => Sha1::digest(input.as_bytes()).to_vec(),
        };
        let mut buf = vec![0u8; bytes.len() * 2];
        let hex = base16ct::lower::encode_str(&bytes, &mut buf)
            .map_err(|_| CanonicalizationError::Base16EncodingFailed)?;
        Ok(hex.to_string())
    }
}

fn is_default_graph(quad: &Quad) -> bool {
    matches!(quad.graph_name, GraphName::DefaultGraph)
}

fn mask_subject(subject: &Subject, id: &str) -> Subject {
    match subject {
        Subject::BlankNode(b) => Subject::BlankNode(mask_label(&b.value, id)),
        Subject::NamedNode(n) => Subject::NamedNode(n.clone()),
    }
}

fn mask_object(object: &Term, id: &str) -> Term {
    match object {
        Term::BlankNode(b) => Term::BlankNode(mask_label(&b.value, id)),
        other => other.clone(),
    }
}

fn mask_label(value: &str, id: &str) -> BlankNode {
    BlankNode::new(if value == id { "a" } else { "z" })
}

fn mask_graph_name(graph: &GraphName, id: &str, algorithm: Algorithm) -> GraphName {
    match graph {
        GraphName::BlankNode(b) => match algorithm {
            // URGNA2012 collapses every blank-node graph name to a single
            // placeholder; URDNA2015 applies the same a/z rule as subject
            // and object.
            Algorithm::Urgna2012 => GraphName::BlankNode(BlankNode::new("g")),
            Algorithm::Urdna2015 => GraphName::BlankNode(mask_label(&b.value, id)),
        },
        other => other.clone(),
    }
}

/// Hashes the quads mentioning `id` after masking every blank node label:
/// `id` itself becomes `_:a`, every other blank node becomes `_:z` (spec
/// §4.3).
pub fn hash_first_degree_quads(
    algorithm: Algorithm,
    quads: &[Quad],
    id: &str,
) -> Result<String, CanonicalizationError> {
    let mut lines: Vec<String> = quads
        .iter()
        .map(|quad| {
            let masked = Quad::new(
                mask_subject(&quad.subject, id),
                quad.predicate.clone(),
                mask_object(&quad.object, id),
                mask_graph_name(&quad.graph_name, id, algorithm),
            );
            nquads::serialize_quad(&masked)
        })
        .collect();
    lines.sort();
    algorithm.digest_hex(&lines.concat())
}

/// As [`hash_first_degree_quads`], but reads and fills the per-node cache
/// in `quads_by_blank_node` rather than recomputing the digest on every
/// call (spec §3, §9).
pub(crate) fn hash_first_degree_quads_cached(
    algorithm: Algorithm,
    quads_by_blank_node: &QuadsByBlankNode,
    id: &str,
) -> Result<String, CanonicalizationError> {
    let info = quads_by_blank_node.get(id);
    if let Some(info) = info {
        if let Some(cached) = info.hash.borrow().as_ref() {
            return Ok(cached.clone());
        }
    }

    let quads = info.map(|i| i.quads.as_slice()).unwrap_or(&[]);
    let hash = hash_first_degree_quads(algorithm, quads, id)?;
    if let Some(info) = info {
        *info.hash.borrow_mut() = Some(hash.clone());
    }
    Ok(hash)
}

fn related_predicate(algorithm: Algorithm, quad: &Quad) -> String {
    match algorithm {
        Algorithm::Urdna2015 => format!("<{}>", quad.predicate.value),
        Algorithm::Urgna2012 => quad.predicate.value.clone(),
    }
}

/// Hashes a related blank node relative to the quad that relates it,
/// preferring a canonical identifier if one is already issued, then one
/// from the in-progress issuer, falling back to the related node's own
/// first-degree hash (spec §4.4).
fn hash_related_blank_node(
    algorithm: Algorithm,
    related: &str,
    quad: &Quad,
    issuer: &IdentifierIssuer,
    canonical_issuer: &IdentifierIssuer,
    position: char,
    quads_by_blank_node: &QuadsByBlankNode,
) -> Result<String, CanonicalizationError> {
    let id = if let Some(c) = canonical_issuer.get(related) {
        c.to_string()
    } else if let Some(i) = issuer.get(related) {
        i.to_string()
    } else {
        hash_first_degree_quads_cached(algorithm, quads_by_blank_node, related)?
    };

    let mut input = String::new();
    input.push(position);
    if position != 'g' {
        input.push_str(&related_predicate(algorithm, quad));
    }
    input.push_str(&id);
    algorithm.digest_hex(&input)
}

/// Buckets `id`'s related blank nodes by their related-node hash (spec
/// §4.5 step 3).
fn create_hash_to_related(
    algorithm: Algorithm,
    id: &str,
    issuer: &IdentifierIssuer,
    canonical_issuer: &IdentifierIssuer,
    quads_by_blank_node: &QuadsByBlankNode,
) -> Result<BTreeMap<String, Vec<String>>, CanonicalizationError> {
    let mut hash_to_related: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let quads = quads_by_blank_node
        .get(id)
        .map(|info| info.quads.as_slice())
        .unwrap_or(&[]);

    for quad in quads {
        match algorithm {
            Algorithm::Urdna2015 => {
                if let Subject::BlankNode(b) = &quad.subject {
                    if b.value != id {
                        let hash = hash_related_blank_node(
                            algorithm,
                            &b.value,
                            quad,
                            issuer,
                            canonical_issuer,
                            's',
                            quads_by_blank_node,
                        )?;
                        hash_to_related.entry(hash).or_default().push(b.value.clone());
                    }
                }
                if let Term::BlankNode(b) = &quad.object {
                    if b.value != id {
                        let hash = hash_related_blank_node(
                            algorithm,
                            &b.value,
                            quad,
                            issuer,
                            canonical_issuer,
                            'o',
                            quads_by_blank_node,
                        )?;
                        hash_to_related.entry(hash).or_default().push(b.value.clone());
                    }
                }
                if !is_default_graph(quad) {
                    if let GraphName::BlankNode(b) = &quad.graph_name {
                        if b.value != id {
                            let hash = hash_related_blank_node(
                                algorithm,
                                &b.value,
                                quad,
                                issuer,
                                canonical_issuer,
                                'g',
                                quads_by_blank_node,
                            )?;
                            hash_to_related.entry(hash).or_default().push(b.value.clone());
                        }
                    }
                }
            }
            Algorithm::Urgna2012 => {
                // subject wins if it is a distinct blank node; only then is
                // the object considered. The graph name never participates.
                let candidate = if let Subject::BlankNode(b) = &quad.subject {
                    if b.value != id {
                        Some((b.value.clone(), 'p'))
                    } else {
                        None
                    }
                } else {
                    None
                }
                .or_else(|| {
                    if let Term::BlankNode(b) = &quad.object {
                        if b.value != id {
                            Some((b.value.clone(), 'r'))
                        } else {
                            None
                        }
                    } else {
                        None
                    }
                });

                if let Some((related, position)) = candidate {
                    let hash = hash_related_blank_node(
                        algorithm,
                        &related,
                        quad,
                        issuer,
                        canonical_issuer,
                        position,
                        quads_by_blank_node,
                    )?;
                    hash_to_related.entry(hash).or_default().push(related);
                }
            }
        }
    }

    Ok(hash_to_related)
}

/// The result of hashing a blank node's N-degree context: a digest and the
/// issuer state accumulated while computing it (spec §4.5 step 6).
pub struct HashNDegreeQuadsResult {
    pub hash: String,
    pub issuer: IdentifierIssuer,
}

/// Computes the N-degree hash of `id`: buckets its related blank nodes by
/// related-node hash, then for each bucket searches every permutation of
/// its members for the lexicographically smallest issuance path, recursing
/// into each member's own N-degree hash along the way (spec §4.5).
///
/// Permutations are pruned as soon as a path can no longer beat the best
/// one found so far for the current bucket: once `chosen_path` is non-empty,
/// any prefix that is already at least as long and lexicographically
/// greater loses, regardless of what follows it.
pub fn hash_n_degree_quads(
    algorithm: Algorithm,
    quads_by_blank_node: &QuadsByBlankNode,
    canonical_issuer: &IdentifierIssuer,
    id: &str,
    issuer: &IdentifierIssuer,
) -> Result<HashNDegreeQuadsResult, CanonicalizationError> {
    let hash_to_related = create_hash_to_related(algorithm, id, issuer, canonical_issuer, quads_by_blank_node)?;
    let mut data_to_hash = String::new();
    let mut issuer = issuer.clone();

    for (related_hash, related) in hash_to_related {
        trace!(id, related_hash = %related_hash, bucket_size = related.len(), "hash_n_degree_quads bucket");
        data_to_hash.push_str(&related_hash);

        let mut chosen_path: Option<String> = None;
        let mut chosen_issuer: Option<IdentifierIssuer> = None;
        let bucket_size = related.len();

        for permutation in related.iter().cloned().permutations(bucket_size) {
            let mut issuer_copy = issuer.clone();
            let mut path = String::new();
            let mut recursion_list = Vec::new();
            let mut skip = false;

            for candidate in &permutation {
                if let Some(c) = canonical_issuer.get(candidate) {
                    path.push_str(c);
                } else {
                    if !issuer_copy.has(candidate) {
                        recursion_list.push(candidate.clone());
                    }
                    path.push_str(&issuer_copy.issue(candidate));
                }
                if let Some(chosen) = &chosen_path {
                    if path.len() >= chosen.len() && &path > chosen {
                        skip = true;
                        break;
                    }
                }
            }

            if !skip {
                for candidate in &recursion_list {
                    let result =
                        hash_n_degree_quads(algorithm, quads_by_blank_node, canonical_issuer, candidate, &issuer_copy)?;
                    path.push_str(
                        issuer_copy
                            .get(candidate)
                            .ok_or(CanonicalizationError::CanonicalIdentifierMissing)?,
                    );
                    path.push('<');
                    path.push_str(&result.hash);
                    path.push('>');
                    issuer_copy = result.issuer;
                    if let Some(chosen) = &chosen_path {
                        if path.len() >= chosen.len() && &path > chosen {
                            skip = true;
                            break;
                        }
                    }
                }
            }

            let better = match &chosen_path {
                None => true,
                Some(chosen) => &path < chosen,
            };
            if !skip && better {
                chosen_path = Some(path);
                chosen_issuer = Some(issuer_copy);
            }
        }

        data_to_hash.push_str(chosen_path.as_deref().unwrap_or(""));
        if let Some(next_issuer) = chosen_issuer {
            issuer = next_issuer;
        }
    }

    let hash = algorithm.digest_hex(&data_to_hash)?;
    Ok(HashNDegreeQuadsResult { hash, issuer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{NamedNode, Quad, Subject, Term};

    fn blank_to_blank_quad(s: &str, o: &str) -> Quad {
        Quad::new(
            Subject::BlankNode(BlankNode::new(s)),
            NamedNode::new("http://example.org/p"),
            Term::BlankNode(BlankNode::new(o)),
            GraphName::DefaultGraph,
        )
    }

    #[test]
    fn first_degree_hash_is_stable_under_relabeling_the_reference_node() {
        let quads = vec![blank_to_blank_quad("b0", "b1")];
        let h1 = hash_first_degree_quads(Algorithm::Urdna2015, &quads, "b0").unwrap();
        let relabeled = vec![blank_to_blank_quad("xyz", "b1")];
        let h2 = hash_first_degree_quads(Algorithm::Urdna2015, &relabeled, "xyz").unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn first_degree_hash_differs_between_reference_and_other_node() {
        let quads = vec![blank_to_blank_quad("b0", "b1")];
        let as_subject = hash_first_degree_quads(Algorithm::Urdna2015, &quads, "b0").unwrap();
        let as_object = hash_first_degree_quads(Algorithm::Urdna2015, &quads, "b1").unwrap();
        assert_ne!(as_subject, as_object);
    }

    #[test]
    fn urgna2012_masks_every_blank_graph_name_identically() {
        let quad = Quad::new(
            Subject::NamedNode(NamedNode::new("http://example.org/s")),
            NamedNode::new("http://example.org/p"),
            Term::NamedNode(NamedNode::new("http://example.org/o")),
            GraphName::BlankNode(BlankNode::new("g0")),
        );
        let masked = mask_graph_name(&quad.graph_name, "anything-else", Algorithm::Urgna2012);
        assert_eq!(masked, GraphName::BlankNode(BlankNode::new("g")));
    }

    #[test]
    fn urdna2015_related_predicate_is_bracketed_urgna2012_is_bare() {
        let quad = blank_to_blank_quad("b0", "b1");
        assert_eq!(related_predicate(Algorithm::Urdna2015, &quad), "<http://example.org/p>");
        assert_eq!(related_predicate(Algorithm::Urgna2012, &quad), "http://example.org/p");
    }

    #[test]
    fn urgna2012_ignores_graph_name_when_bucketing_related_nodes() {
        let mut quads_by_blank_node: QuadsByBlankNode = BTreeMap::new();
        let quad = Quad::new(
            Subject::BlankNode(BlankNode::new("b0")),
            NamedNode::new("http://example.org/p"),
            Term::NamedNode(NamedNode::new("http://example.org/o")),
            GraphName::BlankNode(BlankNode::new("g0")),
        );
        quads_by_blank_node.insert("b0".to_string(), BlankNodeInfo::new(vec![quad]));
        let issuer = IdentifierIssuer::new("_:c14n");
        let buckets = create_hash_to_related(
            Algorithm::Urgna2012,
            "b0",
            &issuer,
            &issuer,
            &quads_by_blank_node,
        )
        .unwrap();
        assert!(buckets.is_empty());
    }

    #[test]
    fn first_degree_hash_is_memoized_after_first_lookup() {
        let mut quads_by_blank_node: QuadsByBlankNode = BTreeMap::new();
        let quad = blank_to_blank_quad("b0", "b1");
        quads_by_blank_node.insert("b0".to_string(), BlankNodeInfo::new(vec![quad]));

        let first = hash_first_degree_quads_cached(Algorithm::Urdna2015, &quads_by_blank_node, "b0").unwrap();
        let cached = quads_by_blank_node.get("b0").unwrap().hash.borrow().clone();
        assert_eq!(cached.as_deref(), Some(first.as_str()));

        let second = hash_first_degree_quads_cached(Algorithm::Urdna2015, &quads_by_blank_node, "b0").unwrap();
        assert_eq!(first, second);
    }
}
