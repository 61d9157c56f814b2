//! The canonicalization driver (spec §4.6): simple labeling to a fixed
//! point, N-degree labeling for whatever is left ambiguous, then rewriting
//! blank node labels to their canonical form.

use crate::error::CanonicalizationError;
use crate::hash::{
    hash_first_degree_quads_cached, hash_n_degree_quads, Algorithm, HashNDegreeQuadsResult, QuadsByBlankNode,
};
use crate::issuer::IdentifierIssuer;
use crate::rdf::{BlankNode, Dataset, GraphName, Quad, Subject, Term};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

const CANONICAL_IDENTIFIER_PREFIX: &str = "c14n";
const TEMPORARY_IDENTIFIER_PREFIX: &str = "b";

/// The per-blank-node quad index and canonical issuer accumulated across the
/// labeling passes (spec §4.3).
struct CanonicalizationState {
    quads_by_blank_node: QuadsByBlankNode,
    canonical_issuer: IdentifierIssuer,
}

impl CanonicalizationState {
    fn new(quads: &[Quad]) -> Self {
        let mut quads_by_blank_node: QuadsByBlankNode = BTreeMap::new();
        for quad in quads {
            if let Subject::BlankNode(b) = &quad.subject {
                quads_by_blank_node.entry(b.value.clone()).or_default().quads.push(quad.clone());
            }
            if let Term::BlankNode(b) = &quad.object {
                quads_by_blank_node.entry(b.value.clone()).or_default().quads.push(quad.clone());
            }
            if let GraphName::BlankNode(b) = &quad.graph_name {
                quads_by_blank_node.entry(b.value.clone()).or_default().quads.push(quad.clone());
            }
        }
        CanonicalizationState {
            quads_by_blank_node,
            canonical_issuer: IdentifierIssuer::new(CANONICAL_IDENTIFIER_PREFIX),
        }
    }
}

/// Runs the simple-labeling fixed point (spec §4.6 step 3): repeatedly
/// hashes every not-yet-canonical blank node with
/// [`hash_first_degree_quads`], and issues a canonical identifier to any
/// node whose hash is unique in that round. Stops when a round issues
/// nothing new. Returns the final hash-to-blank-nodes grouping, needed by
/// the N-degree pass to know which buckets are still ambiguous.
fn label_simple(
    algorithm: Algorithm,
    state: &mut CanonicalizationState,
) -> Result<BTreeMap<String, Vec<String>>, CanonicalizationError> {
    let mut non_normalized: Vec<String> = state.quads_by_blank_node.keys().cloned().collect();
    let mut hash_to_blank_nodes: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let mut progress = true;
    while progress {
        progress = false;
        hash_to_blank_nodes = BTreeMap::new();

        for id in &non_normalized {
            let hash = hash_first_degree_quads_cached(algorithm, &state.quads_by_blank_node, id)?;
            hash_to_blank_nodes.entry(hash).or_default().push(id.clone());
        }

        non_normalized = Vec::new();
        for ids in hash_to_blank_nodes.values() {
            if ids.len() > 1 {
                non_normalized.extend(ids.iter().cloned());
                continue;
            }
            state.canonical_issuer.issue(&ids[0]);
            progress = true;
        }
        debug!(remaining = non_normalized.len(), "simple labeling round complete");
    }

    Ok(hash_to_blank_nodes)
}

/// Runs the N-degree labeling pass (spec §4.6 step 4) over whatever buckets
/// [`label_simple`] left with more than one member: for each such bucket,
/// computes every still-unlabeled member's N-degree hash with a throwaway
/// issuer, sorts the results by hash, and replays each winning issuer's
/// issuance order onto the shared canonical issuer.
fn label_n_degree(
    algorithm: Algorithm,
    state: &mut CanonicalizationState,
    hash_to_blank_nodes: &BTreeMap<String, Vec<String>>,
) -> Result<(), CanonicalizationError> {
    for ids in hash_to_blank_nodes.values() {
        if ids.len() == 1 {
            continue;
        }

        let mut hash_path_list: Vec<HashNDegreeQuadsResult> = Vec::new();
        for id in ids {
            if state.canonical_issuer.has(id) {
                continue;
            }
            let mut temp_issuer = IdentifierIssuer::new(TEMPORARY_IDENTIFIER_PREFIX);
            temp_issuer.issue(id);
            let result = hash_n_degree_quads(
                algorithm,
                &state.quads_by_blank_node,
                &state.canonical_issuer,
                id,
                &temp_issuer,
            )?;
            hash_path_list.push(result);
        }

        hash_path_list.sort_by(|a, b| a.hash.cmp(&b.hash));
        for result in hash_path_list {
            for old_id in result.issuer.order() {
                state.canonical_issuer.issue(old_id);
            }
        }
    }
    Ok(())
}

/// Looks up `old`'s canonical label, unless `old` is already in canonical
/// form — a blank node label already carrying the `c14n` prefix is left
/// untouched rather than relooked-up (spec §4.6 step 5; pyld `canon.py`'s
/// `not component['value'].startswith(self.canonical_issuer.prefix)` guard).
fn canonical_label(old: &str, issuer: &IdentifierIssuer) -> Result<String, CanonicalizationError> {
    if old.starts_with(CANONICAL_IDENTIFIER_PREFIX) {
        return Ok(old.to_string());
    }
    issuer
        .get(old)
        .map(str::to_string)
        .ok_or(CanonicalizationError::CanonicalIdentifierMissing)
}

fn relabel_subject(subject: &Subject, issuer: &IdentifierIssuer) -> Result<Subject, CanonicalizationError> {
    match subject {
        Subject::BlankNode(b) => Ok(Subject::BlankNode(BlankNode::new(canonical_label(&b.value, issuer)?))),
        Subject::NamedNode(n) => Ok(Subject::NamedNode(n.clone())),
    }
}

fn relabel_object(object: &Term, issuer: &IdentifierIssuer) -> Result<Term, CanonicalizationError> {
    match object {
        Term::BlankNode(b) => Ok(Term::BlankNode(BlankNode::new(canonical_label(&b.value, issuer)?))),
        other => Ok(other.clone()),
    }
}

fn relabel_graph_name(graph: &GraphName, issuer: &IdentifierIssuer) -> Result<GraphName, CanonicalizationError> {
    match graph {
        GraphName::BlankNode(b) => Ok(GraphName::BlankNode(BlankNode::new(canonical_label(&b.value, issuer)?))),
        other => Ok(other.clone()),
    }
}

/// Canonicalizes `dataset` under `algorithm`: every blank node is rewritten
/// to a canonical `c14n`-prefixed identifier, stable across isomorphic
/// inputs (spec §4.6, §5). The returned dataset still needs
/// [`crate::nquads::serialize_dataset`] to become the final sorted N-Quads
/// text.
#[instrument(skip(dataset), fields(algorithm = ?algorithm, quads = dataset.len()))]
pub fn canonicalize(dataset: &Dataset, algorithm: Algorithm) -> Result<Dataset, CanonicalizationError> {
    let quads: Vec<Quad> = dataset.quads().collect();
    let mut state = CanonicalizationState::new(&quads);

    let hash_to_blank_nodes = label_simple(algorithm, &mut state)?;
    label_n_degree(algorithm, &mut state, &hash_to_blank_nodes)?;

    let mut canonical = Dataset::new();
    for quad in &quads {
        let subject = relabel_subject(&quad.subject, &state.canonical_issuer)?;
        let object = relabel_object(&quad.object, &state.canonical_issuer)?;
        let graph_name = relabel_graph_name(&quad.graph_name, &state.canonical_issuer)?;
        canonical.insert_quad(Quad::new(subject, quad.predicate.clone(), object, graph_name));
    }
    Ok(canonical)
}
