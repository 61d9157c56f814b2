//! RDF data interfaces, loosely following
//! [RDF/JS: Data model specification](https://rdf.js.org/data-model-spec/),
//! pared down to what the canonicalization boundary needs (spec §3): no
//! SPARQL variables, no quoted-triple subjects.

use std::collections::BTreeMap;

/// An IRI (example: `"http://example.org/resource"`).
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug, Hash)]
pub struct NamedNode {
    pub value: String,
}

impl NamedNode {
    pub fn new(value: impl Into<String>) -> Self {
        NamedNode { value: value.into() }
    }
}

/// A blank node. `value` is the bare local label, without the `_:` prefix
/// used in serialized forms.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug, Hash)]
pub struct BlankNode {
    pub value: String,
}

impl BlankNode {
    pub fn new(value: impl Into<String>) -> Self {
        BlankNode { value: value.into() }
    }
}

/// A literal: lexical value, datatype, and an optional language tag present
/// iff the datatype is `rdf:langString` (spec §3).
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: NamedNode,
    pub language: Option<String>,
}

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

impl Literal {
    /// Builds a plain literal with the implicit `xsd:string` datatype.
    pub fn new_simple(value: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: NamedNode::new(XSD_STRING),
            language: None,
        }
    }

    /// Builds a language-tagged literal with the implicit `rdf:langString` datatype.
    pub fn new_lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: NamedNode::new(RDF_LANG_STRING),
            language: Some(language.into()),
        }
    }

    /// Builds a literal with an explicit datatype.
    pub fn new_typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Literal {
            value: value.into(),
            datatype,
            language: None,
        }
    }
}

/// The subject of a triple: an IRI or a blank node (spec §3).
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug, Hash)]
pub enum Subject {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

/// A term appearing in object position: an IRI, a blank node, or a literal.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug, Hash)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
}

/// A quad's graph-name component: absent (default graph), an IRI, or a
/// blank node (never a literal — spec §3).
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug, Hash, Default)]
pub enum GraphName {
    #[default]
    DefaultGraph,
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

/// A triple: subject, predicate (always an IRI), object.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Subject, predicate: NamedNode, object: Term) -> Self {
        Triple {
            subject,
            predicate,
            object,
        }
    }
}

/// A triple plus its graph name; the unit this crate hashes, rewrites, and
/// serializes (spec §3).
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Quad {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Term,
    pub graph_name: GraphName,
}

impl Quad {
    pub fn new(subject: Subject, predicate: NamedNode, object: Term, graph_name: GraphName) -> Self {
        Quad {
            subject,
            predicate,
            object,
            graph_name,
        }
    }

    pub fn triple(&self) -> Triple {
        Triple::new(self.subject.clone(), self.predicate.clone(), self.object.clone())
    }
}

/// A mapping from graph-name to its sequence of triples (spec §3). The
/// default graph uses [`GraphName::DefaultGraph`] as its key, distinct from
/// any IRI or blank-node-named graph.
///
/// Triples are deduplicated on insert: two triples identical in every
/// component (including literal language/datatype) never both appear in
/// the same graph.
#[derive(Default, Clone, Debug)]
pub struct Dataset {
    graphs: BTreeMap<GraphName, Vec<Triple>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `triple` into `graph`, skipping it if an equal triple is
    /// already present in that graph.
    pub fn insert(&mut self, graph: GraphName, triple: Triple) {
        let triples = self.graphs.entry(graph).or_default();
        if !triples.contains(&triple) {
            triples.push(triple);
        }
    }

    /// Inserts a whole quad, splitting it into its graph key and triple.
    pub fn insert_quad(&mut self, quad: Quad) {
        self.insert(quad.graph_name, quad.triple());
    }

    /// Iterates every graph and its triples, in graph-key order.
    pub fn graphs(&self) -> impl Iterator<Item = (&GraphName, &[Triple])> {
        self.graphs.iter().map(|(g, ts)| (g, ts.as_slice()))
    }

    /// Iterates every quad in the dataset (default-graph triples plus
    /// triples from named/blank graphs, each with its graph name attached).
    pub fn quads(&self) -> impl Iterator<Item = Quad> + '_ {
        self.graphs.iter().flat_map(|(graph, triples)| {
            triples.iter().map(move |t| {
                Quad::new(
                    t.subject.clone(),
                    t.predicate.clone(),
                    t.object.clone(),
                    graph.clone(),
                )
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.values().all(|ts| ts.is_empty())
    }

    pub fn len(&self) -> usize {
        self.graphs.values().map(|ts| ts.len()).sum()
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        for quad in iter {
            dataset.insert_quad(quad);
        }
        dataset
    }
}
