//! N-Quads parser and serializer (spec §4.2) — the wire format at the
//! canonicalization boundary.

use crate::error::CanonicalizationError;
use crate::rdf::{BlankNode, Dataset, GraphName, Literal, NamedNode, Quad, Subject, Term};
use std::iter::Peekable;
use std::str::Chars;

/// Parses N-Quads text into a [`Dataset`].
///
/// Blank lines (whitespace only) are ignored. Every other line must match
/// the N-Quads grammar (subject, predicate, object, optional graph name,
/// terminated by `.`); a line that doesn't fails with
/// [`CanonicalizationError::MalformedQuad`] carrying its 1-based line number.
pub fn parse(text: &str) -> Result<Dataset, CanonicalizationError> {
    let mut dataset = Dataset::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let quad = parse_line(line, line_number)?;
        dataset.insert_quad(quad);
    }
    Ok(dataset)
}

fn parse_line(line: &str, line_number: usize) -> Result<Quad, CanonicalizationError> {
    let mut p = LineScanner::new(line);
    let err = || CanonicalizationError::MalformedQuad(line_number);

    let subject = match p.peek() {
        Some('<') => Subject::NamedNode(NamedNode::new(p.read_iri().ok_or_else(err)?)),
        Some('_') => Subject::BlankNode(BlankNode::new(p.read_blank_node_label().ok_or_else(err)?)),
        _ => return Err(err()),
    };
    p.skip_ws();

    let predicate = match p.peek() {
        Some('<') => NamedNode::new(p.read_iri().ok_or_else(err)?),
        _ => return Err(err()),
    };
    p.skip_ws();

    let object = match p.peek() {
        Some('<') => Term::NamedNode(NamedNode::new(p.read_iri().ok_or_else(err)?)),
        Some('_') => Term::BlankNode(BlankNode::new(p.read_blank_node_label().ok_or_else(err)?)),
        Some('"') => Term::Literal(p.read_literal().ok_or_else(err)?),
        _ => return Err(err()),
    };
    p.skip_ws();

    let graph_name = match p.peek() {
        Some('.') => {
            p.advance();
            GraphName::DefaultGraph
        }
        Some('<') => {
            let iri = p.read_iri().ok_or_else(err)?;
            p.skip_ws();
            p.expect('.').ok_or_else(err)?;
            GraphName::NamedNode(NamedNode::new(iri))
        }
        Some('_') => {
            let label = p.read_blank_node_label().ok_or_else(err)?;
            p.skip_ws();
            p.expect('.').ok_or_else(err)?;
            GraphName::BlankNode(BlankNode::new(label))
        }
        // literals are forbidden in graph-name position (spec §4.2)
        _ => return Err(err()),
    };

    p.skip_ws();
    if !p.at_end() {
        return Err(err());
    }

    Ok(Quad::new(subject, predicate, object, graph_name))
}

/// A minimal hand-rolled scanner over a single N-Quads line. No escaping is
/// attempted inside IRI refs or blank node labels — the grammar this crate
/// validates is exactly what spec §4.2 requires, nothing more.
struct LineScanner<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> LineScanner<'a> {
    fn new(text: &'a str) -> Self {
        LineScanner {
            chars: text.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c == ' ' || c == '\t' || c == '\r') {
            self.advance();
        }
    }

    fn expect(&mut self, expected: char) -> Option<()> {
        if self.peek() == Some(expected) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    /// Reads `<...>`, returning the IRI text between the angle brackets.
    fn read_iri(&mut self) -> Option<String> {
        self.expect('<')?;
        let mut out = String::new();
        loop {
            match self.advance()? {
                '>' => return Some(out),
                c => out.push(c),
            }
        }
    }

    /// Reads `_:label`, returning the bare label (no `_:` prefix).
    fn read_blank_node_label(&mut self) -> Option<String> {
        self.expect('_')?;
        self.expect(':')?;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                out.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// Reads a quoted literal, then its optional `^^<datatype>` or `@lang` suffix.
    fn read_literal(&mut self) -> Option<Literal> {
        self.expect('"')?;
        let mut raw = String::new();
        loop {
            match self.advance()? {
                '"' => break,
                '\\' => {
                    // keep the escape pair intact for `unescape` to resolve
                    raw.push('\\');
                    raw.push(self.advance()?);
                }
                c => raw.push(c),
            }
        }
        let value = unescape(&raw);

        if self.peek() == Some('^') {
            self.advance();
            self.expect('^')?;
            let iri = self.read_iri()?;
            return Some(Literal::new_typed(value, NamedNode::new(iri)));
        }
        if self.peek() == Some('@') {
            self.advance();
            let mut tag = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == '-' {
                    tag.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if tag.is_empty() {
                return None;
            }
            return Some(Literal::new_lang(value, tag));
        }
        Some(Literal::new_simple(value))
    }
}

/// Reverses the escape pairs `\\`, `\t`, `\n`, `\r`, `\"` in a single
/// left-to-right pass, consuming each two-character escape as a unit. This
/// is what makes the "longest-literal rule on `\\`" hold automatically: a
/// `\\` is always resolved before the character after it can be mistaken
/// for the second half of a different escape (e.g. an escaped backslash
/// followed by a literal `n` must not be read as `\n`).
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Escapes `\\`, `\t`, `\n`, `\r`, `\"` for embedding in a quoted literal —
/// the inverse of [`unescape`].
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out
}

fn serialize_named_node(n: &NamedNode) -> String {
    format!("<{}>", n.value)
}

fn serialize_blank_node(n: &BlankNode) -> String {
    format!("_:{}", n.value)
}

fn serialize_literal(l: &Literal) -> String {
    let escaped = escape(&l.value);
    match (&l.language, l.datatype.value.as_str()) {
        (Some(lang), crate::rdf::RDF_LANG_STRING) => format!("\"{}\"@{}", escaped, lang),
        (_, crate::rdf::XSD_STRING) => format!("\"{}\"", escaped),
        (_, datatype) => format!("\"{}\"^^<{}>", escaped, datatype),
    }
}

/// Serializes a single quad to N-Quads form: components separated by a
/// space, terminated by ` .\n` (spec §4.2).
pub fn serialize_quad(quad: &Quad) -> String {
    let subject = match &quad.subject {
        Subject::NamedNode(n) => serialize_named_node(n),
        Subject::BlankNode(n) => serialize_blank_node(n),
    };
    let predicate = serialize_named_node(&quad.predicate);
    let object = match &quad.object {
        Term::NamedNode(n) => serialize_named_node(n),
        Term::BlankNode(n) => serialize_blank_node(n),
        Term::Literal(l) => serialize_literal(l),
    };
    let graph = match &quad.graph_name {
        GraphName::DefaultGraph => None,
        GraphName::NamedNode(n) => Some(serialize_named_node(n)),
        GraphName::BlankNode(n) => Some(serialize_blank_node(n)),
    };
    match graph {
        Some(g) => format!("{subject} {predicate} {object} {g} .\n"),
        None => format!("{subject} {predicate} {object} .\n"),
    }
}

/// Serializes every quad in `dataset`, sorted lexicographically over code
/// units, and concatenated — the canonical textual form (spec §4.2, §4.6
/// step 6).
pub fn serialize_dataset(dataset: &Dataset) -> String {
    let mut lines: Vec<String> = dataset.quads().map(|q| serialize_quad(&q)).collect();
    lines.sort();
    lines.concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Triple;

    #[test]
    fn parses_single_iri_triple() {
        let dataset = parse("<http://e/a> <http://e/p> <http://e/b> .\n").unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(serialize_dataset(&dataset), "<http://e/a> <http://e/p> <http://e/b> .\n");
    }

    #[test]
    fn parses_blank_node_subject_and_literal_object() {
        let dataset = parse("_:x <http://e/p> \"v\" .\n").unwrap();
        let (graph, triples) = dataset.graphs().next().unwrap();
        assert_eq!(*graph, GraphName::DefaultGraph);
        assert_eq!(triples.len(), 1);
        match &triples[0].object {
            Term::Literal(l) => {
                assert_eq!(l.value, "v");
                assert_eq!(l.datatype.value, crate::rdf::XSD_STRING);
                assert!(l.language.is_none());
            }
            _ => panic!("expected literal"),
        }
    }

    #[test]
    fn parses_language_tagged_literal() {
        let dataset = parse("_:x <http://e/p> \"v\"@en .\n").unwrap();
        let (_, triples) = dataset.graphs().next().unwrap();
        match &triples[0].object {
            Term::Literal(l) => {
                assert_eq!(l.language.as_deref(), Some("en"));
                assert_eq!(l.datatype.value, crate::rdf::RDF_LANG_STRING);
            }
            _ => panic!("expected literal"),
        }
    }

    #[test]
    fn parses_typed_literal() {
        let dataset = parse("_:x <http://e/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n").unwrap();
        let (_, triples) = dataset.graphs().next().unwrap();
        match &triples[0].object {
            Term::Literal(l) => {
                assert_eq!(l.datatype.value, "http://www.w3.org/2001/XMLSchema#integer");
                assert!(l.language.is_none());
            }
            _ => panic!("expected literal"),
        }
    }

    #[test]
    fn parses_named_graph_with_blank_node_name() {
        let dataset = parse("_:s <http://e/p> \"v\" _:g .\n").unwrap();
        assert_eq!(dataset.graphs().count(), 1);
        let (graph, _) = dataset.graphs().next().unwrap();
        assert_eq!(*graph, GraphName::BlankNode(BlankNode::new("g")));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let dataset = parse("\n   \n<http://e/a> <http://e/p> <http://e/b> .\n\t\n").unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn malformed_line_reports_its_line_number() {
        let err = parse("<http://e/a> <http://e/p> <http://e/b> .\nnot a quad\n").unwrap_err();
        assert_eq!(err, CanonicalizationError::MalformedQuad(2));
    }

    #[test]
    fn literal_forbidden_in_graph_position() {
        let err = parse("_:s <http://e/p> <http://e/o> \"not-a-graph\" .\n").unwrap_err();
        assert_eq!(err, CanonicalizationError::MalformedQuad(1));
    }

    #[test]
    fn dedups_equal_triples_on_parse() {
        let dataset = parse(
            "<http://e/a> <http://e/p> <http://e/b> .\n<http://e/a> <http://e/p> <http://e/b> .\n",
        )
        .unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn escape_round_trip_backslash_then_n() {
        // two characters: a backslash and the letter n — not a newline.
        let value = "\\n";
        assert_eq!(value.chars().count(), 2);
        let escaped = escape(value);
        assert!(!escaped.contains('\n'));
        assert_eq!(unescape(&escaped), value);
    }

    #[test]
    fn escape_output_contains_no_raw_control_characters() {
        let value = "a\"b\\c\td\ne\rf";
        let escaped = escape(value);
        assert!(!escaped.contains('\t'));
        assert!(!escaped.contains('\n'));
        assert!(!escaped.contains('\r'));
        assert!(!escaped.contains("\"b"));
        assert_eq!(unescape(&escaped), value);
    }

    #[test]
    fn serialize_dataset_sorts_lines() {
        let mut dataset = Dataset::new();
        dataset.insert(
            GraphName::DefaultGraph,
            Triple::new(
                Subject::NamedNode(NamedNode::new("http://e/b")),
                NamedNode::new("http://e/p"),
                Term::NamedNode(NamedNode::new("http://e/c")),
            ),
        );
        dataset.insert(
            GraphName::DefaultGraph,
            Triple::new(
                Subject::NamedNode(NamedNode::new("http://e/a")),
                NamedNode::new("http://e/p"),
                Term::NamedNode(NamedNode::new("http://e/c")),
            ),
        );
        let serialized = serialize_dataset(&dataset);
        let lines: Vec<&str> = serialized.lines().collect();
        assert!(lines[0].starts_with("<http://e/a>"));
        assert!(lines[1].starts_with("<http://e/b>"));
    }
}
