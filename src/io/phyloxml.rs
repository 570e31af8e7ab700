//! PhyloXML reading.

use std::io::{BufRead, Read};

use roxmltree::{Document, Node};

use super::ParseError;
use crate::tree::{NodeId, Tree};

/// Reader for phyloXML documents.
///
/// The document is parsed in one pass, lazily on the first query. Only the
/// first `phylogeny` element is honoured; the single resulting tree is
/// buffered and the reader is exhausted once it has been handed out.
pub struct PhyloXmlReader<R: BufRead> {
    source: Option<R>,
    buffered: Option<Tree>,
}

impl<R: BufRead> PhyloXmlReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source: Some(source),
            buffered: None,
        }
    }

    /// Whether a tree is available, without consuming it.
    pub fn has_tree(&mut self) -> Result<bool, ParseError> {
        self.ensure_parsed()?;
        Ok(self.buffered.is_some())
    }

    /// Hand out the buffered tree; the reader is exhausted afterwards.
    pub fn read_tree(&mut self) -> Result<Option<Tree>, ParseError> {
        self.ensure_parsed()?;
        Ok(self.buffered.take())
    }

    fn ensure_parsed(&mut self) -> Result<(), ParseError> {
        let Some(mut source) = self.source.take() else {
            return Ok(());
        };
        let mut text = String::new();
        source.read_to_string(&mut text)?;
        self.buffered = parse_document(&text)?;
        Ok(())
    }
}

/// Parse the first `phylogeny` element of a phyloXML document into a tree.
///
/// Returns `Ok(None)` for blank input or documents without a `phylogeny`
/// element.
pub fn parse_document(text: &str) -> Result<Option<Tree>, ParseError> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let document =
        Document::parse(text).map_err(|err| ParseError::format(0, err.to_string()))?;

    let Some(phylogeny) = document
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name() == "phylogeny")
    else {
        return Ok(None);
    };

    let mut tree = Tree::new();
    let root = tree.add_node(None, Some(0.0), None);
    for element in phylogeny.children().filter(Node::is_element) {
        visit(element, root, &mut tree)?;
    }

    Ok(Some(tree))
}

/// Depth-first descent mirroring the element stream: `clade` pushes a child
/// of the current node and pops back on close, the text-bearing elements fill
/// the current node wherever they appear below it.
fn visit(element: Node<'_, '_>, current: NodeId, tree: &mut Tree) -> Result<(), ParseError> {
    match element.tag_name().name() {
        "clade" => {
            let child = tree.add_node(None, Some(0.0), Some(current));
            for inner in element.children().filter(Node::is_element) {
                visit(inner, child, tree)?;
            }
        }
        "name" => {
            if let Some(text) = element.text() {
                let text = text.trim();
                if !text.is_empty() {
                    tree.nodes[current].name = Some(text.to_string());
                }
            }
        }
        "branch_length" => {
            // An empty text body leaves the length at its default.
            if let Some(text) = element.text() {
                let text = text.trim();
                if !text.is_empty() {
                    let value: f64 = text.parse().map_err(|_| {
                        ParseError::format(
                            element.range().start,
                            format!("malformed branch length '{text}'"),
                        )
                    })?;
                    tree.nodes[current].length = Some(value.max(0.0));
                }
            }
        }
        "confidence" => {
            if let Some(text) = element.text() {
                let text = text.trim();
                if !text.is_empty() {
                    let value: f64 = text.parse().map_err(|_| {
                        ParseError::format(
                            element.range().start,
                            format!("malformed confidence '{text}'"),
                        )
                    })?;
                    tree.nodes[current].bootstrap = value;
                }
            }
        }
        _ => {
            for inner in element.children().filter(Node::is_element) {
                visit(inner, current, tree)?;
            }
        }
    }
    Ok(())
}
