//! Newick/Phylip reading and writing.
//!
//! The grammar is `tree := subtree ';'` with
//! `subtree := leaf | '(' subtree (',' subtree)* ')' [label] [':' branchlength]`,
//! where a branch length may carry a trailing bracketed bootstrap-replicate
//! count (`:0.5[90]`).

use std::fmt::Write as _;
use std::io::BufRead;

use super::ParseError;
use crate::tree::{NodeId, Tree};

/// Reader for Newick/Phylip input.
///
/// A single call to [`read_tree`](Self::read_tree) drains all remaining input
/// into one buffer and parses exactly one tree from it; repeated calls cannot
/// return further trees from the same source. [`has_more`](Self::has_more)
/// only reports whether unconsumed input exists, independent of tree
/// boundaries.
pub struct NewickReader<R: BufRead> {
    source: R,
    drained: bool,
}

impl<R: BufRead> NewickReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            drained: false,
        }
    }

    /// Whether any unconsumed input exists.
    pub fn has_more(&mut self) -> Result<bool, ParseError> {
        if self.drained {
            return Ok(false);
        }
        Ok(!self.source.fill_buf()?.is_empty())
    }

    /// Drain the remaining input and parse one tree from it.
    ///
    /// Returns `Ok(None)` when the input holds no tree at all.
    pub fn read_tree(&mut self) -> Result<Option<Tree>, ParseError> {
        if self.drained {
            return Ok(None);
        }
        self.drained = true;

        let mut buffer = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if self.source.read_line(&mut line)? == 0 {
                break;
            }
            buffer.push_str(line.trim());
        }

        parse_str(&buffer)
    }
}

/// Parse a single tree from a complete Newick string.
///
/// An input that yields only an empty, unlabeled, zero-length root is treated
/// as "no tree" rather than an error.
pub fn parse_str(text: &str) -> Result<Option<Tree>, ParseError> {
    let mut cursor = Cursor::new(text);
    let mut tree = Tree::new();
    let root_id = parse_subtree(&mut cursor, &mut tree, None)?;

    let root = &tree.nodes[root_id];
    if root.children.is_empty() && root.name.is_none() && root.length == Some(0.0) {
        return Ok(None);
    }

    if cursor.peek() == Some(b';') {
        cursor.advance();
        Ok(Some(tree))
    } else {
        Err(ParseError::format(
            cursor.position(),
            "missing ';' after tree",
        ))
    }
}

fn parse_subtree(
    cursor: &mut Cursor<'_>,
    tree: &mut Tree,
    parent: Option<NodeId>,
) -> Result<NodeId, ParseError> {
    let id = tree.add_node(None, None, parent);

    if cursor.peek() == Some(b'(') {
        cursor.advance();
        loop {
            parse_subtree(cursor, tree, Some(id))?;
            match cursor.peek() {
                Some(b',') => cursor.advance(),
                Some(b')') => {
                    cursor.advance();
                    break;
                }
                _ => {
                    return Err(ParseError::format(
                        cursor.position(),
                        "unterminated subtree: expected ',' or ')'",
                    ))
                }
            }
        }
    }

    let label = cursor.take_until(is_label_end);
    if !label.is_empty() {
        tree.nodes[id].name = Some(label.to_string());
    }

    if cursor.peek() == Some(b':') {
        cursor.advance();
        let start = cursor.position();
        let token = cursor.take_until(is_length_end);
        let (length, bootstrap) = parse_length_token(token, start)?;
        tree.nodes[id].length = Some(length);
        if let Some(bootstrap) = bootstrap {
            tree.nodes[id].bootstrap = bootstrap;
        }
    } else {
        // Missing branch length defaults to 0.
        tree.nodes[id].length = Some(0.0);
    }

    Ok(id)
}

/// Split a branch-length token into its numeric value and the optional
/// bracketed bootstrap-replicate count, which is stripped before the number
/// is parsed. Malformed numeric text is a hard error; negative lengths clamp
/// to 0.
fn parse_length_token(token: &str, at: usize) -> Result<(f64, Option<f64>), ParseError> {
    let (number_text, bootstrap) = match token.find('[') {
        Some(open) => {
            let annotation = &token[open + 1..];
            let close = annotation.find(']').ok_or_else(|| {
                ParseError::format(at + open, "unterminated bootstrap annotation")
            })?;
            if open + 1 + close + 1 != token.len() {
                return Err(ParseError::format(
                    at + open,
                    "unexpected text after bootstrap annotation",
                ));
            }
            let replicates: u64 = annotation[..close].trim().parse().map_err(|_| {
                ParseError::format(
                    at + open,
                    format!("malformed bootstrap count '{}'", &annotation[..close]),
                )
            })?;
            (&token[..open], Some(replicates as f64))
        }
        None => (token, None),
    };

    let value: f64 = number_text.trim().parse().map_err(|_| {
        ParseError::format(at, format!("malformed branch length '{number_text}'"))
    })?;

    Ok((value.max(0.0), bootstrap))
}

fn is_label_end(byte: u8) -> bool {
    matches!(byte, b':' | b',' | b')' | b';')
}

fn is_length_end(byte: u8) -> bool {
    matches!(byte, b',' | b')' | b';')
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Consume bytes up to (excluding) the first delimiter or end of input.
    /// Delimiters are ASCII, so the returned slice always sits on character
    /// boundaries.
    fn take_until(&mut self, stop: fn(u8) -> bool) -> &'a str {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() && !stop(bytes[self.pos]) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }
}

/// Serialise a tree to Newick text.
///
/// Children go in parentheses, any non-root node is followed by its label and
/// `:length`, with a bracketed bootstrap count when one is set. The root's
/// own label and branch length are never emitted.
pub fn write_newick(tree: &Tree) -> String {
    let mut out = String::new();
    if let Some(root) = tree.root {
        write_node(tree, root, true, &mut out);
    }
    out.push(';');
    out
}

fn write_node(tree: &Tree, id: NodeId, is_root: bool, out: &mut String) {
    let node = &tree.nodes[id];

    if !node.children.is_empty() {
        out.push('(');
        for (index, &child) in node.children.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            write_node(tree, child, false, out);
        }
        out.push(')');
    }

    if is_root {
        return;
    }

    if let Some(name) = &node.name {
        out.push_str(name);
    }
    if let Some(length) = node.length {
        let _ = write!(out, ":{length}");
        if node.bootstrap != 0.0 {
            let _ = write!(out, "[{}]", node.bootstrap);
        }
    }
}
