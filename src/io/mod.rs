use std::fs;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::debug;
use thiserror::Error;

use crate::tree::Tree;

pub mod newick;
pub mod phyloxml;

pub use newick::{write_newick, NewickReader};
pub use phyloxml::PhyloXmlReader;

/// Errors surfaced by the tree parsers.
///
/// Empty input is not an error: readers signal "no tree" with `Ok(None)`.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed input text. The current parse is abandoned entirely; no
    /// partial tree is returned.
    #[error("format error at offset {position}: {message}")]
    Format { position: usize, message: String },
    /// Failure of the underlying stream, distinct from malformed content.
    #[error("read error: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    pub(crate) fn format(position: usize, message: impl Into<String>) -> Self {
        ParseError::Format {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TreeFormat {
    Newick,
    PhyloXml,
}

/// Decide the input format: content beginning with `<` or an `.xml` file
/// extension selects phyloXML, everything else is read as Newick/Phylip.
pub fn detect_format(raw: &str, path: Option<&Path>) -> TreeFormat {
    if raw.trim_start().starts_with('<') {
        return TreeFormat::PhyloXml;
    }
    if let Some(extension) = path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
        if extension.eq_ignore_ascii_case("xml") {
            return TreeFormat::PhyloXml;
        }
    }
    TreeFormat::Newick
}

/// Load the tree from a file, sniffing the format from content and extension.
pub fn load_tree(path: &Path) -> Result<Tree> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read tree file: {}", path.display()))?;

    let format = detect_format(&raw, Some(path));
    debug!("reading {} as {:?}", path.display(), format);

    let tree = match format {
        TreeFormat::Newick => NewickReader::new(raw.as_bytes()).read_tree()?,
        TreeFormat::PhyloXml => PhyloXmlReader::new(raw.as_bytes()).read_tree()?,
    };

    match tree {
        Some(tree) => Ok(tree),
        None => bail!("tree file did not contain a tree"),
    }
}
