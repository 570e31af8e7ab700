use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use log::info;

use phyloplot::io;
use phyloplot::{PlotStyle, TreePlot};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "phyloplot",
    about = "Parse phylogenetic trees and compute 2-D layout coordinates."
)]
struct AppConfig {
    /// Tree file to load (Newick/Phylip or phyloXML).
    #[arg(value_name = "TREE_FILE")]
    tree_path: PathBuf,

    /// Layout style to compute.
    #[arg(long, default_value_t = LayoutStyle::Linear)]
    layout: LayoutStyle,

    /// Echo the parsed tree back to stdout as Newick.
    #[arg(long)]
    write_newick: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LayoutStyle {
    Linear,
    Radial,
    Hyperbolic,
}

impl fmt::Display for LayoutStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutStyle::Linear => write!(f, "linear"),
            LayoutStyle::Radial => write!(f, "radial"),
            LayoutStyle::Hyperbolic => write!(f, "hyperbolic"),
        }
    }
}

impl From<LayoutStyle> for PlotStyle {
    fn from(style: LayoutStyle) -> Self {
        match style {
            LayoutStyle::Linear => PlotStyle::Linear,
            LayoutStyle::Radial => PlotStyle::Radial,
            LayoutStyle::Hyperbolic => PlotStyle::Hyperbolic,
        }
    }
}

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();

    let config = AppConfig::parse();
    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(config: &AppConfig) -> Result<()> {
    let tree = io::load_tree(&config.tree_path)?;
    info!(
        "loaded {} nodes ({} leaves) from {}",
        tree.len(),
        tree.leaf_count(),
        config.tree_path.display()
    );

    let plot = TreePlot::from_tree(&tree, config.layout.into())
        .ok_or_else(|| anyhow!("tree is empty; nothing to lay out"))?;

    println!("nodes:  {}", tree.len());
    println!("leaves: {}", tree.leaf_count());
    println!(
        "layout: {} ({} points, {} edges, {} curves)",
        config.layout,
        plot.points.len(),
        plot.edges.len(),
        plot.curves.len()
    );
    println!("extent: {:.3} x {:.3}", plot.width, plot.height);

    if config.write_newick {
        println!("{}", io::newick::write_newick(&tree));
    }

    Ok(())
}
