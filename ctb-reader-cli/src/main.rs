use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ctb_reader_core::{to_json, CtbDocument, CtbError, Node, NodeStore};
use serde::Serialize;

mod settings;

#[derive(Debug, Parser)]
#[command(
    name = "ctb-reader",
    about = "Read nodes and rebuilt content from CherryTree .ctb files",
    version
)]
struct Cli {
    /// The .ctb document store to read.
    file: PathBuf,
    /// Enable verbose logging for debugging.
    #[arg(long, global = true)]
    verbose: bool,
    /// Print JSON on a single line.
    #[arg(long, global = true)]
    compact: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the number of nodes.
    Count,

    /// Print the metadata of one node.
    Node { id: i64 },

    /// Print the direct children of a node (0 for the top level).
    Children { id: i64 },

    /// Print the top-level ancestor of a node.
    Root { id: i64 },

    /// Print the node hierarchy as an indented outline.
    Tree,

    /// Print the rebuilt content of a node.
    Content(ContentArgs),
}

#[derive(Debug, Args)]
struct ContentArgs {
    id: i64,
    /// Write embedded images and files here instead of inlining them.
    #[arg(long)]
    extract_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("{err:?}");
            eprintln!("error: {}", describe_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = settings::load_settings();
    let pretty = settings.pretty_json && !cli.compact;

    let doc = CtbDocument::open(&cli.file)
        .with_context(|| format!("failed to open {}", cli.file.display()))?;

    match cli.command {
        Commands::Count => println!("{}", doc.total_nodes_count()?),
        Commands::Node { id } => print_json(&doc.get_node(id)?, pretty)?,
        Commands::Children { id } => print_json(&doc.get_sub_nodes(id)?, pretty)?,
        Commands::Root { id } => print_json(&doc.find_root_node(id)?, pretty)?,
        Commands::Tree => print!("{}", render_tree(&doc)?),
        Commands::Content(args) => {
            let dest = args.extract_dir.or_else(|| settings.extract_dir());
            let content = doc
                .get_node_content(args.id, dest.as_deref())
                .with_context(|| format!("failed to read content of node {}", args.id))?;
            print_json(&content, pretty)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    println!("{}", to_json(value, pretty)?);
    Ok(())
}

/// The message shown on failure; document errors use their end-user wording.
fn describe_error(err: &anyhow::Error) -> String {
    match err.chain().find_map(|cause| cause.downcast_ref::<CtbError>()) {
        Some(ctb) if err.to_string() == ctb.to_string() => ctb.user_message(),
        Some(ctb) => format!("{err}: {}", ctb.user_message()),
        None => format!("{err:#}"),
    }
}

/// Renders every node, depth first in sequence order, one per line.
fn render_tree<S: NodeStore>(doc: &CtbDocument<S>) -> Result<String> {
    let mut out = String::new();
    let mut visited = HashSet::new();
    for node in doc.get_sub_nodes(0)? {
        render_subtree(doc, node, 0, &mut visited, &mut out)?;
    }
    Ok(out)
}

fn render_subtree<S: NodeStore>(
    doc: &CtbDocument<S>,
    node: Node,
    depth: usize,
    visited: &mut HashSet<i64>,
    out: &mut String,
) -> Result<()> {
    if !visited.insert(node.id) {
        bail!("node {} appears twice in the hierarchy", node.id);
    }
    writeln!(out, "{}{}", "  ".repeat(depth), describe(&node))?;
    if node.has_children {
        for child in doc.get_sub_nodes(node.id)? {
            render_subtree(doc, child, depth + 1, visited, out)?;
        }
    }
    Ok(())
}

fn describe(node: &Node) -> String {
    let mut markers = vec![node.syntax.clone()];
    if node.flags.is_read_only {
        markers.push("ro".to_string());
    }
    if node.flags.is_bold {
        markers.push("bold".to_string());
    }
    if let Some(color) = node.flags.color_hex() {
        markers.push(color);
    }
    format!("{} [{}] ({})", node.name, node.id, markers.join(", "))
}
