//! Tempora CLI - batch loader and checker for annotation corpora
//!
//! Loads a jsonl corpus, materializes every document in the requested
//! interface mode, prints a per-document summary, and optionally
//! re-exports the normalized corpus.

mod io;

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

use tempora_core::{ElementKind, InterfaceMode, Workspace};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut mode = InterfaceMode::EventOrder;
    let mut rest = &args[1..];
    if let Some(flag) = rest.first() {
        if let Some(name) = flag.strip_prefix("--mode=") {
            mode = parse_mode(name)?;
            rest = &rest[1..];
        }
    }
    let input = match rest.first() {
        Some(path) => path,
        None => {
            eprintln!("Usage: tempora [--mode=coref|order|adjudication] <corpus.jsonl> [out.jsonl]");
            std::process::exit(2);
        }
    };
    let output = rest.get(1);

    let mut workspace = Workspace::new(mode);
    workspace.load_corpus(&io::load_corpus(input)?)?;
    println!("Loaded {} document(s) from {}", workspace.store().len(), input);

    for index in 0..workspace.store().len() {
        workspace.switch_to(index)?;
        summarize(&workspace, index);
    }

    if let Some(path) = output {
        let exported = workspace.export()?;
        io::write_corpus(path, &exported)?;
        println!("Exported normalized corpus to {}", path);
    }

    Ok(())
}

fn parse_mode(name: &str) -> Result<InterfaceMode> {
    match name {
        "coref" | "coreference" => Ok(InterfaceMode::Coreference),
        "order" => Ok(InterfaceMode::EventOrder),
        "adjudication" => Ok(InterfaceMode::Adjudication),
        other => bail!("unknown mode: {}", other),
    }
}

fn summarize(workspace: &Workspace, index: usize) {
    let doc = match workspace.store().active() {
        Some(doc) => doc,
        None => return,
    };
    let title = doc.title();
    let name = if title.is_empty() {
        format!("#{}", index)
    } else {
        title
    };
    let visible = workspace.visible_entries().len();
    let hidden = workspace.entries().len() - visible;
    print!(
        "{}: {} token(s), {} mark(s)",
        name,
        doc.token_count(),
        visible
    );
    if hidden > 0 {
        print!(" (+{} hidden by coreference)", hidden);
    }

    if let Some(layout) = workspace.layout() {
        let points = layout
            .main
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Point)
            .count();
        let bars = layout.main.elements.len() - points;
        print!(
            ", timeline: {} point(s), {} bar(s), {} nested group(s)",
            points,
            bars,
            layout.markers.len()
        );
    }

    let chunks = workspace.adjudication_layouts();
    if !chunks.is_empty() {
        print!(", {} adjudication chunk(s)", chunks.len());
    }
    println!();
}
