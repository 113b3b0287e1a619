//! Document Tree with Visitors and Macros
//!
//! This example builds a small document tree, edits it with atomic macro
//! commands and walks it with type-keyed visitors.
//!
//! Key concepts:
//! - Entities form a tree (sections contain paragraphs and figures)
//! - Macro commands are atomic: a failing step reverts the earlier ones
//! - Visitors dispatch on entity kind and fail on kinds they do not know
//! - Checkpoints serialize the whole store
//!
//! Run with: RUST_LOG=debug cargo run --example document_tree

use rewind::builder::{BlueprintBuilder, TransitionBuilder};
use rewind::checkpoint::Checkpoint;
use rewind::command::{Attach, Detach, Fire, MacroCommand, Spawn};
use rewind::core::{EngineError, Payload};
use rewind::engine::Engine;
use rewind::state_enum;
use rewind::traverse::{Flow, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
enum Block {
    Section { title: String },
    Paragraph { words: u32 },
    Figure { caption: String },
}

impl Payload for Block {
    fn kind(&self) -> &str {
        match self {
            Self::Section { .. } => "Section",
            Self::Paragraph { .. } => "Paragraph",
            Self::Figure { .. } => "Figure",
        }
    }
}

state_enum! {
    enum Review {
        Draft,
        Approved,
    }
}

fn section(title: &str) -> Block {
    Block::Section {
        title: title.to_string(),
    }
}

fn word_count() -> Visitor<Block, Review, u32> {
    Visitor::new("word-count", 0)
        .on("Section", |_, _| Ok(Flow::Continue))
        .on("Figure", |_, _| Ok(Flow::Continue))
        .on("Paragraph", |total, node| {
            if let Block::Paragraph { words } = node.payload()? {
                *total += words;
            }
            Ok(Flow::Continue)
        })
}

fn outline() -> Visitor<Block, Review, Vec<String>> {
    let line = |lines: &mut Vec<String>,
                node: &mut rewind::traverse::Node<'_, Block, Review>|
     -> rewind::core::Result<Flow> {
        let text = match node.payload()? {
            Block::Section { title } => format!("# {title}"),
            Block::Paragraph { words } => format!("paragraph ({words} words)"),
            Block::Figure { caption } => format!("figure: {caption}"),
        };
        lines.push(format!("{}{} [{:?}]", "  ".repeat(node.depth()), text, node.state()?));
        Ok(Flow::Continue)
    };
    Visitor::new("outline", Vec::new())
        .on("Section", line)
        .on("Paragraph", line)
        .on("Figure", line)
}

fn print_outline(
    engine: &mut Engine<Block, Review>,
    root: rewind::core::EntityId,
) -> rewind::core::Result<()> {
    let mut visitor = outline();
    engine.accept(root, &mut visitor)?;
    for line in visitor.into_result() {
        println!("  {line}");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let approve = |kind: &str| {
        BlueprintBuilder::<Block, Review>::new(kind)
            .states(Review::variants())
            .transition(
                TransitionBuilder::new()
                    .from(Review::Draft)
                    .on("approve")
                    .to(Review::Approved),
            )
    };
    let mut engine = Engine::builder()
        .kind(approve("Section")?)?
        .kind(approve("Paragraph")?)?
        .kind(approve("Figure")?)?
        .build()?;

    let book = engine.create(None, section("Book"), Review::Draft)?;
    let intro = engine.create(Some(book), section("Intro"), Review::Draft)?;
    let p1 = engine.create(Some(intro), Block::Paragraph { words: 120 }, Review::Draft)?;
    engine.create(Some(intro), Block::Paragraph { words: 80 }, Review::Draft)?;

    println!("initial tree:");
    print_outline(&mut engine, book)?;

    let chapter = MacroCommand::new("add chapter")
        .then(Spawn::new(Some(book), section("Chapter 1"), Review::Draft))
        .then(Fire::new(p1, "approve"))
        .then(Fire::new(intro, "approve"));
    engine.execute(chapter)?;
    println!("after macro:");
    print_outline(&mut engine, book)?;

    let broken = MacroCommand::new("reorganize")
        .then(Detach { target: p1 })
        .then(Attach::new(p1, book))
        .then(Fire::new(p1, "approve"));
    if let Err(err) = engine.execute(broken) {
        println!("macro failed, nothing changed: {err}");
        println!("root cause: {}", err.root_cause());
    }
    print_outline(&mut engine, book)?;

    let mut words = word_count();
    engine.accept(book, &mut words)?;
    println!("total words: {}", words.into_result());

    engine.create(Some(book), Block::Figure { caption: "map".into() }, Review::Draft)?;
    let mut strict: Visitor<Block, Review, u32> = Visitor::new("sections-only", 0)
        .on("Section", |n, _| {
            *n += 1;
            Ok(Flow::Continue)
        });
    match engine.accept(book, &mut strict) {
        Err(EngineError::UnhandledEntityType { visitor, kind }) => {
            println!("visitor '{visitor}' has no case for '{kind}'")
        }
        other => println!("unexpected: {other:?}"),
    }

    let saved = engine.checkpoint().to_json()?;
    engine.undo()?;
    println!("after undo: {} entities", engine.store().len());
    engine.load_checkpoint(Checkpoint::from_json(&saved)?)?;
    println!("after resume: {} entities, history {:?}", engine.store().len(), engine.depth());

    Ok(())
}
