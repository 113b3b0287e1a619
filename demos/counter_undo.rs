//! Counter with Undo and Redo
//!
//! This example drives one entity through a transition table and walks the
//! history back and forth.
//!
//! Key concepts:
//! - States are data: `Counting -> Counting` on `bump`, `Counting -> Locked` on `lock`
//! - Every trigger runs as an undoable command
//! - Illegal triggers fail without touching the entity
//! - Redo re-executes the command (the default redo strategy)
//!
//! Run with: RUST_LOG=debug cargo run --example counter_undo

use rewind::builder::{BlueprintBuilder, TransitionBuilder};
use rewind::core::{EngineError, EntityId, Payload, State};
use rewind::engine::Engine;
use rewind::state_enum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
struct Counter {
    count: i64,
    step: i64,
}

impl Payload for Counter {
    fn kind(&self) -> &str {
        "Counter"
    }
}

state_enum! {
    enum Phase {
        Counting,
        Locked,
    }
}

// Pure action: next payload from current payload + trigger params
fn bump(counter: &Counter, params: &Value) -> Result<Counter, String> {
    let by = params.get("by").and_then(Value::as_i64).unwrap_or(counter.step);
    if by == 0 {
        return Err("refusing to bump by zero".to_string());
    }
    Ok(Counter {
        count: counter.count + by,
        ..counter.clone()
    })
}

fn show(engine: &Engine<Counter, Phase>, id: EntityId, label: &str) {
    if let Ok(entity) = engine.get(id) {
        let depth = engine.depth();
        println!(
            "{label:<14} count={:<3} state={:<9} undo={} redo={}",
            entity.payload().count,
            format!("{:?}", entity.state()),
            depth.undo,
            depth.redo
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let counter = BlueprintBuilder::new("Counter")
        .states(Phase::variants())
        .transition(
            TransitionBuilder::new()
                .from(Phase::Counting)
                .on("bump")
                .to(Phase::Counting)
                .action(bump),
        )?
        .transition(
            TransitionBuilder::new()
                .from(Phase::Counting)
                .on("lock")
                .to(Phase::Locked)
                .when(|c: &Counter| c.count >= 3),
        )?
        .build()?;

    let mut engine = Engine::builder().blueprint(counter).max_depth(10).build()?;
    engine.on_transition(|record| {
        println!(
            "  [observer] {} {} -> {} via '{}'",
            record.entity,
            record.from.name(),
            record.to.name(),
            record.trigger
        );
    });
    let id = engine.create(None, Counter { count: 0, step: 1 }, Phase::Counting)?;
    show(&engine, id, "created");

    for _ in 0..3 {
        engine.trigger(id, "bump", Value::Null)?;
    }
    show(&engine, id, "3x bump");

    engine.undo()?;
    show(&engine, id, "undo");
    engine.redo()?;
    show(&engine, id, "redo");

    engine.trigger(id, "bump", json!({ "by": 10 }))?;
    show(&engine, id, "bump by 10");

    match engine.trigger(id, "bump", json!({ "by": 0 })) {
        Err(err) => println!("rejected:      {err}"),
        Ok(_) => println!("unexpected success"),
    }

    engine.trigger(id, "lock", Value::Null)?;
    show(&engine, id, "lock");
    if let Err(err) = engine.trigger(id, "bump", Value::Null) {
        println!("rejected:      {err}");
    }

    loop {
        match engine.undo() {
            Ok(descriptor) => println!("undid {} {:?}", descriptor.kind, descriptor.params),
            Err(EngineError::NothingToUndo) => break,
            Err(err) => return Err(err.into()),
        }
    }
    show(&engine, id, "undo all");

    Ok(())
}
