//! Stages del pipeline.
//!
//! Un stage es una unidad invocable por separado (típicamente por un runner
//! externo como DVC): lee la config, hace su trabajo y deja artifacts en
//! paths convencionales que el siguiente stage relee. Este módulo define:
//! - `Stage`: interfaz que implementan los drivers concretos.
//! - `StageRunner`: carga la config, emite los marcadores de log y eventos,
//!   y propaga el error sin recuperarlo.
//! - `StageEvent` / `EventStore`: registro append-only de cada ejecución
//!   (en memoria o en `logs/stage_events.jsonl`).

mod definition;
mod event;
mod runner;

pub use definition::{Stage, StageOutput};
pub use event::{status_of, EventStore, InMemoryEventStore, JsonlEventStore, StageEvent, StageEventKind, StageStatus};
pub use runner::StageRunner;
