//! Eventos de ejecución de stages.
//!
//! El runner emite `StageStarted` y luego exactamente uno de
//! `StageFinished` / `StageFailed`. El estado de una ejecución se reconstruye
//! con `status_of` a partir de sus eventos.
//!
//! `JsonlEventStore` persiste cada evento como una línea JSON para que un
//! runner externo pueda leer fingerprints y outputs sin enlazar este crate.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::FlowError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageEventKind {
    StageStarted { stage_id: String, config_path: PathBuf },
    /// `outputs` son los paths escritos; `fingerprint` identifica
    /// (versión, stage, config, outputs). `summary` es el detalle del stage.
    StageFinished { stage_id: String, outputs: Vec<PathBuf>, fingerprint: String, summary: Value },
    StageFailed { stage_id: String, error: FlowError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub seq: u64, // orden de append dentro del run
    pub run_id: Uuid,
    pub kind: StageEventKind,
    pub ts: DateTime<Utc>,
}

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: StageEventKind) -> StageEvent;
    /// Eventos de un run en orden ascendente de seq.
    fn list(&self, run_id: Uuid) -> Vec<StageEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<StageEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: StageEventKind) -> StageEvent {
        let events = self.inner.entry(run_id).or_default();
        let ev = StageEvent { seq: events.len() as u64,
                              run_id,
                              kind,
                              ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<StageEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}

/// Eventos en un archivo JSON Lines (append).
///
/// Un fallo de escritura se registra como warning y no interrumpe el stage;
/// el evento sigue disponible en memoria para `list`.
#[derive(Debug)]
pub struct JsonlEventStore {
    path: PathBuf,
    memory: InMemoryEventStore,
}

impl JsonlEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(),
               memory: InMemoryEventStore::default() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, event: &StageEvent) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        line.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }

    /// Todos los eventos del archivo (todas las ejecuciones), en orden de escritura.
    /// Las líneas ilegibles se descartan.
    pub fn read_all(path: &Path) -> Vec<StageEvent> {
        let Ok(text) = fs::read_to_string(path) else {
            return Vec::new();
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }
}

impl EventStore for JsonlEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: StageEventKind) -> StageEvent {
        let ev = self.memory.append_kind(run_id, kind);
        match self.persist(&ev) {
            Ok(()) => debug!("event seq={} run_id={run_id} written to {}", ev.seq, self.path.display()),
            Err(e) => warn!("cannot write stage event to {}: {e}", self.path.display()),
        }
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<StageEvent> {
        let persisted: Vec<StageEvent> = Self::read_all(&self.path).into_iter()
                                                                   .filter(|e| e.run_id == run_id)
                                                                   .collect();
        if persisted.is_empty() {
            self.memory.list(run_id)
        } else {
            persisted
        }
    }
}

/// Estado de una ejecución de stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Running,
    Finished,
    Failed,
}

/// Replay lineal de los eventos de un run.
pub fn status_of(events: &[StageEvent]) -> StageStatus {
    events.iter().fold(StageStatus::Pending, |_, ev| match ev.kind {
                     StageEventKind::StageStarted { .. } => StageStatus::Running,
                     StageEventKind::StageFinished { .. } => StageStatus::Finished,
                     StageEventKind::StageFailed { .. } => StageStatus::Failed,
                 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_per_run_and_monotonic() {
        let mut store = InMemoryEventStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let started = |id: &str| StageEventKind::StageStarted { stage_id: id.into(),
                                                                 config_path: "c.yaml".into() };
        assert_eq!(store.append_kind(a, started("x")).seq, 0);
        assert_eq!(store.append_kind(b, started("y")).seq, 0);
        assert_eq!(store.append_kind(a, started("x")).seq, 1);
        assert_eq!(store.list(a).len(), 2);
        assert!(store.list(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn status_replays_to_last_terminal_event() {
        let mut store = InMemoryEventStore::default();
        let run = Uuid::new_v4();
        assert_eq!(status_of(&store.list(run)), StageStatus::Pending);
        store.append_kind(run,
                          StageEventKind::StageStarted { stage_id: "s".into(),
                                                         config_path: "c".into() });
        assert_eq!(status_of(&store.list(run)), StageStatus::Running);
        store.append_kind(run,
                          StageEventKind::StageFailed { stage_id: "s".into(),
                                                        error: FlowError::MissingKey("k".into()) });
        assert_eq!(status_of(&store.list(run)), StageStatus::Failed);
    }

    #[test]
    fn jsonl_store_appends_one_line_per_event() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs/stage_events.jsonl");
        let run = Uuid::new_v4();
        {
            let mut store = JsonlEventStore::new(&path);
            store.append_kind(run,
                              StageEventKind::StageStarted { stage_id: "s".into(),
                                                             config_path: "c".into() });
            store.append_kind(run,
                              StageEventKind::StageFinished { stage_id: "s".into(),
                                                              outputs: vec!["out.bin".into()],
                                                              fingerprint: "f".repeat(64),
                                                              summary: serde_json::json!({ "files": 1 }) });
        }
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);

        // Otro proceso (otra instancia) ve los mismos eventos.
        let reopened = JsonlEventStore::new(&path);
        let events = reopened.list(run);
        assert_eq!(events.len(), 2);
        assert_eq!(status_of(&events), StageStatus::Finished);
        assert!(matches!(&events[1].kind, StageEventKind::StageFinished { summary, .. } if summary["files"] == 1));
    }

    #[test]
    fn unreadable_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("events.jsonl");
        fs::write(&path, "not json\n\n").unwrap();
        let mut store = JsonlEventStore::new(&path);
        let run = Uuid::new_v4();
        store.append_kind(run,
                          StageEventKind::StageStarted { stage_id: "s".into(),
                                                         config_path: "c".into() });
        assert_eq!(JsonlEventStore::read_all(&path).len(), 1);
        assert_eq!(store.list(run).len(), 1);
    }
}
