//! Ejecución de un stage con marcadores de log y eventos.

use std::path::Path;

use log::{error, info};
use serde_json::json;
use uuid::Uuid;

use super::{EventStore, InMemoryEventStore, Stage, StageEvent, StageEventKind, StageOutput};
use crate::config::{read_yaml, ConfigDocument};
use crate::constants::{PIPELINE_VERSION, STAGE_BANNER};
use crate::errors::FlowError;
use crate::hashing::{hash_str, hash_value};

/// Ejecuta stages registrando inicio, éxito o fallo.
///
/// Cada llamada a `run` usa un `run_id` nuevo. El error del stage se registra
/// (mensaje + traza debug) y se devuelve tal cual: el runner no reintenta ni
/// deshace efectos parciales.
#[derive(Debug)]
pub struct StageRunner<E: EventStore = InMemoryEventStore> {
    events: E,
    last_run: Option<Uuid>,
}

impl StageRunner<InMemoryEventStore> {
    pub fn new() -> Self {
        Self::with_store(InMemoryEventStore::default())
    }
}

impl Default for StageRunner<InMemoryEventStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EventStore> StageRunner<E> {
    pub fn with_store(events: E) -> Self {
        Self { events, last_run: None }
    }

    pub fn event_store(&self) -> &E {
        &self.events
    }

    /// Id del último run (si hubo alguno).
    pub fn last_run(&self) -> Option<Uuid> {
        self.last_run
    }

    /// Eventos del último run.
    pub fn last_events(&self) -> Vec<StageEvent> {
        self.last_run.map(|id| self.events.list(id)).unwrap_or_default()
    }

    /// Carga la config de `config_path` y ejecuta `stage`.
    pub fn run(&mut self, stage: &dyn Stage, config_path: &Path) -> Result<StageOutput, FlowError> {
        let run_id = Uuid::new_v4();
        self.last_run = Some(run_id);

        let target = stage.id();
        info!(target: target, "{STAGE_BANNER}");
        info!(target: target, ">>>>> stage {} started <<<<<", stage.name());
        self.events.append_kind(run_id,
                                StageEventKind::StageStarted { stage_id: stage.id().to_string(),
                                                               config_path: config_path.to_path_buf() });

        let result = read_yaml(config_path).and_then(|cfg| stage.run(&cfg).map(|out| (cfg, out)));

        match result {
            Ok((cfg, output)) => {
                let fingerprint = fingerprint(stage, &cfg, &output);
                info!(target: target,
                      "stage {} fingerprint={} outputs={} summary={}",
                      stage.name(),
                      fingerprint,
                      output.artifacts.len(),
                      output.summary);
                self.events.append_kind(run_id,
                                        StageEventKind::StageFinished { stage_id: stage.id().to_string(),
                                                                        outputs: output.artifacts.clone(),
                                                                        fingerprint,
                                                                        summary: output.summary.clone() });
                info!(target: target, ">>>>> stage {} completed!{} <<<<<\n", stage.name(), stage.completion_note());
                Ok(output)
            }
            Err(e) => {
                error!(target: target, "stage {} failed: {e}", stage.name());
                error!(target: target, "{e:#?}");
                self.events.append_kind(run_id,
                                        StageEventKind::StageFailed { stage_id: stage.id().to_string(),
                                                                      error: e.clone() });
                Err(e)
            }
        }
    }
}

fn fingerprint(stage: &dyn Stage, cfg: &ConfigDocument, output: &StageOutput) -> String {
    let outputs: Vec<String> = output.artifacts
                                     .iter()
                                     .map(|p| p.display().to_string())
                                     .collect();
    hash_value(&json!({
        "pipeline_version": PIPELINE_VERSION,
        "stage_id": stage.id(),
        "config_hash": hash_str(cfg.raw()),
        "outputs": outputs,
    }))
}
