use std::path::PathBuf;

use serde_json::Value;

use crate::config::ConfigDocument;
use crate::errors::FlowError;

/// Lo que un stage deja en disco.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutput {
    /// Paths producidos o sobrescritos, en orden de escritura.
    pub artifacts: Vec<PathBuf>,
    /// Detalle libre para el evento de cierre (conteos, hashes...).
    pub summary: Value,
}

impl StageOutput {
    pub fn new(artifacts: Vec<PathBuf>) -> Self {
        Self { artifacts,
               summary: Value::Null }
    }

    pub fn with_summary(mut self, summary: Value) -> Self {
        self.summary = summary;
        self
    }
}

/// Trait que define un stage del pipeline.
pub trait Stage {
    /// Identificador estable (se usa en eventos y fingerprints).
    fn id(&self) -> &str;

    /// Nombre usado en los marcadores de log (`stage <name> started`).
    fn name(&self) -> &str {
        self.id()
    }

    /// Texto añadido al marcador de éxito.
    fn completion_note(&self) -> &str {
        ""
    }

    /// Ejecuta el stage completo. Sin éxito parcial: o termina todo o falla.
    fn run(&self, config: &ConfigDocument) -> Result<StageOutput, FlowError>;
}
