//! Constantes compartidas por los stages.
//!
//! `PIPELINE_VERSION` participa en el fingerprint de cada stage: cambiarla
//! invalida los fingerprints previos aunque config y artifacts no cambien.

/// Versión lógica del pipeline incluida en los fingerprints.
pub const PIPELINE_VERSION: &str = "P1.0";

/// Config usada cuando el binario no recibe `--config`.
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

/// Log compartido (append) por todos los stages.
pub const LOG_FILE: &str = "logs/running_logs.log";

/// Eventos de stage (JSON Lines), junto al log.
pub const EVENTS_FILE_NAME: &str = "stage_events.jsonl";

/// Separador escrito antes del marcador de inicio de cada stage.
pub const STAGE_BANNER: &str = "\n********************";

/// Variable de entorno con el nivel de log (`info`, `debug`, ...).
pub const LOG_LEVEL_ENV: &str = "CNNFLOW_LOG";
