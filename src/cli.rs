//! Entrada común de los binarios de stage.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use cnn_core::config::init_dotenv;
use cnn_core::constants::{DEFAULT_CONFIG_PATH, EVENTS_FILE_NAME, LOG_FILE};
use cnn_core::logging::init_file_sink;
use cnn_core::stage::JsonlEventStore;
use cnn_core::{FlowError, Stage, StageOutput, StageRunner};

/// Argumentos de cada stage: sólo la ruta de la config.
#[derive(Debug, Clone, Parser)]
#[command(version, about = "Run one stage of the cnnflow pipeline")]
pub struct StageArgs {
    /// Ruta del archivo de configuración YAML.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Archivo de eventos que acompaña a `log_file` (`logs/stage_events.jsonl`).
pub fn events_file(log_file: &Path) -> PathBuf {
    log_file.with_file_name(EVENTS_FILE_NAME)
}

/// Ejecuta `stage` registrando el log en `log_file` y los eventos (con
/// fingerprint, outputs y summary) en `events_file(log_file)`.
pub fn run_stage(stage: &dyn Stage, args: &StageArgs, log_file: &Path) -> Result<StageOutput, FlowError> {
    let _sink = init_file_sink(log_file)?;
    StageRunner::with_store(JsonlEventStore::new(events_file(log_file))).run(stage, &args.config)
}

/// `main` de los binarios: parsea argumentos, ejecuta y traduce a código de salida.
pub fn run_stage_main(stage: &dyn Stage) -> ExitCode {
    init_dotenv();
    let args = StageArgs::parse();
    match run_stage(stage, &args, Path::new(LOG_FILE)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("stage {} failed: {e}", stage.name());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_configs_dir() {
        let args = StageArgs::try_parse_from(["stage"]).unwrap();
        assert_eq!(args.config, PathBuf::from("configs/config.yaml"));
    }

    #[test]
    fn short_and_long_flags() {
        for flag in ["-c", "--config"] {
            let args = StageArgs::try_parse_from(["stage", flag, "other.yaml"]).unwrap();
            assert_eq!(args.config, PathBuf::from("other.yaml"));
        }
    }

    #[test]
    fn events_live_next_to_the_log() {
        assert_eq!(events_file(Path::new("logs/running_logs.log")), PathBuf::from("logs/stage_events.jsonl"));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(StageArgs::try_parse_from(["stage", "--params", "params.yaml"]).is_err());
    }
}
