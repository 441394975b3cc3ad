use cnn_core::{copy_files, create_directories, ConfigDocument, FlowError, Stage, StageOutput};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde_json::json;

/// Stage "one": trae los datos crudos a los directorios locales.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetDataStage;

impl Stage for GetDataStage {
    fn id(&self) -> &str {
        "get_data"
    }

    fn name(&self) -> &str {
        "one"
    }

    fn completion_note(&self) -> &str {
        " all the data are saved in local"
    }

    fn run(&self, config: &ConfigDocument) -> Result<StageOutput, FlowError> {
        // Falla antes de crear nada si las listas no están pareadas.
        let pairs = config.data_pairs()?;

        let pb = ProgressBar::new(pairs.len() as u64);
        pb.set_style(ProgressStyle::with_template("{msg} [{bar:40.red}] {pos}/{len}").unwrap_or_else(|_| ProgressStyle::default_bar()));
        pb.set_message("list of the folders");

        let mut artifacts = Vec::new();
        let (mut bytes, mut skipped_dirs) = (0u64, 0usize);
        for pair in &pairs {
            create_directories(&[&pair.local]).inspect_err(|_| pb.abandon())?;
            let report = copy_files(&pair.source, &pair.local).inspect_err(|_| pb.abandon())?;
            info!("{} files copied into {}", report.copied.len(), pair.local.display());
            bytes += report.bytes;
            skipped_dirs += report.skipped_dirs;
            artifacts.extend(report.copied);
            pb.inc(1);
        }
        pb.finish_and_clear();

        let summary = json!({
            "pairs": pairs.len(),
            "files": artifacts.len(),
            "bytes": bytes,
            "skipped_dirs": skipped_dirs,
        });
        Ok(StageOutput::new(artifacts).with_summary(summary))
    }
}
