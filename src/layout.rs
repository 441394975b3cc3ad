//! Rutas de artefactos derivadas de la config.
//!
//! Todo cuelga de `artifacts.ARTIFACTS_DIR`. Las claves se leen al construir
//! el layout, de modo que una clave ausente falla antes de tocar el disco.

use std::path::{Path, PathBuf};

use cnn_core::{unique_name, Clock, ConfigDocument, FlowError};

/// Directorios del stage de callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub artifacts_dir: PathBuf,
    pub tensorboard_root: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub callbacks_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn from_config(config: &ConfigDocument) -> Result<Self, FlowError> {
        let artifacts_dir = config.path_value("artifacts.ARTIFACTS_DIR")?;
        Ok(Self { tensorboard_root: artifacts_dir.join(config.path_value("artifacts.TENSORBOARD_ROOT_LOG_DIR")?),
                  checkpoint_dir: artifacts_dir.join(config.path_value("artifacts.CHECKPOINT_DIR")?),
                  callbacks_dir: artifacts_dir.join(config.path_value("artifacts.CALLBACKS_DIR")?),
                  artifacts_dir })
    }

    /// Directorios que el stage debe aprovisionar.
    pub fn dirs(&self) -> [&Path; 3] {
        [&self.tensorboard_root, &self.checkpoint_dir, &self.callbacks_dir]
    }
}

/// Rutas del stage de modelo base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLayout {
    pub base_model_dir: PathBuf,
    pub base_model_path: PathBuf,
    updated_base_model_name: String,
}

impl ModelLayout {
    pub fn from_config(config: &ConfigDocument) -> Result<Self, FlowError> {
        let artifacts_dir = config.path_value("artifacts.ARTIFACTS_DIR")?;
        let base_model_dir = artifacts_dir.join(config.path_value("artifacts.BASE_MODEL_DIR")?);
        Ok(Self { base_model_path: base_model_dir.join(config.str("artifacts.BASE_MODEL_NAME")?),
                  updated_base_model_name: config.str("artifacts.UPDATED_BASE_MODEL_NAME")?.to_string(),
                  base_model_dir })
    }

    /// `BASE_MODEL_DIR/<UPDATED_BASE_MODEL_NAME>_at_<ts>.model`
    pub fn updated_model_path(&self, clock: &dyn Clock) -> PathBuf {
        let stem = Path::new(&self.updated_base_model_name).file_stem()
                                                           .map(|s| s.to_string_lossy().into_owned())
                                                           .unwrap_or_else(|| self.updated_base_model_name.clone());
        self.base_model_dir.join(format!("{}.model", unique_name(&stem, clock)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cnn_core::FixedClock;

    const CONFIG: &str = "\
artifacts:
  ARTIFACTS_DIR: artifacts
  TENSORBOARD_ROOT_LOG_DIR: tensorboard_log_dir
  CHECKPOINT_DIR: checkpoints
  CALLBACKS_DIR: callbacks
  BASE_MODEL_DIR: base_model
  BASE_MODEL_NAME: base_model.h5
  UPDATED_BASE_MODEL_NAME: updated_base_model.h5
";

    #[test]
    fn artifact_dirs_hang_from_artifacts_root() {
        let doc = ConfigDocument::from_yaml_str(CONFIG).unwrap();
        let layout = ArtifactLayout::from_config(&doc).unwrap();
        assert_eq!(layout.tensorboard_root, Path::new("artifacts/tensorboard_log_dir"));
        assert_eq!(layout.checkpoint_dir, Path::new("artifacts/checkpoints"));
        assert_eq!(layout.dirs()[2], Path::new("artifacts/callbacks"));
    }

    #[test]
    fn updated_model_name_is_unique_per_second() {
        let doc = ConfigDocument::from_yaml_str(CONFIG).unwrap();
        let layout = ModelLayout::from_config(&doc).unwrap();
        assert_eq!(layout.base_model_path, Path::new("artifacts/base_model/base_model.h5"));
        let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
                                                                   .and_hms_opt(9, 3, 7)
                                                                   .unwrap());
        assert_eq!(layout.updated_model_path(&clock),
                   Path::new("artifacts/base_model/updated_base_model_at_Fri_Jan__5_09.03.07_2024.model"));
    }

    #[test]
    fn missing_key_is_reported() {
        let doc = ConfigDocument::from_yaml_str("artifacts:\n  ARTIFACTS_DIR: a\n").unwrap();
        let err = ArtifactLayout::from_config(&doc).unwrap_err();
        assert_eq!(err, FlowError::MissingKey("artifacts.TENSORBOARD_ROOT_LOG_DIR".into()));
    }
}
