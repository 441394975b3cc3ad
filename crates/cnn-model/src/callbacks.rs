//! Callbacks de entrenamiento persistidos.
//!
//! Cada ejecución del stage de callbacks genera descripciones nuevas y
//! sobrescribe los archivos `.cb` de la anterior. El directorio de logs de
//! TensorBoard, en cambio, es único por ejecución.

use std::path::{Path, PathBuf};

use cnn_core::{create_directories, load_typed, save_typed, unique_name, BlobSpec, Clock, FlowError, SerializedArtifact};
use log::info;
use serde::{Deserialize, Serialize};

pub const TENSORBOARD_CB_FILE: &str = "tensorboard_cb.cb";
pub const CHECKPOINT_CB_FILE: &str = "checkpoint_cb.cb";
pub const CHECKPOINT_FILE: &str = "ckpt_model.h5";
/// Prefijo del subdirectorio de logs de TensorBoard.
pub const TB_LOGS_PREFIX: &str = "tb_logs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorBoardCallback {
    pub log_dir: PathBuf,
    pub histogram_freq: u32,
    pub write_graph: bool,
    pub write_images: bool,
    pub update_freq: String,
}

impl TensorBoardCallback {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self { log_dir: log_dir.into(),
               histogram_freq: 0,
               write_graph: true,
               write_images: false,
               update_freq: "epoch".into() }
    }
}

impl BlobSpec for TensorBoardCallback {
    const KIND: &'static str = "tensorboard_callback";

    fn validate(&self) -> Result<(), String> {
        if self.log_dir.as_os_str().is_empty() {
            return Err("tensorboard callback without log_dir".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointCallback {
    pub filepath: PathBuf,
    pub monitor: String,
    pub save_best_only: bool,
    pub save_weights_only: bool,
    pub mode: String,
    pub save_freq: String,
}

impl CheckpointCallback {
    /// Checkpoint de sólo pesos en cada epoch.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self { filepath: filepath.into(),
               monitor: "val_loss".into(),
               save_best_only: false,
               save_weights_only: true,
               mode: "auto".into(),
               save_freq: "epoch".into() }
    }
}

impl BlobSpec for CheckpointCallback {
    const KIND: &'static str = "checkpoint_callback";

    fn validate(&self) -> Result<(), String> {
        if self.filepath.as_os_str().is_empty() {
            return Err("checkpoint callback without filepath".into());
        }
        Ok(())
    }
}

/// Par de callbacks tal como los dejó el último stage de callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCallbacks {
    pub tensorboard: TensorBoardCallback,
    pub checkpoint: CheckpointCallback,
}

/// Crea el callback de TensorBoard apuntando a `tb_root/tb_logs_at_<ts>`,
/// crea ese directorio y guarda el blob en `callbacks_dir/tensorboard_cb.cb`.
///
/// Devuelve la ruta del blob.
pub fn create_and_save_tensorboard_callback(callbacks_dir: &Path,
                                            tb_root: &Path,
                                            clock: &dyn Clock,
                                            store: &dyn SerializedArtifact)
                                            -> Result<PathBuf, FlowError> {
    let log_dir = tb_root.join(unique_name(TB_LOGS_PREFIX, clock));
    create_directories(&[&log_dir])?;

    let callback = TensorBoardCallback::new(&log_dir);
    let cb_path = callbacks_dir.join(TENSORBOARD_CB_FILE);
    save_typed(store, &cb_path, &callback)?;
    info!("tensorboard callback is being saved at {}", cb_path.display());
    Ok(cb_path)
}

/// Crea el callback de checkpoint (`ckpt_dir/ckpt_model.h5`) y lo guarda en
/// `callbacks_dir/checkpoint_cb.cb`.
pub fn create_and_save_checkpoint_callback(callbacks_dir: &Path,
                                           ckpt_dir: &Path,
                                           store: &dyn SerializedArtifact)
                                           -> Result<PathBuf, FlowError> {
    let callback = CheckpointCallback::new(ckpt_dir.join(CHECKPOINT_FILE));
    let cb_path = callbacks_dir.join(CHECKPOINT_CB_FILE);
    save_typed(store, &cb_path, &callback)?;
    info!("checkpoint callback is being saved at {}", cb_path.display());
    Ok(cb_path)
}

pub fn load_saved_callbacks(callbacks_dir: &Path, store: &dyn SerializedArtifact) -> Result<SavedCallbacks, FlowError> {
    let tensorboard = load_typed(store, &callbacks_dir.join(TENSORBOARD_CB_FILE))?;
    let checkpoint = load_typed(store, &callbacks_dir.join(CHECKPOINT_CB_FILE))?;
    info!("callbacks loaded from {}", callbacks_dir.display());
    Ok(SavedCallbacks { tensorboard, checkpoint })
}
