//! cnnflow
//!
//! Stages del pipeline de clasificación de imágenes por transfer learning:
//! - `stages` con los tres stages (datos, modelo base, callbacks).
//! - `layout` para derivar rutas de artefactos de la config.
//! - `cli` con la entrada común de los binarios `stage_0N_*`.
//!
//! La lógica reusable vive en `cnn-core` y `cnn-model`.

pub mod cli;
pub mod layout;
pub mod stages;

pub use layout::{ArtifactLayout, ModelLayout};
pub use stages::{GetDataStage, PrepareBaseModelStage, PrepareCallbacksStage};
