//! Descripción del modelo de clasificación por transfer learning.
//!
//! El crate no ejecuta redes: modela el grafo de capas, la referencia a los
//! pesos preentrenados y los callbacks de entrenamiento como artefactos
//! persistibles que los stages producen y releen.

pub mod assembler;
pub mod backbone;
pub mod callbacks;
pub mod freeze;
pub mod graph;
pub mod layer;
pub mod weights;

pub use assembler::{prepare_full_model, HeadConfig};
pub use backbone::{get_vgg16_model, vgg16_notop};
pub use callbacks::{create_and_save_checkpoint_callback, create_and_save_tensorboard_callback, load_saved_callbacks,
                    CheckpointCallback, SavedCallbacks, TensorBoardCallback};
pub use freeze::FreezePolicy;
pub use graph::{load_model, save_model, CompileConfig, Loss, Metric, ModelGraph, Optimizer};
pub use layer::{Activation, Layer, LayerKind};
pub use weights::{CachedWeightsSource, PretrainedWeights, WeightsRef, WeightsSource, VGG16_IMAGENET_NOTOP};
