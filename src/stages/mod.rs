//! Stages del pipeline. Cada uno es independiente y se ejecuta con `StageRunner`.

pub mod base_model;
pub mod callbacks;
pub mod get_data;

pub use base_model::PrepareBaseModelStage;
pub use callbacks::PrepareCallbacksStage;
pub use get_data::GetDataStage;
