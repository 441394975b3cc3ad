use cnn_core::{create_directories, Clock, ConfigDocument, FlowError, JsonBlobStore, Stage, StageOutput, SystemClock};
use cnn_model::{create_and_save_checkpoint_callback, create_and_save_tensorboard_callback};

use crate::layout::ArtifactLayout;

/// Stage "Three": callbacks de TensorBoard y checkpoint serializados.
pub struct PrepareCallbacksStage<C: Clock = SystemClock> {
    clock: C,
    store: JsonBlobStore,
}

impl PrepareCallbacksStage<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for PrepareCallbacksStage<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PrepareCallbacksStage<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock,
               store: JsonBlobStore::pretty() }
    }
}

impl<C: Clock> Stage for PrepareCallbacksStage<C> {
    fn id(&self) -> &str {
        "prepare_callbacks"
    }

    fn name(&self) -> &str {
        "Three"
    }

    fn completion_note(&self) -> &str {
        ", Callbacks are prepared and saved as binary"
    }

    fn run(&self, config: &ConfigDocument) -> Result<StageOutput, FlowError> {
        let layout = ArtifactLayout::from_config(config)?;
        create_directories(&layout.dirs())?;

        let tensorboard = create_and_save_tensorboard_callback(&layout.callbacks_dir,
                                                               &layout.tensorboard_root,
                                                               &self.clock,
                                                               &self.store)?;
        let checkpoint = create_and_save_checkpoint_callback(&layout.callbacks_dir, &layout.checkpoint_dir, &self.store)?;
        Ok(StageOutput::new(vec![tensorboard, checkpoint]))
    }
}
