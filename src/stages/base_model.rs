use cnn_core::{create_directories, Clock, ConfigDocument, FlowError, JsonBlobStore, Stage, StageOutput, SystemClock};
use cnn_model::{get_vgg16_model, prepare_full_model, save_model, CachedWeightsSource, FreezePolicy, HeadConfig,
                WeightsSource};
use serde_json::json;

use crate::layout::ModelLayout;

/// Stage "two": backbone VGG16 preentrenado + cabeza de clasificación.
///
/// Persiste el backbone sin tocar en `BASE_MODEL_DIR/BASE_MODEL_NAME` y el
/// modelo compuesto en `BASE_MODEL_DIR/<UPDATED_BASE_MODEL_NAME>_at_<ts>.model`.
/// Sin fuente de pesos explícita usa la caché local (`CNNFLOW_WEIGHTS_DIR`,
/// `params.WEIGHTS_DIR` o `weights/`).
pub struct PrepareBaseModelStage<C: Clock = SystemClock> {
    clock: C,
    weights: Option<Box<dyn WeightsSource>>,
    store: JsonBlobStore,
}

impl PrepareBaseModelStage<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for PrepareBaseModelStage<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PrepareBaseModelStage<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock,
               weights: None,
               store: JsonBlobStore::pretty() }
    }

    pub fn with_weights(mut self, source: impl WeightsSource + 'static) -> Self {
        self.weights = Some(Box::new(source));
        self
    }
}

/// Lee `params.*` y arma la configuración de la cabeza.
fn head_config(config: &ConfigDocument) -> Result<HeadConfig, FlowError> {
    let freeze = FreezePolicy::from_flags(config.opt_bool("params.FREEZE_ALL")?.unwrap_or(true),
                                          config.opt_i64("params.FREEZE_TILL")?)?;
    Ok(HeadConfig::new(config.f64("params.LEARNING_RATE")?).with_classes(config.opt_usize("params.CLASSES")?.unwrap_or(2))
                                                          .with_freeze(freeze))
}

impl<C: Clock> Stage for PrepareBaseModelStage<C> {
    fn id(&self) -> &str {
        "prepare_base_model"
    }

    fn name(&self) -> &str {
        "two"
    }

    fn completion_note(&self) -> &str {
        ", base model and full model are saved"
    }

    fn run(&self, config: &ConfigDocument) -> Result<StageOutput, FlowError> {
        let layout = ModelLayout::from_config(config)?;
        let input_shape = config.usize_list("params.IMAGE_SIZE")?;
        let head = head_config(config)?;
        // Config inválida falla antes de escribir el backbone.
        head.validate()?;
        create_directories(&[&layout.base_model_dir])?;

        let cached;
        let source: &dyn WeightsSource = match &self.weights {
            Some(source) => source.as_ref(),
            None => {
                cached = CachedWeightsSource::from_env_or(config.opt_path("params.WEIGHTS_DIR")?);
                &cached
            }
        };

        let base = get_vgg16_model(&input_shape, source, &self.store, &layout.base_model_path)?;
        let full = prepare_full_model(&base, &head)?;
        let updated_path = layout.updated_model_path(&self.clock);
        save_model(&self.store, &updated_path, &full)?;

        let summary = json!({
            "total_params": full.total_params(),
            "trainable_params": full.trainable_params(),
            "classes": head.classes,
        });
        Ok(StageOutput::new(vec![layout.base_model_path, updated_path]).with_summary(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(params: &str) -> ConfigDocument {
        ConfigDocument::from_yaml_str(&format!("params:\n  LEARNING_RATE: 0.01\n{params}")).unwrap()
    }

    #[test]
    fn head_defaults_to_two_classes_all_frozen() {
        let head = head_config(&doc("")).unwrap();
        assert_eq!(head, HeadConfig::new(0.01));
    }

    #[test]
    fn head_reads_freeze_till_and_classes() {
        let head = head_config(&doc("  CLASSES: 4\n  FREEZE_ALL: false\n  FREEZE_TILL: 3\n")).unwrap();
        assert_eq!(head.classes, 4);
        assert_eq!(head.freeze, FreezePolicy::FreezeAllBut(3));
    }

    #[test]
    fn unfreezing_without_count_is_rejected() {
        let err = head_config(&doc("  FREEZE_ALL: false\n")).unwrap_err();
        assert!(matches!(err, FlowError::InvalidFreezePolicy(_)));
    }
}
