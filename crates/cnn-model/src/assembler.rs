//! Ensamblado del modelo completo: backbone congelado + cabeza de clasificación.

use cnn_core::FlowError;
use log::info;

use crate::freeze::FreezePolicy;
use crate::graph::{CompileConfig, Loss, Metric, ModelGraph, Optimizer};
use crate::layer::{Activation, Layer, LayerKind};

/// Número de capas que añade `prepare_full_model` (Flatten + Dense).
pub const HEAD_LAYERS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct HeadConfig {
    pub learning_rate: f64,
    pub classes: usize,
    pub freeze: FreezePolicy,
}

impl HeadConfig {
    /// Dos clases y backbone totalmente congelado.
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate,
               classes: 2,
               freeze: FreezePolicy::FreezeAll }
    }

    pub fn with_classes(mut self, classes: usize) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_freeze(mut self, freeze: FreezePolicy) -> Self {
        self.freeze = freeze;
        self
    }

    /// Rechaza learning rate no positivo o no finito y cero clases.
    pub fn validate(&self) -> Result<(), FlowError> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(FlowError::InvalidConfig(format!("learning rate must be a positive number, got {}",
                                                        self.learning_rate)));
        }
        if self.classes == 0 {
            return Err(FlowError::InvalidConfig("classes must be at least 1".into()));
        }
        Ok(())
    }
}

/// Congela el backbone según `head.freeze`, añade `Flatten` + `Dense(softmax)`
/// y compila con SGD, entropía cruzada categórica y accuracy.
///
/// El backbone recibido no se modifica.
pub fn prepare_full_model(backbone: &ModelGraph, head: &HeadConfig) -> Result<ModelGraph, FlowError> {
    head.validate()?;
    if backbone.layers.is_empty() {
        return Err(FlowError::IncompatibleHead(format!("backbone {} has no layers", backbone.name)));
    }
    if backbone.head_layers > 0 {
        return Err(FlowError::IncompatibleHead(format!("backbone {} already carries a classification head",
                                                       backbone.name)));
    }
    let output = backbone.output_shape();
    let features = output.iter()
                         .try_fold(1usize, |acc, d| acc.checked_mul(*d))
                         .ok_or_else(|| FlowError::IncompatibleHead(format!("backbone output {output:?} is too large to flatten")))?;
    if output.is_empty() || features == 0 {
        return Err(FlowError::IncompatibleHead(format!("backbone output {output:?} cannot be flattened")));
    }
    let dense_params = (features as u64).checked_add(1)
                                        .and_then(|n| n.checked_mul(head.classes as u64))
                                        .ok_or_else(|| {
                                            FlowError::IncompatibleHead(format!("dense layer with {} inputs and {} classes overflows the parameter count",
                                                                                features,
                                                                                head.classes))
                                        })?;

    let mut layers = backbone.layers.clone();
    head.freeze.apply(&mut layers);
    layers.push(Layer::new("flatten", LayerKind::Flatten, vec![features], 0));
    layers.push(Layer::new("dense",
                           LayerKind::Dense { units: head.classes,
                                              activation: Activation::Softmax },
                           vec![head.classes],
                           dense_params));

    let model = ModelGraph { name: "model".into(),
                             input_shape: backbone.input_shape.clone(),
                             layers,
                             weights: backbone.weights.clone(),
                             compile: Some(CompileConfig { optimizer: Optimizer::Sgd { learning_rate: head.learning_rate,
                                                                                       momentum: 0.0,
                                                                                       nesterov: false },
                                                           loss: Loss::CategoricalCrossentropy,
                                                           metrics: vec![Metric::Accuracy] }),
                             head_layers: HEAD_LAYERS };
    if model.checked_total_params().is_none() {
        return Err(FlowError::IncompatibleHead(format!("model parameter count overflows with {} classes", head.classes)));
    }

    info!("base model summary:\n{}", backbone.summary());
    info!("full model summary:\n{}", model.summary());
    Ok(model)
}
