//! Grafo de modelo persistible.
//!
//! `ModelGraph` describe una red lineal (entrada → capas → salida) con su
//! referencia de pesos y, si ya fue compilado, la configuración de
//! entrenamiento. Es lo que los stages guardan y releen.

use std::path::Path;

use cnn_core::{load_typed, save_typed, BlobSpec, FlowError, SerializedArtifact};
use log::info;
use serde::{Deserialize, Serialize};

use crate::layer::Layer;
use crate::weights::WeightsRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Optimizer {
    Sgd { learning_rate: f64, momentum: f64, nesterov: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Loss {
    CategoricalCrossentropy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Accuracy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileConfig {
    pub optimizer: Optimizer,
    pub loss: Loss,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelGraph {
    pub name: String,
    pub input_shape: Vec<usize>,
    pub layers: Vec<Layer>,
    /// Pesos preentrenados de la parte backbone.
    pub weights: Option<WeightsRef>,
    pub compile: Option<CompileConfig>,
    /// Cuántas de las últimas capas forman la cabeza añadida (0 = backbone puro).
    #[serde(default)]
    pub head_layers: usize,
}

impl ModelGraph {
    /// Forma de salida de la última capa (vacía si no hay capas).
    pub fn output_shape(&self) -> &[usize] {
        self.layers.last().map(|l| l.output_shape.as_slice()).unwrap_or(&[])
    }

    /// Capas heredadas del backbone (todas menos la cabeza).
    pub fn backbone_layers(&self) -> &[Layer] {
        &self.layers[..self.layers.len().saturating_sub(self.head_layers)]
    }

    /// Capas de la cabeza de clasificación.
    pub fn head(&self) -> &[Layer] {
        &self.layers[self.layers.len().saturating_sub(self.head_layers)..]
    }

    /// Suma de parámetros, `None` si desborda `u64`.
    pub fn checked_total_params(&self) -> Option<u64> {
        self.layers.iter().try_fold(0u64, |acc, l| acc.checked_add(l.params))
    }

    /// Suma saturada en `u64::MAX`.
    pub fn total_params(&self) -> u64 {
        self.layers.iter().fold(0u64, |acc, l| acc.saturating_add(l.params))
    }

    pub fn trainable_params(&self) -> u64 {
        self.layers.iter().fold(0u64, |acc, l| acc.saturating_add(l.trainable_params()))
    }

    pub fn non_trainable_params(&self) -> u64 {
        self.total_params().saturating_sub(self.trainable_params())
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Tabla estilo Keras `model.summary()`.
    pub fn summary(&self) -> String {
        let thin = "_".repeat(65);
        let thick = "=".repeat(65);
        let mut out = String::new();
        out.push_str(&format!("Model: \"{}\"\n", self.name));
        out.push_str(&thin);
        out.push('\n');
        out.push_str(&format!(" {:<28}{:<26}{}\n", "Layer (type)", "Output Shape", "Param #"));
        out.push_str(&thick);
        out.push('\n');
        for layer in &self.layers {
            let label = format!("{} ({})", layer.name, layer.kind.type_name());
            out.push_str(&format!(" {:<28}{:<26}{}\n", label, shape_repr(&layer.output_shape), layer.params));
        }
        out.push_str(&thick);
        out.push('\n');
        out.push_str(&format!("Total params: {}\n", with_commas(self.total_params())));
        out.push_str(&format!("Trainable params: {}\n", with_commas(self.trainable_params())));
        out.push_str(&format!("Non-trainable params: {}\n", with_commas(self.non_trainable_params())));
        out.push_str(&thin);
        out
    }
}

impl BlobSpec for ModelGraph {
    const KIND: &'static str = "model_graph";

    fn validate(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err(format!("model {} has no layers", self.name));
        }
        if self.checked_total_params().is_none() {
            return Err(format!("model {} parameter count overflows", self.name));
        }
        if self.head_layers > self.layers.len() {
            return Err(format!("model {} declares {} head layers but has {}",
                               self.name,
                               self.head_layers,
                               self.layers.len()));
        }
        Ok(())
    }
}

/// `(None, 7, 7, 512)`
fn shape_repr(shape: &[usize]) -> String {
    let dims: Vec<String> = std::iter::once("None".to_string()).chain(shape.iter().map(|d| d.to_string()))
                                                              .collect();
    format!("({})", dims.join(", "))
}

/// `14714688` → `14,714,688`
pub fn with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Persiste el grafo en `path`.
pub fn save_model(store: &dyn SerializedArtifact, path: &Path, model: &ModelGraph) -> Result<String, FlowError> {
    let hash = save_typed(store, path, model)?;
    info!("model {} saved at: {}", model.name, path.display());
    Ok(hash)
}

/// Relee un grafo guardado con `save_model`.
pub fn load_model(store: &dyn SerializedArtifact, path: &Path) -> Result<ModelGraph, FlowError> {
    load_typed(store, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Activation, LayerKind};

    fn tiny() -> ModelGraph {
        let mut frozen = Layer::new("conv", LayerKind::Conv2D { filters: 2, kernel: (3, 3), activation: Activation::Relu }, vec![4, 4, 2], 56);
        frozen.trainable = false;
        ModelGraph { name: "tiny".into(),
                     input_shape: vec![4, 4, 3],
                     layers: vec![Layer::new("input_1", LayerKind::Input, vec![4, 4, 3], 0),
                                  frozen,
                                  Layer::new("flatten", LayerKind::Flatten, vec![32], 0),
                                  Layer::new("dense", LayerKind::Dense { units: 2, activation: Activation::Softmax }, vec![2], 66)],
                     weights: None,
                     compile: None,
                     head_layers: 2 }
    }

    #[test]
    fn commas_group_thousands() {
        assert_eq!(with_commas(0), "0");
        assert_eq!(with_commas(999), "999");
        assert_eq!(with_commas(1000), "1,000");
        assert_eq!(with_commas(14_714_688), "14,714,688");
    }

    #[test]
    fn param_accounting_respects_trainable_flags() {
        let m = tiny();
        assert_eq!(m.total_params(), 122);
        assert_eq!(m.trainable_params(), 66);
        assert_eq!(m.non_trainable_params(), 56);
    }

    #[test]
    fn backbone_and_head_split() {
        let m = tiny();
        assert_eq!(m.backbone_layers().len(), 2);
        assert_eq!(m.head()[0].name, "flatten");
        assert_eq!(m.output_shape(), &[2]);
    }

    #[test]
    fn summary_lists_every_layer_and_totals() {
        let s = tiny().summary();
        assert!(s.starts_with("Model: \"tiny\""));
        assert!(s.contains("conv (Conv2D)"));
        assert!(s.contains("(None, 4, 4, 2)"));
        assert!(s.contains("Total params: 122"));
        assert!(s.contains("Non-trainable params: 56"));
    }

    #[test]
    fn overflowing_param_count_saturates_and_fails_validation() {
        let mut m = tiny();
        m.layers[3].params = u64::MAX;
        assert_eq!(m.checked_total_params(), None);
        assert_eq!(m.total_params(), u64::MAX);
        assert!(m.validate().is_err());
    }

    #[test]
    fn empty_graph_fails_validation() {
        let mut m = tiny();
        m.layers.clear();
        m.head_layers = 0;
        assert!(m.validate().is_err());
    }
}
