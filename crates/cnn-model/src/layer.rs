//! Capas del grafo.
//!
//! Sólo se modela lo que el pipeline inspecciona: tipo, forma de salida
//! (sin dimensión de batch), número de parámetros y flag `trainable`. Los
//! valores de los pesos viven en el archivo referenciado por el modelo.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Linear,
    Relu,
    Softmax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Input,
    /// Convolución 2D con padding `same` y stride 1.
    Conv2D { filters: usize, kernel: (usize, usize), activation: Activation },
    MaxPool2D { pool: (usize, usize), strides: (usize, usize) },
    Flatten,
    Dense { units: usize, activation: Activation },
}

impl LayerKind {
    /// Nombre de clase estilo Keras (para el summary).
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Input => "InputLayer",
            LayerKind::Conv2D { .. } => "Conv2D",
            LayerKind::MaxPool2D { .. } => "MaxPooling2D",
            LayerKind::Flatten => "Flatten",
            LayerKind::Dense { .. } => "Dense",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub output_shape: Vec<usize>,
    pub params: u64,
    pub trainable: bool,
}

impl Layer {
    /// Capa nueva, entrenable por defecto.
    pub fn new(name: impl Into<String>, kind: LayerKind, output_shape: Vec<usize>, params: u64) -> Self {
        Self { name: name.into(),
               kind,
               output_shape,
               params,
               trainable: true }
    }

    /// Parámetros que el optimizador actualizaría.
    pub fn trainable_params(&self) -> u64 {
        if self.trainable {
            self.params
        } else {
            0
        }
    }
}
