//! Backbone VGG16 en modo extractor de features (sin clasificador).
//!
//! La geometría es la publicada: cinco bloques de convoluciones 3×3 `same`
//! con ReLU (64, 128, 256, 512, 512 filtros; 2, 2, 3, 3, 3 capas) seguidos
//! cada uno de un max-pool 2×2 stride 2. Con entrada 224×224×3 la salida es
//! 7×7×512 y el total 14,714,688 parámetros.

use std::path::Path;

use cnn_core::{FlowError, SerializedArtifact};
use log::info;

use crate::graph::{save_model, ModelGraph};
use crate::layer::{Activation, Layer, LayerKind};
use crate::weights::{WeightsSource, VGG16_IMAGENET_NOTOP};

/// (filtros, convoluciones) por bloque.
const VGG16_BLOCKS: [(usize, usize); 5] = [(64, 2), (128, 2), (256, 3), (512, 3), (512, 3)];

/// Lado mínimo aceptado por VGG16 sin top.
pub const VGG16_MIN_SIDE: usize = 32;

/// Valida `[alto, ancho, canales]` contra las restricciones de VGG16.
pub fn validate_vgg16_input(shape: &[usize]) -> Result<(), FlowError> {
    let invalid = |reason: &str| FlowError::InvalidInputShape { shape: shape.to_vec(),
                                                                reason: reason.to_string() };
    let [h, w, c] = shape else {
        return Err(invalid("expected [height, width, channels]"));
    };
    if *c != 3 {
        return Err(invalid("VGG16 pretrained weights expect exactly 3 input channels"));
    }
    if *h < VGG16_MIN_SIDE || *w < VGG16_MIN_SIDE {
        return Err(invalid("height and width must be at least 32"));
    }
    Ok(())
}

/// Construye el grafo VGG16 sin top para `input_shape` (sin pesos).
pub fn vgg16_notop(input_shape: &[usize]) -> Result<ModelGraph, FlowError> {
    validate_vgg16_input(input_shape)?;
    let (mut h, mut w, mut channels) = (input_shape[0], input_shape[1], input_shape[2]);

    let mut layers = vec![Layer::new("input_1", LayerKind::Input, input_shape.to_vec(), 0)];
    for (block, (filters, convs)) in VGG16_BLOCKS.iter().enumerate() {
        for conv in 1..=*convs {
            let params = ((3 * 3 * channels + 1) * filters) as u64;
            layers.push(Layer::new(format!("block{}_conv{}", block + 1, conv),
                                   LayerKind::Conv2D { filters: *filters,
                                                       kernel: (3, 3),
                                                       activation: Activation::Relu },
                                   vec![h, w, *filters],
                                   params));
            channels = *filters;
        }
        h /= 2;
        w /= 2;
        layers.push(Layer::new(format!("block{}_pool", block + 1),
                               LayerKind::MaxPool2D { pool: (2, 2), strides: (2, 2) },
                               vec![h, w, channels],
                               0));
    }

    Ok(ModelGraph { name: "vgg16".into(),
                    input_shape: input_shape.to_vec(),
                    layers,
                    weights: None,
                    compile: None,
                    head_layers: 0 })
}

/// Obtiene el backbone VGG16 preentrenado y lo persiste sin modificar en `model_path`.
///
/// La forma se valida antes de pedir los pesos.
pub fn get_vgg16_model(input_shape: &[usize],
                       source: &dyn WeightsSource,
                       store: &dyn SerializedArtifact,
                       model_path: &Path)
                       -> Result<ModelGraph, FlowError> {
    let mut model = vgg16_notop(input_shape)?;
    model.weights = Some(source.fetch(&VGG16_IMAGENET_NOTOP)?);
    save_model(store, model_path, &model)?;
    info!("VGG16 base model saved at: {}", model_path.display());
    Ok(model)
}
