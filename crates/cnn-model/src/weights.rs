//! Pesos preentrenados.
//!
//! Un `PretrainedWeights` describe un set de pesos publicado (arquitectura,
//! dataset, nombre de archivo y URLs de origen). Un `WeightsSource` resuelve
//! ese descriptor a un archivo concreto y devuelve un `WeightsRef` con su
//! digest; el pipeline nunca abre el contenido, sólo lo referencia.

use std::path::{Path, PathBuf};

use cnn_core::config::env_var;
use cnn_core::hashing::hash_file;
use cnn_core::FlowError;
use log::info;
use serde::{Deserialize, Serialize};

/// Variable de entorno que fija el directorio de caché de pesos.
pub const WEIGHTS_DIR_ENV: &str = "CNNFLOW_WEIGHTS_DIR";

/// Directorio de caché cuando ni el entorno ni la config lo fijan.
pub const DEFAULT_WEIGHTS_DIR: &str = "weights";

/// Descriptor estático de un set de pesos publicado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PretrainedWeights {
    pub name: &'static str,
    pub architecture: &'static str,
    pub dataset: &'static str,
    pub file_name: &'static str,
    pub urls: &'static [&'static str],
}

/// VGG16 entrenado en ImageNet, sin las capas densas del clasificador.
pub static VGG16_IMAGENET_NOTOP: PretrainedWeights = PretrainedWeights {
    name: "vgg16_imagenet_notop",
    architecture: "vgg16",
    dataset: "imagenet",
    file_name: "vgg16_weights_tf_dim_ordering_tf_kernels_notop.h5",
    urls: &["https://storage.googleapis.com/tensorflow/keras-applications/vgg16/vgg16_weights_tf_dim_ordering_tf_kernels_notop.h5"],
};

/// Referencia a pesos resueltos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightsRef {
    pub name: String,
    pub path: PathBuf,
    pub digest: String, // blake3 del archivo
    pub bytes: u64,
}

/// Resuelve un descriptor de pesos a un archivo disponible.
pub trait WeightsSource {
    fn fetch(&self, weights: &PretrainedWeights) -> Result<WeightsRef, FlowError>;
}

/// Busca los pesos en un directorio de caché local (`<root>/<file_name>`).
#[derive(Debug, Clone)]
pub struct CachedWeightsSource {
    root: PathBuf,
}

impl CachedWeightsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `CNNFLOW_WEIGHTS_DIR` si está definido, si no `fallback`, si no `weights/`.
    pub fn from_env_or(fallback: Option<PathBuf>) -> Self {
        let root = env_var(WEIGHTS_DIR_ENV).map(PathBuf::from)
                                           .or(fallback)
                                           .unwrap_or_else(|| PathBuf::from(DEFAULT_WEIGHTS_DIR));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl WeightsSource for CachedWeightsSource {
    fn fetch(&self, weights: &PretrainedWeights) -> Result<WeightsRef, FlowError> {
        let path = self.root.join(weights.file_name);
        if !path.is_file() {
            return Err(FlowError::WeightsDownloadError(format!("{} not found in {} (published at {})",
                                                               weights.file_name,
                                                               self.root.display(),
                                                               weights.urls.join(", "))));
        }
        let (digest, bytes) = hash_file(&path).map_err(|e| FlowError::WeightsDownloadError(e.to_string()))?;
        info!("pretrained weights {} resolved at {} ({} bytes)", weights.name, path.display(), bytes);
        Ok(WeightsRef { name: weights.name.to_string(),
                        path,
                        digest,
                        bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_download_error_naming_the_url() {
        let tmp = tempfile::tempdir().unwrap();
        let err = CachedWeightsSource::new(tmp.path()).fetch(&VGG16_IMAGENET_NOTOP).unwrap_err();
        match err {
            FlowError::WeightsDownloadError(msg) => {
                assert!(msg.contains(VGG16_IMAGENET_NOTOP.file_name));
                assert!(msg.contains("storage.googleapis.com"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cached_file_is_referenced_with_digest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(VGG16_IMAGENET_NOTOP.file_name), b"fake-h5").unwrap();
        let r = CachedWeightsSource::new(tmp.path()).fetch(&VGG16_IMAGENET_NOTOP).unwrap();
        assert_eq!(r.name, "vgg16_imagenet_notop");
        assert_eq!(r.bytes, 7);
        assert_eq!(r.digest.len(), 64);
    }
}
