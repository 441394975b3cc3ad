//! Taxonomía de errores del pipeline.
//!
//! Todas las operaciones falibles devuelven `Result<_, FlowError>`. Ningún
//! error se recupera localmente: se propaga con `?` hasta el borde del stage,
//! donde `StageRunner` lo registra en el log y lo devuelve al binario.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum FlowError {
    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("failed to parse yaml {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("missing config key: {0}")]
    MissingKey(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("io error at {path}: {message}")]
    IoError { path: String, message: String },

    #[error("source directory not found: {0}")]
    SourceNotFound(String),

    #[error("failed to copy {from} -> {to}: {message}")]
    CopyError { from: String, to: String, message: String },

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("pretrained weights unavailable: {0}")]
    WeightsDownloadError(String),

    #[error("invalid input shape {shape:?}: {reason}")]
    InvalidInputShape { shape: Vec<usize>, reason: String },

    #[error("incompatible head: {0}")]
    IncompatibleHead(String),

    #[error("invalid freeze policy: {0}")]
    InvalidFreezePolicy(String),
}

impl FlowError {
    /// Traduce un `io::Error` a la variante semántica según su `kind`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.display().to_string()),
            _ => Self::IoError { path: path.display().to_string(),
                                 message: err.to_string() },
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(e: serde_json::Error) -> Self {
        FlowError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_maps_to_its_own_variant() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let mapped = FlowError::from_io(Path::new("/root/secret"), err);
        assert_eq!(mapped, FlowError::PermissionDenied("/root/secret".into()));
    }

    #[test]
    fn other_io_kinds_keep_path_and_message() {
        let err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        match FlowError::from_io(Path::new("a/b"), err) {
            FlowError::IoError { path, message } => {
                assert_eq!(path, "a/b");
                assert!(message.contains("disk on fire"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn errors_roundtrip_through_json_for_event_payloads() {
        let e = FlowError::InvalidInputShape { shape: vec![10, 10, 3],
                                               reason: "too small".into() };
        let v = serde_json::to_value(&e).unwrap();
        let back: FlowError = serde_json::from_value(v).unwrap();
        assert_eq!(back, e);
    }
}
