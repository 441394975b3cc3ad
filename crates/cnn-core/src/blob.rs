//! Persistencia opaca de objetos entre stages.
//!
//! Los objetos que cruzan de un stage a otro (callbacks, grafos de modelo) se
//! guardan como blobs. Dos piezas:
//! - `SerializedArtifact`: capacidad write/read de un `BlobEnvelope` en un
//!   path. El formato en disco es asunto de la implementación; los call sites
//!   sólo ven envelopes.
//! - `BlobSpec`: tipos que se exponen como blob con un `KIND` y una versión
//!   de esquema. `save_typed` / `load_typed` hacen el empaquetado y las
//!   verificaciones (kind, versión, checksum, validación).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::errors::FlowError;
use crate::hashing::hash_value;

/// Representación neutra de un blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobEnvelope {
    pub kind: String,
    pub schema_version: u32,
    pub hash: String,   // blake3 del payload canónico
    pub payload: Value, // contenido; el pipeline no lo interpreta aquí
}

impl BlobEnvelope {
    /// Construye el envelope calculando el hash del payload.
    pub fn seal(kind: &str, schema_version: u32, payload: Value) -> Self {
        let hash = hash_value(&payload);
        Self { kind: kind.to_string(),
               schema_version,
               hash,
               payload }
    }

    /// `true` si el hash almacenado coincide con el payload.
    pub fn verify(&self) -> bool {
        hash_value(&self.payload) == self.hash
    }
}

/// Capacidad de escribir/leer blobs.
pub trait SerializedArtifact {
    fn write_blob(&self, path: &Path, envelope: &BlobEnvelope) -> Result<(), FlowError>;
    fn read_blob(&self, path: &Path) -> Result<BlobEnvelope, FlowError>;
}

/// Tipo persistible como blob.
pub trait BlobSpec: Sized + Serialize + DeserializeOwned {
    /// Identificador del tipo dentro del envelope.
    const KIND: &'static str;
    /// Incrementar en cambios incompatibles.
    const SCHEMA_VERSION: u32 = 1;

    /// Validación semántica ligera tras decodificar. Opcional.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Serializa `value` y lo escribe en `path`. Devuelve el hash del payload.
pub fn save_typed<T, S>(store: &S, path: &Path, value: &T) -> Result<String, FlowError>
    where T: BlobSpec,
          S: SerializedArtifact + ?Sized
{
    let payload = serde_json::to_value(value)?;
    let envelope = BlobEnvelope::seal(T::KIND, T::SCHEMA_VERSION, payload);
    store.write_blob(path, &envelope)?;
    Ok(envelope.hash)
}

/// Lee `path` y decodifica verificando kind, versión, checksum y validación.
pub fn load_typed<T, S>(store: &S, path: &Path) -> Result<T, FlowError>
    where T: BlobSpec,
          S: SerializedArtifact + ?Sized
{
    let envelope = store.read_blob(path)?;
    if envelope.kind != T::KIND {
        return Err(FlowError::SerializationError(format!("{}: expected kind {} but found {}",
                                                         path.display(),
                                                         T::KIND,
                                                         envelope.kind)));
    }
    if envelope.schema_version != T::SCHEMA_VERSION {
        return Err(FlowError::SerializationError(format!("{}: schema version {} not supported (expected {})",
                                                         path.display(),
                                                         envelope.schema_version,
                                                         T::SCHEMA_VERSION)));
    }
    if !envelope.verify() {
        return Err(FlowError::SerializationError(format!("{}: checksum mismatch", path.display())));
    }
    let decoded: T = serde_json::from_value(envelope.payload)?;
    decoded.validate().map_err(FlowError::SerializationError)?;
    Ok(decoded)
}

/// Blobs como JSON en disco (sobrescribe el archivo si existe).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBlobStore {
    pub pretty: bool,
}

impl JsonBlobStore {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl SerializedArtifact for JsonBlobStore {
    fn write_blob(&self, path: &Path, envelope: &BlobEnvelope) -> Result<(), FlowError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(envelope)?
        } else {
            serde_json::to_vec(envelope)?
        };
        fs::write(path, bytes).map_err(|e| FlowError::SerializationError(format!("cannot write {}: {e}", path.display())))
    }

    fn read_blob(&self, path: &Path) -> Result<BlobEnvelope, FlowError> {
        let bytes = fs::read(path).map_err(|e| FlowError::from_io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| FlowError::SerializationError(format!("{}: {e}", path.display())))
    }
}

/// Blobs en memoria, indexados por path. Útil en tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    inner: Mutex<HashMap<PathBuf, BlobEnvelope>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SerializedArtifact for MemoryBlobStore {
    fn write_blob(&self, path: &Path, envelope: &BlobEnvelope) -> Result<(), FlowError> {
        let mut map = self.inner
                          .lock()
                          .map_err(|_| FlowError::SerializationError("memory store poisoned".into()))?;
        map.insert(path.to_path_buf(), envelope.clone());
        Ok(())
    }

    fn read_blob(&self, path: &Path) -> Result<BlobEnvelope, FlowError> {
        let map = self.inner
                      .lock()
                      .map_err(|_| FlowError::SerializationError("memory store poisoned".into()))?;
        map.get(path)
           .cloned()
           .ok_or_else(|| FlowError::IoError { path: path.display().to_string(),
                                               message: "no blob stored at this path".into() })
    }
}
