//! cnn-core: piezas comunes de los stages del pipeline
//!
//! - `config`: lectura del YAML y acceso por claves con puntos.
//! - `fsutil`: aprovisionamiento de directorios y copia plana de archivos.
//! - `naming`: nombres únicos con timestamp (reloj inyectable).
//! - `blob`: persistencia opaca de objetos entre stages.
//! - `logging`: sink de diagnóstico del proceso (`log`).
//! - `stage`: trait `Stage`, runner y eventos.

pub mod blob;
pub mod config;
pub mod constants;
pub mod errors;
pub mod fsutil;
pub mod hashing;
pub mod logging;
pub mod naming;
pub mod stage;

pub use blob::{load_typed, save_typed, BlobEnvelope, BlobSpec, JsonBlobStore, MemoryBlobStore, SerializedArtifact};
pub use config::{read_yaml, ConfigDocument, DataPair};
pub use errors::FlowError;
pub use fsutil::{copy_files, create_directories, CopyReport};
pub use naming::{get_timestamp, unique_name, Clock, FixedClock, SystemClock};
pub use stage::{Stage, StageOutput, StageRunner};
