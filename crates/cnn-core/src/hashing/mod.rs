//! Hashing y canonicalización JSON.
//!
//! Los envelopes de blobs y los fingerprints de stage se hashean sobre JSON
//! canónico (claves ordenadas) para que el resultado no dependa del orden de
//! inserción.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_file, hash_str, hash_value};
