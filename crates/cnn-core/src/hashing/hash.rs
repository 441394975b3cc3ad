//! Helpers de hash (blake3, salida hex de 64 caracteres).

use std::fs::File;
use std::io;
use std::path::Path;

use blake3::Hasher;
use serde_json::Value;

use super::to_canonical_json;
use crate::errors::FlowError;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash del JSON canónico de `value`.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

/// Hash en streaming del contenido de un archivo. Devuelve `(hex, bytes)`.
pub fn hash_file(path: &Path) -> Result<(String, u64), FlowError> {
    let mut file = File::open(path).map_err(|e| FlowError::from_io(path, e))?;
    let mut h = Hasher::new();
    let bytes = io::copy(&mut file, &mut h).map_err(|e| FlowError::from_io(path, e))?;
    Ok((h.finalize().to_hex().to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_value_ignores_key_order() {
        let h1 = hash_value(&json!({"b": 2, "a": 1}));
        let h2 = hash_value(&json!({"a": 1, "b": 2}));
        assert_eq!(h1.len(), 64);
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_file_matches_hash_of_contents() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("w.bin");
        std::fs::write(&p, b"weights").unwrap();
        let (hex, bytes) = hash_file(&p).unwrap();
        assert_eq!(bytes, 7);
        assert_eq!(hex, hash_str("weights"));
    }
}
