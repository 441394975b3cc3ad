//! Carga de la configuración YAML y del entorno.
//!
//! `read_yaml` parsea el documento completo pero no valida esquema: una clave
//! ausente sólo se detecta cuando un stage la pide (`MissingKey`). Las claves
//! se direccionan con notación de puntos (`artifacts.CHECKPOINT_DIR`).
//!
//! El entorno (`.env`) se carga una sola vez y de forma perezosa; se usa para
//! overrides que no deben vivir en el YAML versionado (p. ej. la caché de
//! pesos preentrenados).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dotenvy::dotenv;
use log::info;
use once_cell::sync::Lazy;
use serde_yaml::Value;

use crate::errors::FlowError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env desde los binarios si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

/// Lee una variable de entorno (tras cargar `.env`). Vacía cuenta como ausente.
pub fn env_var(name: &str) -> Option<String> {
    Lazy::force(&DOTENV_LOADED);
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Par origen → destino del stage de datos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPair {
    pub source: PathBuf,
    pub local: PathBuf,
}

/// Documento de configuración ya parseado.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    raw: String,
    root: Value,
}

/// Lee y parsea `path` como YAML.
pub fn read_yaml(path: &Path) -> Result<ConfigDocument, FlowError> {
    if !path.is_file() {
        return Err(FlowError::ConfigNotFound(path.display().to_string()));
    }
    let raw = fs::read_to_string(path).map_err(|e| FlowError::from_io(path, e))?;
    let doc = ConfigDocument::parse(path, raw)?;
    info!("yaml file: {} loaded successfully", path.display());
    Ok(doc)
}

impl ConfigDocument {
    /// Parsea texto YAML; `path` sólo se usa para mensajes de error.
    pub fn parse(path: impl Into<PathBuf>, raw: String) -> Result<Self, FlowError> {
        let path = path.into();
        let root: Value = serde_yaml::from_str(&raw).map_err(|e| FlowError::ParseError { path: path.display().to_string(),
                                                                                           message: e.to_string() })?;
        if !root.is_mapping() {
            return Err(FlowError::ParseError { path: path.display().to_string(),
                                               message: "top-level document must be a mapping".into() });
        }
        Ok(Self { path, raw, root })
    }

    /// Atajo para tests y callers que ya tienen el texto en memoria.
    pub fn from_yaml_str(raw: &str) -> Result<Self, FlowError> {
        Self::parse("<inline>", raw.to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Texto original (se hashea para el fingerprint del stage).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Valor opcional en `key`; `None` si falta algún segmento o es `null`.
    pub fn opt_value(&self, key: &str) -> Option<&Value> {
        let mut cur = &self.root;
        for segment in key.split('.') {
            cur = cur.as_mapping()?.get(segment)?;
        }
        if cur.is_null() {
            None
        } else {
            Some(cur)
        }
    }

    pub fn value(&self, key: &str) -> Result<&Value, FlowError> {
        self.opt_value(key).ok_or_else(|| FlowError::MissingKey(key.to_string()))
    }

    pub fn str(&self, key: &str) -> Result<&str, FlowError> {
        self.value(key)?
            .as_str()
            .ok_or_else(|| mismatch(key, "a string"))
    }

    pub fn path_value(&self, key: &str) -> Result<PathBuf, FlowError> {
        self.str(key).map(PathBuf::from)
    }

    pub fn opt_path(&self, key: &str) -> Result<Option<PathBuf>, FlowError> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(_) => self.path_value(key).map(Some),
        }
    }

    pub fn str_list(&self, key: &str) -> Result<Vec<String>, FlowError> {
        let seq = self.value(key)?
                      .as_sequence()
                      .ok_or_else(|| mismatch(key, "a sequence"))?;
        seq.iter()
           .enumerate()
           .map(|(i, v)| v.as_str()
                          .map(str::to_string)
                          .ok_or_else(|| mismatch(&format!("{key}[{i}]"), "a string")))
           .collect()
    }

    pub fn usize_list(&self, key: &str) -> Result<Vec<usize>, FlowError> {
        let seq = self.value(key)?
                      .as_sequence()
                      .ok_or_else(|| mismatch(key, "a sequence"))?;
        seq.iter()
           .enumerate()
           .map(|(i, v)| v.as_u64()
                          .map(|n| n as usize)
                          .ok_or_else(|| mismatch(&format!("{key}[{i}]"), "a non-negative integer")))
           .collect()
    }

    pub fn f64(&self, key: &str) -> Result<f64, FlowError> {
        self.value(key)?
            .as_f64()
            .ok_or_else(|| mismatch(key, "a number"))
    }

    pub fn i64(&self, key: &str) -> Result<i64, FlowError> {
        self.value(key)?
            .as_i64()
            .ok_or_else(|| mismatch(key, "an integer"))
    }

    pub fn opt_i64(&self, key: &str) -> Result<Option<i64>, FlowError> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(_) => self.i64(key).map(Some),
        }
    }

    pub fn usize(&self, key: &str) -> Result<usize, FlowError> {
        self.value(key)?
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| mismatch(key, "a non-negative integer"))
    }

    pub fn opt_usize(&self, key: &str) -> Result<Option<usize>, FlowError> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(_) => self.usize(key).map(Some),
        }
    }

    pub fn bool(&self, key: &str) -> Result<bool, FlowError> {
        self.value(key)?
            .as_bool()
            .ok_or_else(|| mismatch(key, "a boolean"))
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, FlowError> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(_) => self.bool(key).map(Some),
        }
    }

    /// Empareja `source_download_dirs` con `local_data_dirs`.
    ///
    /// El YAML mantiene dos listas paralelas; aquí se convierten a pares con
    /// nombre y se exige igual longitud (nunca se trunca en silencio).
    pub fn data_pairs(&self) -> Result<Vec<DataPair>, FlowError> {
        let sources = self.str_list("source_download_dirs")?;
        let locals = self.str_list("local_data_dirs")?;
        if sources.len() != locals.len() {
            return Err(FlowError::InvalidConfig(format!("source_download_dirs has {} entries but local_data_dirs has {}",
                                                        sources.len(),
                                                        locals.len())));
        }
        Ok(sources.into_iter()
                  .zip(locals)
                  .map(|(s, l)| DataPair { source: PathBuf::from(s),
                                           local: PathBuf::from(l) })
                  .collect())
    }
}

fn mismatch(key: &str, expected: &str) -> FlowError {
    FlowError::InvalidConfig(format!("{key}: expected {expected}"))
}
