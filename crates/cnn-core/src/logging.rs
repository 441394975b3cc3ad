//! Sink de diagnóstico del proceso.
//!
//! Implementa `log::Log` sobre un destino intercambiable: `init_file_sink`
//! abre el log en modo append, `init_writer_sink` acepta cualquier `Write`
//! (tests) y `teardown` vacía y suelta el destino. El guard devuelto por los
//! `init_*` hace teardown al salir de scope.
//!
//! Formato de línea: `[<fecha hora,ms>: <LEVEL>: <módulo>]: <mensaje>`. Cada
//! línea se escribe con un único `write_all` bajo el mutex.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

use crate::config::env_var;
use crate::constants::LOG_LEVEL_ENV;
use crate::errors::FlowError;

type Target = Box<dyn Write + Send>;

static TARGET: Lazy<Mutex<Option<Target>>> = Lazy::new(|| Mutex::new(None));
static LOGGER: SinkLogger = SinkLogger;

struct SinkLogger;

fn target() -> MutexGuard<'static, Option<Target>> {
    TARGET.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Log for SinkLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut guard = target();
        if let Some(w) = guard.as_mut() {
            let line = format_line(record);
            // Un fallo de escritura del log no debe tumbar el stage.
            let _ = w.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Some(w) = target().as_mut() {
            let _ = w.flush();
        }
    }
}

/// Último segmento del target (`cnn_core::fsutil` → `fsutil`). Por defecto el
/// target es el módulo emisor; el runner usa el id del stage.
fn origin(record: &Record) -> String {
    let path = record.target();
    path.rsplit("::").next().unwrap_or(path).to_string()
}

fn format_line(record: &Record) -> String {
    format!("[{}: {}: {}]: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            record.level(),
            origin(record),
            record.args())
}

/// Al soltarse hace `teardown()`.
#[must_use = "dropping the guard tears the sink down immediately"]
pub struct SinkGuard {
    _private: (),
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        teardown();
    }
}

fn level_from_env() -> LevelFilter {
    env_var(LOG_LEVEL_ENV).and_then(|v| LevelFilter::from_str(v.trim()).ok())
                          .unwrap_or(LevelFilter::Info)
}

fn install(writer: Target) -> SinkGuard {
    // set_logger sólo tiene efecto la primera vez; después basta con cambiar el destino.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level_from_env());
    let mut guard = target();
    if let Some(mut previous) = guard.replace(writer) {
        let _ = previous.flush();
    }
    SinkGuard { _private: () }
}

/// Abre (o crea) `path` en modo append y lo instala como destino.
pub fn init_file_sink(path: &Path) -> Result<SinkGuard, FlowError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FlowError::from_io(parent, e))?;
    }
    let file = OpenOptions::new().create(true)
                                 .append(true)
                                 .open(path)
                                 .map_err(|e| FlowError::from_io(path, e))?;
    Ok(install(Box::new(file)))
}

/// Instala un `Write` arbitrario como destino.
pub fn init_writer_sink(writer: Box<dyn Write + Send>) -> SinkGuard {
    install(writer)
}

/// Vacía y suelta el destino actual. Los registros posteriores se descartan.
pub fn teardown() {
    if let Some(mut w) = target().take() {
        let _ = w.flush();
    }
}

/// Buffer compartido para capturar el log en tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contenido capturado hasta ahora.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Instala una copia de este sink como destino del proceso.
    pub fn install(&self) -> SinkGuard {
        init_writer_sink(Box::new(self.clone()))
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let mut buf = self.buf.lock().unwrap_or_else(|p| p.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{debug, error, info};

    // El sink es global al proceso: los tests que lo tocan se serializan.
    static SERIAL: Mutex<()> = Mutex::new(());

    #[test]
    fn lines_follow_the_bracketed_format() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let sink = MemorySink::new();
        let _guard = sink.install();
        info!("hello {}", 42);
        error!("boom");
        let out = sink.contents();
        // otros tests del binario pueden loguear en paralelo: buscamos nuestras líneas
        let hello = out.lines().find(|l| l.contains("hello 42")).expect("info line");
        let boom = out.lines().find(|l| l.contains("boom")).expect("error line");
        assert!(hello.starts_with('['));
        assert!(hello.ends_with(": INFO: tests]: hello 42"), "{hello}");
        assert!(boom.ends_with(": ERROR: tests]: boom"), "{boom}");
    }

    #[test]
    fn explicit_target_names_the_origin() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let sink = MemorySink::new();
        let _guard = sink.install();
        info!(target: "get_data", "from a stage");
        let out = sink.contents();
        let line = out.lines().find(|l| l.contains("from a stage")).expect("stage line");
        assert!(line.ends_with(": INFO: get_data]: from a stage"), "{line}");
    }

    #[test]
    fn debug_is_filtered_by_default() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let sink = MemorySink::new();
        let _guard = sink.install();
        debug!("hidden");
        info!("shown");
        let out = sink.contents();
        assert!(!out.contains("hidden"));
        assert!(out.contains("shown"));
    }

    #[test]
    fn teardown_stops_capture() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let sink = MemorySink::new();
        {
            let _guard = sink.install();
            info!("inside");
        }
        info!("outside");
        let out = sink.contents();
        assert!(out.contains("inside"));
        assert!(!out.contains("outside"));
    }

    #[test]
    fn file_sink_appends_across_installs() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs/running_logs.log");
        {
            let _g = init_file_sink(&path).unwrap();
            info!("first");
        }
        {
            let _g = init_file_sink(&path).unwrap();
            info!("second");
        }
        let text = fs::read_to_string(&path).unwrap();
        let first = text.find("first").unwrap();
        let second = text.find("second").unwrap();
        assert!(first < second);
    }
}
