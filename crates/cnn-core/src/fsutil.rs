//! Utilidades de filesystem: aprovisionar directorios y copiar datos crudos.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::errors::FlowError;

/// Crea cada directorio (con padres). Idempotente: si ya existe no falla.
pub fn create_directories<P: AsRef<Path>>(paths: &[P]) -> Result<(), FlowError> {
    for path in paths {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|e| FlowError::from_io(path, e))?;
        info!("created directory at: {}", path.display());
    }
    Ok(())
}

/// Resultado de `copy_files`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Destinos escritos, en orden de copia.
    pub copied: Vec<PathBuf>,
    /// Subdirectorios del origen que no se descendieron.
    pub skipped_dirs: usize,
    pub bytes: u64,
}

/// Copia las entradas inmediatas (archivos) de `source` a `dest`.
///
/// No es recursivo: los subdirectorios se omiten. Un archivo existente con
/// el mismo nombre en `dest` se sobrescribe. El primer fallo aborta toda la
/// operación; lo ya copiado queda en disco.
pub fn copy_files(source: &Path, dest: &Path) -> Result<CopyReport, FlowError> {
    if !source.is_dir() {
        return Err(FlowError::SourceNotFound(source.display().to_string()));
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(source).map_err(|e| FlowError::from_io(source, e))?
                                                        .map(|entry| entry.map(|e| e.path()))
                                                        .collect::<Result<_, _>>()
                                                        .map_err(|e| FlowError::from_io(source, e))?;
    entries.sort();

    let mut report = CopyReport::default();
    let files: Vec<PathBuf> = entries.into_iter()
                                     .filter(|p| {
                                         if p.is_dir() {
                                             debug!("skipping subdirectory {}", p.display());
                                             report.skipped_dirs += 1;
                                             false
                                         } else {
                                             true
                                         }
                                     })
                                     .collect();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::with_template("{msg} [{bar:40.green}] {pos}/{len}").unwrap_or_else(|_| ProgressStyle::default_bar()));
    pb.set_message(format!("copying file from {} to {}", source.display(), dest.display()));

    for src in files {
        // `src` viene de read_dir, siempre tiene file_name
        let Some(name) = src.file_name() else { continue };
        let dst = dest.join(name);
        let bytes = fs::copy(&src, &dst).map_err(|e| {
                                            pb.abandon();
                                            FlowError::CopyError { from: src.display().to_string(),
                                                                   to: dst.display().to_string(),
                                                                   message: e.to_string() }
                                        })?;
        debug!("copied {} ({} bytes)", dst.display(), bytes);
        report.bytes += bytes;
        report.copied.push(dst);
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!("All the files has been copied from {} to {}", source.display(), dest.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_directories_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a/b/c");
        let b = tmp.path().join("d");
        create_directories(&[&a, &b]).unwrap();
        create_directories(&[&a, &b]).unwrap();
        assert!(a.is_dir() && b.is_dir());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 2);
    }

    #[test]
    fn create_directories_fails_when_a_file_is_in_the_way() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("taken");
        fs::write(&blocker, b"x").unwrap();
        let err = create_directories(&[blocker.join("child")]).unwrap_err();
        assert!(matches!(err, FlowError::IoError { .. }));
    }

    #[test]
    fn copy_is_flat_and_byte_exact() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a.jpg"), b"\x00\x01\x02").unwrap();
        fs::write(src.join("b.jpg"), b"bbbb").unwrap();
        fs::write(src.join("nested/c.jpg"), b"deep").unwrap();

        let report = copy_files(&src, &dst).unwrap();

        assert_eq!(report.copied, vec![dst.join("a.jpg"), dst.join("b.jpg")]);
        assert_eq!(report.skipped_dirs, 1);
        assert_eq!(report.bytes, 7);
        assert_eq!(fs::read(dst.join("a.jpg")).unwrap(), b"\x00\x01\x02");
        assert!(!dst.join("nested").exists());
    }

    #[test]
    fn copy_overwrites_existing_destination_file() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        create_directories(&[&src, &dst]).unwrap();
        fs::write(src.join("x.txt"), b"new").unwrap();
        fs::write(dst.join("x.txt"), b"old contents").unwrap();
        copy_files(&src, &dst).unwrap();
        assert_eq!(fs::read(dst.join("x.txt")).unwrap(), b"new");
    }

    #[test]
    fn missing_source_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = copy_files(&tmp.path().join("nope"), tmp.path()).unwrap_err();
        assert!(matches!(err, FlowError::SourceNotFound(_)));
    }

    #[test]
    fn missing_destination_aborts_with_copy_error() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("x.txt"), b"1").unwrap();
        let err = copy_files(&src, &tmp.path().join("not-provisioned")).unwrap_err();
        assert!(matches!(err, FlowError::CopyError { .. }));
    }
}
