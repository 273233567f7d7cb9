use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::info;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::PomsmithError;

const EXECUTABLE_MODE: u32 = 0o755;
const REGULAR_MODE: u32 = 0o644;

/// Packs every regular file below `dir` into an in-memory ZIP archive.
/// Entries are named by their `/`-separated path relative to `dir` and appear
/// in sorted order.
pub fn pack_directory(dir: &Path) -> Result<Vec<u8>, PomsmithError> {
    if !dir.is_dir() {
        return Err(PomsmithError::Archive(format!(
            "project directory {} does not exist",
            dir.display()
        )));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| PomsmithError::Archive(err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|err| PomsmithError::Archive(err.to_string()))?;
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let bytes = fs::read(entry.path())?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(file_mode(entry.path())?);
        writer
            .start_file(name.as_str(), options)
            .map_err(|err| PomsmithError::Archive(err.to_string()).context(&name))?;
        writer.write_all(&bytes)?;
    }

    let archive = writer
        .finish()
        .map_err(|err| PomsmithError::Archive(err.to_string()))?
        .into_inner();
    info!(dir = %dir.display(), bytes = archive.len(), "created project archive");
    Ok(archive)
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Result<u32, PomsmithError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode();
    Ok(if mode & 0o111 != 0 {
        EXECUTABLE_MODE
    } else {
        REGULAR_MODE
    })
}

#[cfg(not(unix))]
fn file_mode(path: &Path) -> Result<u32, PomsmithError> {
    let executable = path
        .file_name()
        .is_some_and(|name| name == "mvnw" || name == "mvnw.cmd");
    Ok(if executable {
        EXECUTABLE_MODE
    } else {
        REGULAR_MODE
    })
}
