//! Payload corpus loading.

use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// One message to replay
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// File name or `literal#N`
    pub name: String,
    /// Raw message bytes
    pub data: Bytes,
}

/// Collect payloads from an input path followed by literal arguments.
///
/// A directory contributes each regular file, sorted by name; a file
/// contributes its whole content.
pub fn collect(input: Option<&Path>, literals: &[String]) -> Result<Vec<Payload>> {
    let mut payloads = match input {
        Some(path) => load_path(path)?,
        None => Vec::new(),
    };

    payloads.extend(literals.iter().enumerate().map(|(i, text)| Payload {
        name: format!("literal#{}", i),
        data: Bytes::copy_from_slice(text.as_bytes()),
    }));

    Ok(payloads)
}

fn load_path(path: &Path) -> Result<Vec<Payload>> {
    let meta = std::fs::metadata(path).with_context(|| format!("cannot stat {:?}", path))?;
    if !meta.is_dir() {
        return Ok(vec![load_file(path)?]);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(path).with_context(|| format!("cannot list {:?}", path))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    files.iter().map(|file| load_file(file)).collect()
}

fn load_file(path: &Path) -> Result<Payload> {
    let data = std::fs::read(path).with_context(|| format!("cannot read payload {:?}", path))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Payload {
        name,
        data: Bytes::from(data),
    })
}
