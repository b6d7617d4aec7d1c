//! Whole-document loading of conversation exports.
//!
//! The export is read fully into memory and decoded in one pass. Plain
//! `conversations.json` files and the `.zip` archives the ChatGPT export
//! page hands out are both accepted; for archives the `conversations.json`
//! entry is located by file name.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::{debug, info, instrument};
use zip::ZipArchive;

use crate::conversation::Conversation;
use crate::error::{BrainError, Result};

const ARCHIVE_ENTRY: &str = "conversations.json";

#[instrument(skip_all)]
pub fn load_conversations(path: impl AsRef<Path>) -> Result<Vec<Conversation>> {
    let path = path.as_ref();
    info!("loading {}", path.display());

    let text = if is_zip(path) {
        read_archive_entry(path)?
    } else {
        read_document(path)?
    };

    let conversations = parse_conversations(&text, path)?;
    info!(count = conversations.len(), "loaded conversations");
    Ok(conversations)
}

/// Decode an in-memory export. `origin` is only used for error messages.
pub fn parse_conversations(text: &str, origin: &Path) -> Result<Vec<Conversation>> {
    if text.trim().is_empty() {
        return Err(BrainError::empty_file(origin));
    }
    serde_json::from_str(text)
        .map_err(|err| BrainError::parse(origin.display().to_string(), err))
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => BrainError::not_found(path),
        _ => BrainError::file(path, err),
    })
}

fn read_document(path: &Path) -> Result<String> {
    let mut file = open_input(path)?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|err| BrainError::file(path, err))?;
    debug!(bytes = text.len(), "read export document");
    Ok(text)
}

fn read_archive_entry(path: &Path) -> Result<String> {
    let file = open_input(path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|err| BrainError::invalid_format(path, format!("unreadable zip archive: {err}")))?;

    for idx in 0..archive.len() {
        let mut entry = archive
            .by_index(idx)
            .map_err(|err| BrainError::invalid_format(path, format!("bad zip entry: {err}")))?;
        if entry.is_dir() {
            continue;
        }
        let matches = Path::new(entry.name())
            .file_name()
            .map(|name| name == ARCHIVE_ENTRY)
            .unwrap_or(false);
        if !matches {
            continue;
        }

        debug!(entry = entry.name(), "reading archive entry");
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|err| BrainError::file(path, err))?;
        return Ok(text);
    }

    Err(BrainError::invalid_format(
        path,
        format!("archive has no {ARCHIVE_ENTRY} entry"),
    ))
}
