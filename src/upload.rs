//! Upload pipeline: validate → save → hash → dedupe → extract → persist.
//!
//! ```text
//! received ─▶ hashed ─▶ dedupe-checked ─┬─▶ already-exists
//!                                       └─▶ extracting ─▶ extracted ─▶ persisted
//! ```
//!
//! Any prior entry under the hash short-circuits reprocessing, even one left
//! incomplete by an earlier failed upload. Two concurrent uploads of the same
//! bytes can both pass the emptiness check and both write pages; nothing here
//! serializes them.
//!
//! I/O and extraction failures are not recovered: the temp file and any pages
//! already written are left in place, and the error surfaces as
//! [`UploadError::Internal`].

use anyhow::Context;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::extract::extract_pdf_pages;
use crate::hashing::calculate_file_hash;
use crate::storage::{ensure_storage_folder, is_populated, save_pages_to_storage};

/// Result of a successfully processed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub hash: String,
    pub pages: usize,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file part")]
    MissingFile,
    #[error("No selected file")]
    EmptyFilename,
    #[error("Invalid file format")]
    InvalidFormat,
    #[error("File already uploaded")]
    AlreadyUploaded { hash: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl UploadError {
    /// True for problems with the client's input (reported as 400).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Internal(_))
    }
}

/// Returns the lowercased text after the last `.`, if any.
fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// True when `filename` has an extension from the configured allow-list.
pub fn allowed_file(filename: &str, config: &Config) -> bool {
    extension_of(filename).is_some_and(|ext| config.is_allowed_extension(&ext))
}

/// Reduces a client-supplied filename to a safe single path component.
///
/// Path separators are treated as spaces, whitespace runs collapse to `_`,
/// and only ASCII alphanumerics plus `.`, `_` and `-` are kept. Leading and
/// trailing dots/underscores are removed so the result can never be `..`.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Checks the filename before anything touches the disk.
pub fn validate_filename(filename: &str, config: &Config) -> Result<(), UploadError> {
    if filename.is_empty() {
        return Err(UploadError::EmptyFilename);
    }
    if !allowed_file(filename, config) {
        return Err(UploadError::InvalidFormat);
    }
    Ok(())
}

/// Runs the full pipeline for one uploaded file.
pub fn process_upload(
    config: &Config,
    filename: &str,
    bytes: &[u8],
) -> Result<UploadOutcome, UploadError> {
    validate_filename(filename, config)?;

    std::fs::create_dir_all(&config.upload_folder).with_context(|| {
        format!(
            "Failed to create upload folder: {}",
            config.upload_folder.display()
        )
    })?;
    let upload_path = temp_upload_path(&config.upload_folder, filename);
    std::fs::write(&upload_path, bytes)
        .with_context(|| format!("Failed to save upload: {}", upload_path.display()))?;

    process_saved(config, &upload_path)
}

fn temp_upload_path(upload_folder: &Path, filename: &str) -> PathBuf {
    upload_folder.join(format!("{}-{}", Uuid::new_v4(), secure_filename(filename)))
}

/// Hashes, dedupes, extracts and persists a file already saved under the
/// upload folder.
fn process_saved(config: &Config, upload_path: &Path) -> Result<UploadOutcome, UploadError> {
    let hash = calculate_file_hash(upload_path)
        .with_context(|| format!("Failed to hash upload: {}", upload_path.display()))?;

    let storage_path = ensure_storage_folder(&config.storage_folder, &hash)
        .with_context(|| format!("Failed to create storage folder for {}", hash))?;

    if is_populated(&storage_path)
        .with_context(|| format!("Failed to read storage folder: {}", storage_path.display()))?
    {
        std::fs::remove_file(upload_path)
            .with_context(|| format!("Failed to remove upload: {}", upload_path.display()))?;
        tracing::info!(%hash, "duplicate upload rejected");
        return Err(UploadError::AlreadyUploaded { hash });
    }

    let pages = extract_pdf_pages(upload_path)
        .with_context(|| format!("Failed to extract pages from {}", upload_path.display()))?;

    let written = save_pages_to_storage(&pages, &storage_path)
        .with_context(|| format!("Failed to store pages for {}", hash))?;

    tracing::info!(%hash, pages = written, "upload processed");

    Ok(UploadOutcome {
        hash,
        pages: written,
    })
}
