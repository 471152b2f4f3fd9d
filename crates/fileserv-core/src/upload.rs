use std::path::Path;

use chrono::Utc;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::resolver::validate_bare_name;

/// Upload acceptance rules: size cap and extension allow-list, checked
/// before anything touches the disk.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn new(max_bytes: u64, allowed_extensions: Vec<String>) -> Self {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| ext.to_lowercase())
            .collect();
        Self {
            max_bytes,
            allowed_extensions,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.max_upload_bytes, config.allowed_extensions.clone())
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate a client-supplied filename: reduce it to its final
    /// component, apply the bare-name rules, and check the extension
    /// against the allow-list. Returns the cleaned name.
    pub fn check_filename<'a>(&self, original: &'a str) -> Result<&'a str, ApiError> {
        // Browsers send bare names, but nothing stops a hand-rolled client
        // from smuggling a path here.
        let bare = original
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(original);
        let name = validate_bare_name(bare)?;

        match extension_of(name) {
            Some(ext) if self.allowed_extensions.iter().any(|a| *a == ext) => Ok(name),
            Some(ext) => Err(ApiError::UnsupportedType(format!(".{ext}"))),
            None => Err(ApiError::UnsupportedType(
                "file has no extension".to_string(),
            )),
        }
    }

    pub fn check_size(&self, size: u64) -> Result<(), ApiError> {
        if size > self.max_bytes {
            return Err(ApiError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Lowercased extension of a filename, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Pick the name to store an upload under. If `name` is free inside `dir`
/// it is used as-is; otherwise a millisecond timestamp goes between the
/// stem and the extension, so existing files are never overwritten.
pub fn stored_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let timestamp = Utc::now().timestamp_millis();
    match ext {
        Some(ext) => format!("{stem}_{timestamp}.{ext}"),
        None => format!("{name}_{timestamp}"),
    }
}
