//! Typed request and response shapes for the HTTP API.
//!
//! Every endpoint gets an explicit struct instead of ad-hoc query-string
//! poking; required parameters are `Option` here and checked in the
//! handlers so a missing one becomes a proper `{result:false,error}` body.

use serde::{Deserialize, Serialize};

// --- Query parameters ---

#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameParams {
    pub old_path: Option<String>,
    pub new_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteParams {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderParams {
    #[serde(default)]
    pub path: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadParams {
    pub path: Option<String>,
}

// --- Response bodies ---

/// One entry of a directory listing. `size` is 0 for directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub dir: bool,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub path: String,
    pub result: bool,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameResponse {
    pub result: bool,
    pub old_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub result: bool,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderResponse {
    pub result: bool,
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub result: bool,
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub path: String,
}
