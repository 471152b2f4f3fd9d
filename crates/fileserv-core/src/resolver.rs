use std::path::{Component, Path, PathBuf};

use crate::error::ApiError;

/// A client-supplied path resolved against the shared root.
///
/// Carries both forms of the same location: the normalized relative path
/// (forward-slash joined, empty string for the root itself) that goes back
/// over the wire, and the confined absolute path used for syscalls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    rel: String,
    abs: PathBuf,
}

impl ResolvedPath {
    /// Normalized path relative to the root ("" means the root).
    pub fn relative(&self) -> &str {
        &self.rel
    }

    /// Confined absolute filesystem path.
    pub fn absolute(&self) -> &Path {
        &self.abs
    }

    /// Final component of the path, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.rel.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Relative path of the containing directory ("" for entries at the root).
    pub fn parent_relative(&self) -> &str {
        match self.rel.rfind('/') {
            Some(idx) => &self.rel[..idx],
            None => "",
        }
    }
}

/// Maps client paths into a fixed root directory and refuses escapes.
///
/// Inputs are treated as relative paths; leading slashes are tolerated and
/// stripped. `..` segments, absolute paths, and path prefixes are rejected
/// outright rather than clamped, so a crafted path can never name anything
/// outside the root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw client path to a confined location under the root.
    ///
    /// The empty string (and bare "/") resolve to the root itself.
    pub fn resolve(&self, raw: &str) -> Result<ResolvedPath, ApiError> {
        let trimmed = raw.trim_start_matches('/');

        let mut parts: Vec<&str> = Vec::new();
        for component in Path::new(trimmed).components() {
            match component {
                Component::CurDir => continue,
                Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                    return Err(ApiError::InvalidPath(raw.to_string()));
                }
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| ApiError::InvalidPath(raw.to_string()))?;
                    parts.push(part);
                }
            }
        }

        let rel = parts.join("/");
        let abs = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&rel)
        };

        // Normalization above is what guarantees confinement; this check is
        // the contract itself, kept explicit so it can never rot silently.
        if !abs.starts_with(&self.root) {
            return Err(ApiError::InvalidPath(raw.to_string()));
        }

        Ok(ResolvedPath { rel, abs })
    }

    /// Resolve a bare name inside an already-resolved directory.
    pub fn resolve_child(
        &self,
        parent: &ResolvedPath,
        name: &str,
    ) -> Result<ResolvedPath, ApiError> {
        let name = validate_bare_name(name)?;
        let rel = if parent.rel.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent.rel, name)
        };
        let abs = parent.abs.join(name);
        Ok(ResolvedPath { rel, abs })
    }
}

/// Validate a bare file or folder name (rename targets, new folders,
/// upload filenames).
///
/// Surrounding whitespace is trimmed off; the trimmed name is returned.
pub fn validate_bare_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidName("name must not be empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ApiError::InvalidName(
            r"name must not contain '/' or '\'".to_string(),
        ));
    }
    if name == "." || name == ".." {
        return Err(ApiError::InvalidName(format!(
            "'{name}' is not a valid name"
        )));
    }
    Ok(name)
}
