use std::fs;

use tracing::{info, warn};

use crate::api::{
    DeleteResponse, DirectoryListing, FileEntry, FolderResponse, RenameResponse, UploadResponse,
};
use crate::error::ApiError;
use crate::resolver::{validate_bare_name, PathResolver};
use crate::upload::{self, UploadPolicy};

/// The filesystem subtree exposed to clients. Every operation resolves
/// its client path first, then runs one short syscall sequence; the
/// filesystem itself is the source of truth.
pub struct FileVault {
    resolver: PathResolver,
}

impl FileVault {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// List the immediate children of a directory.
    ///
    /// Entries that fail to stat are skipped with a warning rather than
    /// failing the whole listing. Order is directories first, then
    /// case-insensitive name ascending.
    pub fn list(&self, raw_path: &str) -> Result<DirectoryListing, ApiError> {
        let dir = self.resolver.resolve(raw_path)?;
        if !dir.absolute().is_dir() {
            return Err(ApiError::NotAFolder(dir.relative().to_string()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir.absolute())? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping dir entry: {}", e);
                    continue;
                }
            };

            match entry.metadata() {
                Ok(meta) => {
                    let is_dir = meta.is_dir();
                    files.push(FileEntry {
                        name: entry.file_name().to_string_lossy().to_string(),
                        dir: is_dir,
                        size: if is_dir { 0 } else { meta.len() },
                    });
                }
                Err(e) => {
                    warn!("skipping {}: {}", entry.path().display(), e);
                }
            }
        }

        files.sort_by(|a, b| {
            b.dir
                .cmp(&a.dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        Ok(DirectoryListing {
            path: dir.relative().to_string(),
            result: true,
            files,
        })
    }

    /// Rename an entry in place: same parent directory, new bare name.
    pub fn rename(&self, old_raw: &str, new_name: &str) -> Result<RenameResponse, ApiError> {
        let name = validate_bare_name(new_name)?;
        let old = self.resolver.resolve(old_raw)?;
        if old.relative().is_empty() {
            return Err(ApiError::InvalidPath(
                "the root folder cannot be renamed".to_string(),
            ));
        }
        if !old.absolute().exists() {
            return Err(ApiError::NotFound(old.relative().to_string()));
        }

        let parent = old
            .absolute()
            .parent()
            .ok_or_else(|| ApiError::InvalidPath(old.relative().to_string()))?;
        let dest = parent.join(name);
        if dest.exists() {
            let dest_rel = join_relative(old.parent_relative(), name);
            return Err(ApiError::AlreadyExists(dest_rel));
        }

        fs::rename(old.absolute(), &dest)?;

        let new_path = join_relative(old.parent_relative(), name);
        info!("renamed {} -> {}", old.relative(), new_path);

        Ok(RenameResponse {
            result: true,
            old_path: old.relative().to_string(),
            new_path,
        })
    }

    /// Delete a file or recursively delete a directory.
    pub fn delete(&self, raw_path: &str) -> Result<DeleteResponse, ApiError> {
        let target = self.resolver.resolve(raw_path)?;
        if target.relative().is_empty() {
            return Err(ApiError::InvalidPath(
                "the root folder cannot be deleted".to_string(),
            ));
        }
        if !target.absolute().exists() {
            return Err(ApiError::NotFound(target.relative().to_string()));
        }

        if target.absolute().is_dir() {
            fs::remove_dir_all(target.absolute())?;
        } else {
            fs::remove_file(target.absolute())?;
        }
        info!("deleted {}", target.relative());

        Ok(DeleteResponse {
            result: true,
            path: target.relative().to_string(),
        })
    }

    /// Create a folder under a parent path, including any missing
    /// intermediate directories.
    pub fn create_folder(
        &self,
        parent_raw: &str,
        name: &str,
    ) -> Result<FolderResponse, ApiError> {
        let parent = self.resolver.resolve(parent_raw)?;
        let dest = self.resolver.resolve_child(&parent, name)?;
        if dest.absolute().exists() {
            return Err(ApiError::AlreadyExists(dest.relative().to_string()));
        }

        fs::create_dir_all(dest.absolute())?;
        info!("created folder {}", dest.relative());

        Ok(FolderResponse {
            result: true,
            path: parent.relative().to_string(),
            name: dest
                .file_name()
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Read a file whole for download. Streaming is deliberately not a
    /// concern here; downloads are whole-file like uploads are whole-part.
    pub fn read_file(&self, raw_path: &str) -> Result<(String, Vec<u8>), ApiError> {
        let file = self.resolver.resolve(raw_path)?;
        if !file.absolute().is_file() {
            return Err(ApiError::NotFound(file.relative().to_string()));
        }

        let data = fs::read(file.absolute())?;
        let name = file
            .file_name()
            .unwrap_or("download")
            .to_string();
        info!("download {} ({} bytes)", file.relative(), data.len());
        Ok((name, data))
    }

    /// Store an uploaded file inside an existing directory, applying the
    /// upload policy and the no-overwrite collision rule.
    pub fn save_upload(
        &self,
        dir_raw: &str,
        original_name: &str,
        data: &[u8],
        policy: &UploadPolicy,
    ) -> Result<UploadResponse, ApiError> {
        let dir = self.resolver.resolve(dir_raw)?;
        if !dir.absolute().is_dir() {
            return Err(ApiError::NotAFolder(dir.relative().to_string()));
        }

        let original = policy.check_filename(original_name)?;
        policy.check_size(data.len() as u64)?;

        let filename = upload::stored_name(dir.absolute(), original);
        fs::write(dir.absolute().join(&filename), data)?;
        info!(
            "upload {} -> {}/{} ({} bytes)",
            original,
            dir.relative(),
            filename,
            data.len()
        );

        Ok(UploadResponse {
            result: true,
            filename,
            original_name: original.to_string(),
            size: data.len() as u64,
            path: dir.relative().to_string(),
        })
    }
}

fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault() -> (TempDir, FileVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = FileVault::new(PathResolver::new(dir.path().to_path_buf()));
        (dir, vault)
    }

    fn policy() -> UploadPolicy {
        UploadPolicy::new(
            1024,
            vec!["txt".to_string(), "pdf".to_string()],
        )
    }

    #[test]
    fn test_list_empty_directory() {
        let (dir, vault) = vault();
        fs::create_dir(dir.path().join("docs")).unwrap();

        let listing = vault.list("docs").unwrap();
        assert!(listing.result);
        assert_eq!(listing.path, "docs");
        assert!(listing.files.is_empty());
    }

    #[test]
    fn test_list_sorts_dirs_first_then_name() {
        let (dir, vault) = vault();
        fs::write(dir.path().join("zeta.txt"), b"z").unwrap();
        fs::write(dir.path().join("Alpha.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();

        let listing = vault.list("").unwrap();
        let names: Vec<&str> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["beta", "Alpha.txt", "zeta.txt"]);
    }

    #[test]
    fn test_list_sizes() {
        let (dir, vault) = vault();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let listing = vault.list("").unwrap();
        let by_name = |name: &str| listing.files.iter().find(|f| f.name == name).unwrap();
        assert_eq!(by_name("a.txt").size, 5);
        assert!(!by_name("a.txt").dir);
        assert_eq!(by_name("sub").size, 0);
        assert!(by_name("sub").dir);
    }

    #[test]
    fn test_list_missing_directory_is_not_found() {
        let (_dir, vault) = vault();
        let err = vault.list("nope").unwrap_err();
        assert!(matches!(err, ApiError::NotAFolder(_)));
    }

    #[test]
    fn test_list_file_is_not_a_folder() {
        let (dir, vault) = vault();
        fs::write(dir.path().join("a.txt"), b"x").unwrap();
        assert!(matches!(
            vault.list("a.txt").unwrap_err(),
            ApiError::NotAFolder(_)
        ));
    }

    #[test]
    fn test_rename_file() {
        let (dir, vault) = vault();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/a.txt"), b"x").unwrap();

        let resp = vault.rename("docs/a.txt", "b.txt").unwrap();
        assert!(resp.result);
        assert_eq!(resp.old_path, "docs/a.txt");
        assert_eq!(resp.new_path, "docs/b.txt");
        assert!(dir.path().join("docs/b.txt").exists());
        assert!(!dir.path().join("docs/a.txt").exists());
    }

    #[test]
    fn test_rename_missing_source_is_not_found() {
        let (_dir, vault) = vault();
        assert!(matches!(
            vault.rename("ghost.txt", "real.txt").unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_rename_existing_destination_conflicts() {
        let (dir, vault) = vault();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();

        assert!(matches!(
            vault.rename("a.txt", "b.txt").unwrap_err(),
            ApiError::AlreadyExists(_)
        ));
        // Loser keeps its contents.
        assert_eq!(fs::read(dir.path().join("b.txt")).unwrap(), b"b");
    }

    #[test]
    fn test_rename_rejects_bad_names() {
        let (dir, vault) = vault();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        assert!(vault.rename("a.txt", "x/y").is_err());
        assert!(vault.rename("a.txt", r"x\y").is_err());
        assert!(vault.rename("a.txt", "   ").is_err());
        assert!(vault.rename("a.txt", "..").is_err());
    }

    #[test]
    fn test_rename_root_rejected() {
        let (_dir, vault) = vault();
        assert!(vault.rename("", "newroot").is_err());
    }

    #[test]
    fn test_delete_file() {
        let (dir, vault) = vault();
        fs::write(dir.path().join("a.txt"), b"x").unwrap();

        let resp = vault.delete("a.txt").unwrap();
        assert!(resp.result);
        assert_eq!(resp.path, "a.txt");
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_delete_directory_recursively() {
        let (dir, vault) = vault();
        fs::create_dir_all(dir.path().join("docs/sub")).unwrap();
        fs::write(dir.path().join("docs/sub/deep.txt"), b"x").unwrap();

        vault.delete("docs").unwrap();
        assert!(!dir.path().join("docs").exists());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_dir, vault) = vault();
        assert!(matches!(
            vault.delete("ghost").unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_delete_root_rejected() {
        let (dir, vault) = vault();
        assert!(vault.delete("").is_err());
        assert!(vault.delete("/").is_err());
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_folder_at_root() {
        let (dir, vault) = vault();
        let resp = vault.create_folder("", "reports").unwrap();
        assert!(resp.result);
        assert_eq!(resp.path, "");
        assert_eq!(resp.name, "reports");
        assert!(dir.path().join("reports").is_dir());
    }

    #[test]
    fn test_create_folder_creates_intermediates() {
        let (dir, vault) = vault();
        vault.create_folder("a/b", "c").unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[test]
    fn test_create_folder_existing_conflicts() {
        let (dir, vault) = vault();
        fs::create_dir(dir.path().join("docs")).unwrap();
        assert!(matches!(
            vault.create_folder("", "docs").unwrap_err(),
            ApiError::AlreadyExists(_)
        ));
        // A file with that name collides too.
        fs::write(dir.path().join("report.txt"), b"x").unwrap();
        assert!(vault.create_folder("", "report.txt").is_err());
    }

    #[test]
    fn test_create_folder_rejects_bad_names() {
        let (_dir, vault) = vault();
        assert!(vault.create_folder("", "a/b").is_err());
        assert!(vault.create_folder("", "").is_err());
    }

    #[test]
    fn test_read_file() {
        let (dir, vault) = vault();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let (name, data) = vault.read_file("a.txt").unwrap();
        assert_eq!(name, "a.txt");
        assert_eq!(data, b"hello");
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let (_dir, vault) = vault();
        assert!(matches!(
            vault.read_file("ghost.txt").unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_read_directory_is_not_found() {
        let (dir, vault) = vault();
        fs::create_dir(dir.path().join("docs")).unwrap();
        assert!(matches!(
            vault.read_file("docs").unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_save_upload() {
        let (dir, vault) = vault();
        let resp = vault
            .save_upload("", "notes.txt", b"hi there", &policy())
            .unwrap();
        assert!(resp.result);
        assert_eq!(resp.filename, "notes.txt");
        assert_eq!(resp.original_name, "notes.txt");
        assert_eq!(resp.size, 8);
        assert_eq!(
            fs::read(dir.path().join("notes.txt")).unwrap(),
            b"hi there"
        );
    }

    #[test]
    fn test_save_upload_disallowed_type_writes_nothing() {
        let (dir, vault) = vault();
        assert!(matches!(
            vault
                .save_upload("", "payload.exe", b"MZ", &policy())
                .unwrap_err(),
            ApiError::UnsupportedType(_)
        ));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_save_upload_too_large_writes_nothing() {
        let (dir, vault) = vault();
        let big = vec![0u8; 2048];
        assert!(matches!(
            vault.save_upload("", "big.txt", &big, &policy()).unwrap_err(),
            ApiError::TooLarge { .. }
        ));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_save_upload_collision_gets_suffix() {
        let (dir, vault) = vault();
        fs::write(dir.path().join("report.pdf"), b"old").unwrap();

        let resp = vault
            .save_upload("", "report.pdf", b"new", &policy())
            .unwrap();
        assert_ne!(resp.filename, "report.pdf");
        assert!(resp.filename.starts_with("report_"));
        assert!(resp.filename.ends_with(".pdf"));
        // Original is untouched, the new copy landed beside it.
        assert_eq!(fs::read(dir.path().join("report.pdf")).unwrap(), b"old");
        assert_eq!(
            fs::read(dir.path().join(&resp.filename)).unwrap(),
            b"new"
        );
    }

    #[test]
    fn test_save_upload_missing_directory_is_not_found() {
        let (_dir, vault) = vault();
        assert!(matches!(
            vault
                .save_upload("ghost", "a.txt", b"x", &policy())
                .unwrap_err(),
            ApiError::NotAFolder(_)
        ));
    }

    #[test]
    fn test_operations_confined_to_root() {
        let (_dir, vault) = vault();
        assert!(vault.list("../..").is_err());
        assert!(vault.delete("../x").is_err());
        assert!(vault.read_file("../../etc/passwd").is_err());
        assert!(vault.create_folder("..", "evil").is_err());
        assert!(vault
            .save_upload("..", "a.txt", b"x", &policy())
            .is_err());
    }
}
