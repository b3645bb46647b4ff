// src/paths.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BootstrapError, Result};

/// Directory layout under the configured root (default `/etc/kubernetes`):
/// `pki/` and `pki/etcd/` hold the long-lived material, `ssl/` and
/// `ssl/etcd/` hold per-certificate request descriptors and raw CSRs and are
/// removed once a run fully succeeds.
#[derive(Debug, Clone)]
pub struct PkiLayout {
    root: PathBuf,
}

impl PkiLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pki_dir(&self) -> PathBuf {
        self.root.join("pki")
    }

    pub fn etcd_dir(&self) -> PathBuf {
        self.root.join("pki").join("etcd")
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join("ssl")
    }

    pub fn workspace_etcd_dir(&self) -> PathBuf {
        self.root.join("ssl").join("etcd")
    }

    pub fn bundle_path(&self, conf_name: &str) -> PathBuf {
        self.root.join(format!("{}.conf", conf_name))
    }

    /// Creates the full tree. Already-existing directories are fine; a
    /// non-directory squatting on any of the paths is not.
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.pki_dir(),
            self.etcd_dir(),
            self.workspace_dir(),
            self.workspace_etcd_dir(),
        ] {
            ensure_dir(&dir)?;
        }
        Ok(())
    }

    /// Drops the ephemeral workspace. Only called after a fully successful
    /// run; a failed run leaves its partial artifacts in place for
    /// inspection.
    pub fn cleanup_workspace(&self) -> Result<()> {
        let workspace = self.workspace_dir();
        if workspace.exists() {
            fs::remove_dir_all(&workspace).map_err(|source| BootstrapError::Path {
                path: workspace.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(BootstrapError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| BootstrapError::Path {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ensure_creates_the_full_tree_and_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let layout = PkiLayout::new(tmp.path().join("kubernetes"));

        layout.ensure().unwrap();
        assert!(layout.pki_dir().is_dir());
        assert!(layout.etcd_dir().is_dir());
        assert!(layout.workspace_etcd_dir().is_dir());

        // Second call over an existing tree must be a no-op.
        layout.ensure().unwrap();
    }

    #[test]
    fn ensure_rejects_a_file_squatting_on_a_directory_path() {
        let tmp = TempDir::new().unwrap();
        let layout = PkiLayout::new(tmp.path().join("kubernetes"));
        fs::create_dir_all(layout.root()).unwrap();
        fs::write(layout.root().join("pki"), b"not a dir").unwrap();

        let err = layout.ensure().unwrap_err();
        assert!(matches!(err, BootstrapError::NotADirectory { .. }));
    }

    #[test]
    fn cleanup_removes_only_the_workspace() {
        let tmp = TempDir::new().unwrap();
        let layout = PkiLayout::new(tmp.path().join("kubernetes"));
        layout.ensure().unwrap();
        fs::write(layout.workspace_dir().join("apiserver.csr"), b"csr").unwrap();
        fs::write(layout.pki_dir().join("ca.crt"), b"cert").unwrap();

        layout.cleanup_workspace().unwrap();
        assert!(!layout.workspace_dir().exists());
        assert!(layout.pki_dir().join("ca.crt").exists());
    }

    #[test]
    fn cleanup_of_a_missing_workspace_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        let layout = PkiLayout::new(tmp.path().join("kubernetes"));
        layout.cleanup_workspace().unwrap();
    }

    #[test]
    fn bundle_paths_land_at_the_root() {
        let layout = PkiLayout::new("/etc/kubernetes");
        assert_eq!(
            layout.bundle_path("admin"),
            PathBuf::from("/etc/kubernetes/admin.conf")
        );
    }
}
