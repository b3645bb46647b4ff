// cert/ca.rs
use std::path::PathBuf;

use crate::error::{BootstrapError, Result};
use crate::paths::{ensure_dir, PkiLayout};
use crate::utils::logging::Logger;

use super::backend::CryptoBackend;
use super::types::CaRole;

/// One root CA: its on-disk location and self-signed subject. Created once
/// at the start of a run, never mutated, referenced by every leaf it signs.
#[derive(Debug, Clone)]
pub struct CertificateAuthority {
    pub role: CaRole,
    pub file_stem: &'static str,
    pub common_name: &'static str,
    dir: PathBuf,
}

impl CertificateAuthority {
    pub fn cert_path(&self) -> PathBuf {
        self.dir.join(format!("{}.crt", self.file_stem))
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(format!("{}.key", self.file_stem))
    }

    pub fn subject(&self) -> String {
        format!("/CN={}", self.common_name)
    }

    fn exists(&self) -> bool {
        self.cert_path().is_file() && self.key_path().is_file()
    }
}

/// The fixed three-CA hierarchy. The roots have no inter-dependency but all
/// of them must exist before any leaf generation starts; `require` is the
/// gate every signing operation passes through.
pub struct CaHierarchy {
    cas: Vec<CertificateAuthority>,
}

impl CaHierarchy {
    pub fn new(layout: &PkiLayout) -> Self {
        let cas = vec![
            CertificateAuthority {
                role: CaRole::Kubernetes,
                file_stem: "ca",
                common_name: "kubernetes-ca",
                dir: layout.pki_dir(),
            },
            CertificateAuthority {
                role: CaRole::Etcd,
                file_stem: "ca",
                common_name: "etcd-ca",
                dir: layout.etcd_dir(),
            },
            CertificateAuthority {
                role: CaRole::FrontProxy,
                file_stem: "front-proxy-ca",
                common_name: "kubernetes-front-proxy-ca",
                dir: layout.pki_dir(),
            },
        ];
        Self { cas }
    }

    pub fn create_roots(
        &self,
        backend: &mut dyn CryptoBackend,
        validity_days: u32,
        logger: &mut dyn Logger,
    ) -> Result<()> {
        for ca in &self.cas {
            logger.log(&format!("Generating CA certificate {}", ca.common_name));
            ensure_dir(&ca.dir)?;
            backend.generate_keypair(&ca.key_path(), logger)?;
            backend.self_sign(
                &ca.key_path(),
                &ca.subject(),
                validity_days,
                &ca.cert_path(),
                logger,
            )?;
            logger.log(&format!("CA certificate {} generated", ca.common_name));
        }
        Ok(())
    }

    pub fn roots(&self) -> &[CertificateAuthority] {
        &self.cas
    }

    /// Hands out a CA only once its material is actually on disk.
    pub fn require(&self, role: CaRole) -> Result<&CertificateAuthority> {
        let ca = self
            .cas
            .iter()
            .find(|ca| ca.role == role)
            .expect("all three CA roles are declared");
        if !ca.exists() {
            return Err(BootstrapError::MissingCa(ca.common_name.to_string()));
        }
        Ok(ca)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ca_locations_follow_the_pki_layout() {
        let layout = PkiLayout::new("/etc/kubernetes");
        let cas = CaHierarchy::new(&layout);

        let k8s = cas.cas.iter().find(|c| c.role == CaRole::Kubernetes).unwrap();
        assert_eq!(k8s.cert_path(), PathBuf::from("/etc/kubernetes/pki/ca.crt"));
        assert_eq!(k8s.subject(), "/CN=kubernetes-ca");

        let etcd = cas.cas.iter().find(|c| c.role == CaRole::Etcd).unwrap();
        assert_eq!(
            etcd.key_path(),
            PathBuf::from("/etc/kubernetes/pki/etcd/ca.key")
        );
        assert_eq!(etcd.subject(), "/CN=etcd-ca");

        let proxy = cas.cas.iter().find(|c| c.role == CaRole::FrontProxy).unwrap();
        assert_eq!(
            proxy.cert_path(),
            PathBuf::from("/etc/kubernetes/pki/front-proxy-ca.crt")
        );
        assert_eq!(proxy.subject(), "/CN=kubernetes-front-proxy-ca");
    }

    #[test]
    fn require_fails_until_material_is_on_disk() {
        let tmp = TempDir::new().unwrap();
        let layout = PkiLayout::new(tmp.path());
        layout.ensure().unwrap();
        let cas = CaHierarchy::new(&layout);

        let err = cas.require(CaRole::Etcd).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingCa(name) if name == "etcd-ca"));

        fs::write(layout.etcd_dir().join("ca.crt"), b"cert").unwrap();
        fs::write(layout.etcd_dir().join("ca.key"), b"key").unwrap();
        assert!(cas.require(CaRole::Etcd).is_ok());
    }

    #[test]
    fn require_needs_both_halves_of_the_material() {
        let tmp = TempDir::new().unwrap();
        let layout = PkiLayout::new(tmp.path());
        layout.ensure().unwrap();
        let cas = CaHierarchy::new(&layout);

        fs::write(layout.pki_dir().join("ca.crt"), b"cert").unwrap();
        assert!(cas.require(CaRole::Kubernetes).is_err());
    }
}
