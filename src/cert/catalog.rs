// cert/catalog.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SubjectTemplate;
use crate::error::{BootstrapError, Result};
use crate::paths::PkiLayout;
use crate::topology::Topology;
use crate::utils::logging::Logger;

use super::backend::CryptoBackend;
use super::ca::CaHierarchy;
use super::conf::csr_conf;
use super::request;
use super::types::{CertRole, CertificateSpec, GeneratedCertificate};

/// Where a leaf's long-lived `.key`/`.crt` land.
#[derive(Debug, Clone, Copy)]
pub enum OutputDir {
    Pki,
    Etcd,
    /// Bundle identities only exist embedded in their access bundle, so
    /// their material stays in the ephemeral workspace.
    Workspace,
}

/// Where a leaf's ephemeral `.conf`/`.csr` land.
#[derive(Debug, Clone, Copy)]
pub enum WorkspaceDir {
    Root,
    Etcd,
}

pub struct CatalogEntry {
    pub role: CertRole,
    pub output: OutputDir,
    pub workspace: WorkspaceDir,
}

/// The fixed leaf catalog, in generation order. Parent-CA selection lives
/// with the subject rules in the request builder; this table only places
/// the artifacts.
pub const LEAF_CATALOG: [CatalogEntry; 7] = [
    CatalogEntry {
        role: CertRole::EtcdServer,
        output: OutputDir::Etcd,
        workspace: WorkspaceDir::Etcd,
    },
    CatalogEntry {
        role: CertRole::EtcdPeer,
        output: OutputDir::Etcd,
        workspace: WorkspaceDir::Etcd,
    },
    CatalogEntry {
        role: CertRole::EtcdHealthcheckClient,
        output: OutputDir::Etcd,
        workspace: WorkspaceDir::Etcd,
    },
    CatalogEntry {
        role: CertRole::ApiserverEtcdClient,
        output: OutputDir::Pki,
        workspace: WorkspaceDir::Root,
    },
    CatalogEntry {
        role: CertRole::Apiserver,
        output: OutputDir::Pki,
        workspace: WorkspaceDir::Root,
    },
    CatalogEntry {
        role: CertRole::ApiserverKubeletClient,
        output: OutputDir::Pki,
        workspace: WorkspaceDir::Root,
    },
    CatalogEntry {
        role: CertRole::FrontProxyClient,
        output: OutputDir::Pki,
        workspace: WorkspaceDir::Root,
    },
];

impl OutputDir {
    pub fn resolve(&self, layout: &PkiLayout) -> PathBuf {
        match self {
            OutputDir::Pki => layout.pki_dir(),
            OutputDir::Etcd => layout.etcd_dir(),
            OutputDir::Workspace => layout.workspace_dir(),
        }
    }
}

impl WorkspaceDir {
    pub fn resolve(&self, layout: &PkiLayout) -> PathBuf {
        match self {
            WorkspaceDir::Root => layout.workspace_dir(),
            WorkspaceDir::Etcd => layout.workspace_etcd_dir(),
        }
    }
}

/// Generates one leaf: request descriptor into the workspace, then
/// key pair, CSR and CA signature through the backend. The parent CA gate
/// runs first so an out-of-order call fails before any material is written.
pub fn generate_leaf(
    backend: &mut dyn CryptoBackend,
    spec: &CertificateSpec,
    cas: &CaHierarchy,
    subject: &SubjectTemplate,
    validity_days: u32,
    output_dir: &Path,
    workspace_dir: &Path,
    logger: &mut dyn Logger,
) -> Result<GeneratedCertificate> {
    let ca = cas.require(spec.parent_ca)?;
    let stem = spec.role.file_stem();
    logger.log(&format!("Generating certificate {}", stem));

    let conf_path = workspace_dir.join(format!("{}.conf", stem));
    fs::write(&conf_path, csr_conf(spec, subject).render()).map_err(|source| {
        BootstrapError::ConfigWrite {
            path: conf_path.clone(),
            source,
        }
    })?;

    let key_path = output_dir.join(format!("{}.key", stem));
    let csr_path = workspace_dir.join(format!("{}.csr", stem));
    let cert_path = output_dir.join(format!("{}.crt", stem));

    backend.generate_keypair(&key_path, logger)?;
    backend.generate_csr(&key_path, &conf_path, &csr_path, logger)?;
    backend.sign_csr(
        &csr_path,
        &ca.cert_path(),
        &ca.key_path(),
        &conf_path,
        validity_days,
        &cert_path,
        logger,
    )?;

    logger.log(&format!("Certificate {} generated", stem));
    Ok(GeneratedCertificate {
        role: spec.role,
        cert_path,
        key_path,
    })
}

/// Walks the catalog in order, fail-fast: the first error aborts the run
/// with everything already written left in place.
pub fn run_catalog(
    backend: &mut dyn CryptoBackend,
    topology: &Topology,
    cas: &CaHierarchy,
    subject: &SubjectTemplate,
    validity_days: u32,
    layout: &PkiLayout,
    show: bool,
    logger: &mut dyn Logger,
) -> Result<Vec<GeneratedCertificate>> {
    let mut generated = Vec::with_capacity(LEAF_CATALOG.len());
    for entry in &LEAF_CATALOG {
        let spec = request::spec_for(entry.role, topology)?;
        let cert = generate_leaf(
            backend,
            &spec,
            cas,
            subject,
            validity_days,
            &entry.output.resolve(layout),
            &entry.workspace.resolve(layout),
            logger,
        )?;
        if show {
            let text = backend.inspect(&cert.cert_path, logger)?;
            logger.log(&text);
        }
        generated.push(cert);
    }
    Ok(generated)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::path::Path;

    /// Backend double: records the operation order and drops placeholder
    /// files where the real tool would write material.
    pub struct FakeBackend {
        pub ops: Vec<String>,
        pub fail_on: Option<String>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self {
                ops: Vec::new(),
                fail_on: None,
            }
        }

        fn record(&mut self, op: &str, path: &Path) -> Result<()> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if let Some(fail) = &self.fail_on {
                if name.starts_with(fail.as_str()) {
                    return Err(BootstrapError::CryptoBackend {
                        operation: op.to_string(),
                        artifact: name,
                        detail: "injected failure".to_string(),
                    });
                }
            }
            self.ops.push(format!("{} {}", op, name));
            Ok(())
        }
    }

    impl CryptoBackend for FakeBackend {
        fn generate_keypair(&mut self, key_path: &Path, _logger: &mut dyn Logger) -> Result<()> {
            self.record("genkey", key_path)?;
            fs::write(key_path, b"key material").unwrap();
            Ok(())
        }

        fn self_sign(
            &mut self,
            _key_path: &Path,
            subject: &str,
            _validity_days: u32,
            cert_path: &Path,
            _logger: &mut dyn Logger,
        ) -> Result<()> {
            self.record("selfsign", cert_path)?;
            fs::write(cert_path, format!("cert {}", subject)).unwrap();
            Ok(())
        }

        fn generate_csr(
            &mut self,
            _key_path: &Path,
            _conf_path: &Path,
            csr_path: &Path,
            _logger: &mut dyn Logger,
        ) -> Result<()> {
            self.record("csr", csr_path)?;
            fs::write(csr_path, b"csr").unwrap();
            Ok(())
        }

        fn sign_csr(
            &mut self,
            _csr_path: &Path,
            ca_cert: &Path,
            _ca_key: &Path,
            _conf_path: &Path,
            _validity_days: u32,
            cert_path: &Path,
            _logger: &mut dyn Logger,
        ) -> Result<()> {
            assert!(ca_cert.is_file(), "signing requires the CA cert on disk");
            self.record("sign", cert_path)?;
            fs::write(cert_path, b"signed cert").unwrap();
            Ok(())
        }

        fn generate_sa_keypair(
            &mut self,
            key_path: &Path,
            pub_path: &Path,
            _logger: &mut dyn Logger,
        ) -> Result<()> {
            self.record("sakey", key_path)?;
            fs::write(key_path, b"sa key").unwrap();
            fs::write(pub_path, b"sa pub").unwrap();
            Ok(())
        }

        fn inspect(&mut self, cert_path: &Path, _logger: &mut dyn Logger) -> Result<String> {
            self.record("inspect", cert_path)?;
            Ok("Certificate:".to_string())
        }
    }

    pub struct SilentLogger;

    impl Logger for SilentLogger {
        fn log(&mut self, _message: &str) {}
        fn debug_log(&mut self, _message: &str) {}
    }
}
