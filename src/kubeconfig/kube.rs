// src/kubeconfig/kube.rs
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::cert::{CertRole, CertificateAuthority, GeneratedCertificate};
use crate::error::{BootstrapError, Result};
use crate::utils::logging::Logger;

/// The three administrative identities that receive an access bundle, in
/// emission order. Subject rules for their client certificates live in the
/// request builder; this table only names the output files.
pub struct BundleIdentity {
    pub role: CertRole,
    pub conf_name: &'static str,
}

pub const BUNDLE_IDENTITIES: [BundleIdentity; 3] = [
    BundleIdentity {
        role: CertRole::AdminClient,
        conf_name: "admin",
    },
    BundleIdentity {
        role: CertRole::ControllerManagerClient,
        conf_name: "controller-manager",
    },
    BundleIdentity {
        role: CertRole::SchedulerClient,
        conf_name: "scheduler",
    },
];

// Field names and nesting must match what kubectl parses; every rename is
// load-bearing.
#[derive(Serialize)]
struct KubeConfigDoc {
    #[serde(rename = "apiVersion")]
    api_version: String,
    clusters: Vec<NamedCluster>,
    contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    current_context: String,
    kind: String,
    preferences: Preferences,
    users: Vec<NamedUser>,
}

#[derive(Serialize)]
struct NamedCluster {
    cluster: Cluster,
    name: String,
}

#[derive(Serialize)]
struct Cluster {
    #[serde(rename = "certificate-authority-data")]
    certificate_authority_data: String,
    server: String,
}

#[derive(Serialize)]
struct NamedContext {
    context: Context,
    name: String,
}

#[derive(Serialize)]
struct Context {
    cluster: String,
    user: String,
}

#[derive(Serialize)]
struct Preferences {}

#[derive(Serialize)]
struct NamedUser {
    name: String,
    user: User,
}

#[derive(Serialize)]
struct User {
    #[serde(rename = "client-certificate-data")]
    client_certificate_data: String,
    #[serde(rename = "client-key-data")]
    client_key_data: String,
}

/// A written access bundle.
#[derive(Debug, Clone)]
pub struct AccessBundle {
    pub identity: String,
    pub path: PathBuf,
}

/// Renders kubeconfig bundles for the administrative identities: cluster
/// endpoint plus embedded, base64-encoded CA/client material.
pub struct BundleBuilder<'a> {
    api_server: String,
    root_ca: &'a CertificateAuthority,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(internal_advertise_ip: &str, root_ca: &'a CertificateAuthority) -> Self {
        Self {
            api_server: format!("https://{}:6443", internal_advertise_ip),
            root_ca,
        }
    }

    /// Reads the referenced material and writes the bundle. A missing
    /// artifact means the pipeline was driven out of order and is an error,
    /// never an empty field.
    pub fn build(
        &self,
        common_name: &str,
        generated: &GeneratedCertificate,
        out_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<AccessBundle> {
        logger.debug_log(&format!(
            "Assembling access bundle {} for {}",
            out_path.display(),
            common_name
        ));

        let ca_data = encode_file(&self.root_ca.cert_path(), || {
            BootstrapError::MissingCa(self.root_ca.common_name.to_string())
        })?;
        let cert_data = encode_file(&generated.cert_path, || {
            BootstrapError::MissingCertificate(generated.role.file_stem().to_string())
        })?;
        let key_data = encode_file(&generated.key_path, || {
            BootstrapError::MissingCertificate(generated.role.file_stem().to_string())
        })?;

        let doc = KubeConfigDoc {
            api_version: "v1".to_string(),
            clusters: vec![NamedCluster {
                cluster: Cluster {
                    certificate_authority_data: ca_data,
                    server: self.api_server.clone(),
                },
                name: "kubernetes".to_string(),
            }],
            contexts: vec![NamedContext {
                context: Context {
                    cluster: "kubernetes".to_string(),
                    user: common_name.to_string(),
                },
                name: format!("{}@kubernetes", common_name),
            }],
            current_context: format!("{}@kubernetes", common_name),
            kind: "Config".to_string(),
            preferences: Preferences {},
            users: vec![NamedUser {
                name: common_name.to_string(),
                user: User {
                    client_certificate_data: cert_data,
                    client_key_data: key_data,
                },
            }],
        };

        let yaml = serde_yaml::to_string(&doc).map_err(|e| BootstrapError::ConfigWrite {
            path: out_path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        fs::write(out_path, yaml).map_err(|source| BootstrapError::ConfigWrite {
            path: out_path.to_path_buf(),
            source,
        })?;

        logger.log(&format!("Access bundle {} written", out_path.display()));
        Ok(AccessBundle {
            identity: common_name.to_string(),
            path: out_path.to_path_buf(),
        })
    }
}

fn encode_file(path: &Path, missing: impl FnOnce() -> BootstrapError) -> Result<String> {
    if !path.is_file() {
        return Err(missing());
    }
    let bytes = fs::read(path).map_err(|source| BootstrapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::testing::SilentLogger;
    use crate::cert::{CaHierarchy, CaRole};
    use crate::paths::PkiLayout;
    use tempfile::TempDir;

    struct Fixture {
        layout: PkiLayout,
        generated: GeneratedCertificate,
        _tmp: TempDir,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let layout = PkiLayout::new(tmp.path().join("kubernetes"));
        layout.ensure().unwrap();
        fs::write(layout.pki_dir().join("ca.crt"), b"root ca bytes").unwrap();
        fs::write(layout.pki_dir().join("ca.key"), b"root ca key").unwrap();

        let cert_path = layout.workspace_dir().join("admin-apiserver-client.crt");
        let key_path = layout.workspace_dir().join("admin-apiserver-client.key");
        fs::write(&cert_path, b"client cert bytes").unwrap();
        fs::write(&key_path, b"client key bytes").unwrap();

        Fixture {
            layout,
            generated: GeneratedCertificate {
                role: CertRole::AdminClient,
                cert_path,
                key_path,
            },
            _tmp: tmp,
        }
    }

    #[test]
    fn bundle_embeds_material_that_decodes_back_byte_identical() {
        let fx = fixture();
        let cas = CaHierarchy::new(&fx.layout);
        let root_ca = cas.require(CaRole::Kubernetes).unwrap();

        let builder = BundleBuilder::new("10.0.0.1", root_ca);
        let bundle = builder
            .build(
                "kubernetes-admin",
                &fx.generated,
                &fx.layout.bundle_path("admin"),
                &mut SilentLogger,
            )
            .unwrap();

        let yaml = fs::read_to_string(&bundle.path).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        let ca_data = doc["clusters"][0]["cluster"]["certificate-authority-data"]
            .as_str()
            .unwrap();
        let cert_data = doc["users"][0]["user"]["client-certificate-data"]
            .as_str()
            .unwrap();
        let key_data = doc["users"][0]["user"]["client-key-data"].as_str().unwrap();

        let decode = |s: &str| general_purpose::STANDARD.decode(s).unwrap();
        assert_eq!(decode(ca_data), b"root ca bytes");
        assert_eq!(decode(cert_data), b"client cert bytes");
        assert_eq!(decode(key_data), b"client key bytes");
    }

    #[test]
    fn bundle_schema_matches_kubectl_expectations() {
        let fx = fixture();
        let cas = CaHierarchy::new(&fx.layout);
        let root_ca = cas.require(CaRole::Kubernetes).unwrap();

        BundleBuilder::new("10.0.0.1", root_ca)
            .build(
                "kubernetes-admin",
                &fx.generated,
                &fx.layout.bundle_path("admin"),
                &mut SilentLogger,
            )
            .unwrap();

        let yaml = fs::read_to_string(fx.layout.bundle_path("admin")).unwrap();
        assert!(yaml.contains("apiVersion: v1"));
        assert!(yaml.contains("kind: Config"));
        assert!(yaml.contains("server: https://10.0.0.1:6443"));
        assert!(yaml.contains("name: kubernetes"));
        assert!(yaml.contains("current-context: kubernetes-admin@kubernetes"));
        assert!(yaml.contains("user: kubernetes-admin"));
        assert!(yaml.contains("preferences: {}"));
    }

    #[test]
    fn missing_client_certificate_is_an_error_not_an_empty_field() {
        let fx = fixture();
        let cas = CaHierarchy::new(&fx.layout);
        let root_ca = cas.require(CaRole::Kubernetes).unwrap();
        fs::remove_file(&fx.generated.cert_path).unwrap();

        let err = BundleBuilder::new("10.0.0.1", root_ca)
            .build(
                "kubernetes-admin",
                &fx.generated,
                &fx.layout.bundle_path("admin"),
                &mut SilentLogger,
            )
            .unwrap_err();

        assert!(matches!(err, BootstrapError::MissingCertificate(_)));
        assert!(!fx.layout.bundle_path("admin").exists());
    }

    #[test]
    fn missing_root_ca_fails_at_require_time() {
        let fx = fixture();
        fs::remove_file(fx.layout.pki_dir().join("ca.crt")).unwrap();
        let cas = CaHierarchy::new(&fx.layout);
        assert!(matches!(
            cas.require(CaRole::Kubernetes),
            Err(BootstrapError::MissingCa(_))
        ));
    }
}
