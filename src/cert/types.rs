// cert/types.rs
use std::path::PathBuf;

/// The three root CAs of a cluster bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaRole {
    Kubernetes,
    Etcd,
    FrontProxy,
}

/// Which extendedKeyUsage a leaf certificate carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertKind {
    Server,
    Client,
    Both,
}

impl CertKind {
    pub fn extended_key_usage(&self) -> &'static str {
        match self {
            CertKind::Server => "serverAuth",
            CertKind::Client => "clientAuth",
            CertKind::Both => "serverAuth,clientAuth",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanEntry {
    Dns(String),
    Ip(String),
}

/// Every certificate this tool issues besides the CAs themselves: the seven
/// catalog leaves plus the three access-bundle client identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertRole {
    EtcdServer,
    EtcdPeer,
    EtcdHealthcheckClient,
    ApiserverEtcdClient,
    Apiserver,
    ApiserverKubeletClient,
    FrontProxyClient,
    AdminClient,
    ControllerManagerClient,
    SchedulerClient,
}

impl CertRole {
    /// Base name of the produced `.key`/`.csr`/`.conf`/`.crt` files.
    pub fn file_stem(&self) -> &'static str {
        match self {
            CertRole::EtcdServer => "server",
            CertRole::EtcdPeer => "peer",
            CertRole::EtcdHealthcheckClient => "healthcheck-client",
            CertRole::ApiserverEtcdClient => "apiserver-etcd-client",
            CertRole::Apiserver => "apiserver",
            CertRole::ApiserverKubeletClient => "apiserver-kubelet-client",
            CertRole::FrontProxyClient => "front-proxy-client",
            CertRole::AdminClient => "admin-apiserver-client",
            CertRole::ControllerManagerClient => "controller-manager-apiserver-client",
            CertRole::SchedulerClient => "scheduler-apiserver-client",
        }
    }
}

/// A fully computed signing request: subject, usage kind, SAN list and the
/// CA that must sign it. Derived on demand from the topology; never
/// persisted beyond the run.
#[derive(Debug, Clone)]
pub struct CertificateSpec {
    pub role: CertRole,
    pub common_name: String,
    /// None means the subject template's organization applies.
    pub organization: Option<String>,
    pub kind: CertKind,
    pub alt_names: Vec<SanEntry>,
    pub parent_ca: CaRole,
}

impl CertificateSpec {
    /// Appends a SAN entry unless an identical (type, value) pair is
    /// already present.
    pub fn push_san(&mut self, entry: SanEntry) {
        if !self.alt_names.contains(&entry) {
            self.alt_names.push(entry);
        }
    }

    /// Labels the SAN list for the openssl conf `[alt_names]` section:
    /// `DNS.0..n` and `IP.0..m`, each type numbered contiguously from zero
    /// in list order.
    pub fn san_labels(&self) -> Vec<(String, &str)> {
        let mut dns = 0usize;
        let mut ip = 0usize;
        self.alt_names
            .iter()
            .map(|entry| match entry {
                SanEntry::Dns(value) => {
                    let label = format!("DNS.{}", dns);
                    dns += 1;
                    (label, value.as_str())
                }
                SanEntry::Ip(value) => {
                    let label = format!("IP.{}", ip);
                    ip += 1;
                    (label, value.as_str())
                }
            })
            .collect()
    }
}

/// Material locations recorded after the crypto backend finishes a leaf.
#[derive(Debug, Clone)]
pub struct GeneratedCertificate {
    pub role: CertRole,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}
