// cert/request.rs
use std::net::Ipv4Addr;

use crate::error::{BootstrapError, Result};
use crate::topology::Topology;

use super::types::{CaRole, CertKind, CertRole, CertificateSpec, SanEntry};

/// Maps a certificate role and the collected topology to a complete signing
/// request. Deterministic and side-effect free; every subject/SAN rule of
/// the catalog lives here.
pub fn spec_for(role: CertRole, topology: &Topology) -> Result<CertificateSpec> {
    let spec = match role {
        CertRole::EtcdServer => etcd_spec(role, "kube-etcd", topology),
        CertRole::EtcdPeer => etcd_spec(role, "kube-etcd-peer", topology),
        CertRole::EtcdHealthcheckClient => client_spec(
            role,
            "kube-etcd-healthcheck-client",
            None,
            CaRole::Etcd,
        ),
        CertRole::ApiserverEtcdClient => client_spec(
            role,
            "kube-apiserver-etcd-client",
            Some("system:masters"),
            CaRole::Etcd,
        ),
        CertRole::Apiserver => apiserver_spec(topology)?,
        CertRole::ApiserverKubeletClient => client_spec(
            role,
            "kube-apiserver-kubelet-client",
            Some("system:masters"),
            CaRole::Kubernetes,
        ),
        CertRole::FrontProxyClient => client_spec(
            role,
            "front-proxy-client",
            None,
            CaRole::FrontProxy,
        ),
        CertRole::AdminClient => client_spec(
            role,
            "kubernetes-admin",
            Some("system:masters"),
            CaRole::Kubernetes,
        ),
        CertRole::ControllerManagerClient => client_spec(
            role,
            "system:kube-controller-manager",
            None,
            CaRole::Kubernetes,
        ),
        CertRole::SchedulerClient => client_spec(
            role,
            "system:kube-scheduler",
            None,
            CaRole::Kubernetes,
        ),
    };
    Ok(spec)
}

/// The first usable service address: the subnet's network address with host
/// part 1. `10.96.0.0/12` yields `10.96.0.1`.
pub fn cluster_service_ip(service_subnet: &str) -> Result<String> {
    let invalid = || BootstrapError::InvalidServiceSubnet(service_subnet.to_string());

    let (addr, prefix) = service_subnet.split_once('/').ok_or_else(invalid)?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
    let prefix: u32 = prefix.parse().map_err(|_| invalid())?;
    if prefix == 0 || prefix > 30 {
        return Err(invalid());
    }

    let mask = u32::MAX << (32 - prefix);
    let network = u32::from(addr) & mask;
    Ok(Ipv4Addr::from(network | 1).to_string())
}

// Client-only leaves carry no SAN: widening them with topology history
// would let a later topology change silently alter an identity that was
// never regenerated.
fn client_spec(
    role: CertRole,
    common_name: &str,
    organization: Option<&str>,
    parent_ca: CaRole,
) -> CertificateSpec {
    CertificateSpec {
        role,
        common_name: common_name.to_string(),
        organization: organization.map(str::to_string),
        kind: CertKind::Client,
        alt_names: Vec::new(),
        parent_ca,
    }
}

fn etcd_spec(role: CertRole, common_name: &str, topology: &Topology) -> CertificateSpec {
    let mut spec = CertificateSpec {
        role,
        common_name: common_name.to_string(),
        organization: None,
        kind: CertKind::Both,
        alt_names: Vec::new(),
        parent_ca: CaRole::Etcd,
    };

    spec.push_san(SanEntry::Dns("localhost".to_string()));
    for hostname in topology.master_hostnames() {
        spec.push_san(SanEntry::Dns(hostname.clone()));
    }
    spec.push_san(SanEntry::Ip("127.0.0.1".to_string()));
    spec.push_san(SanEntry::Ip("::1".to_string()));
    for ip in topology.master_ips() {
        spec.push_san(SanEntry::Ip(ip.clone()));
    }
    spec
}

fn apiserver_spec(topology: &Topology) -> Result<CertificateSpec> {
    let mut spec = CertificateSpec {
        role: CertRole::Apiserver,
        common_name: "kube-apiserver".to_string(),
        organization: None,
        kind: CertKind::Server,
        alt_names: Vec::new(),
        parent_ca: CaRole::Kubernetes,
    };

    for dns in [
        "kubernetes",
        "kubernetes.default",
        "kubernetes.default.svc",
        "kubernetes.default.svc.cluster",
        "kubernetes.default.svc.cluster.local",
    ] {
        spec.push_san(SanEntry::Dns(dns.to_string()));
    }
    for hostname in topology.master_hostnames() {
        spec.push_san(SanEntry::Dns(hostname.clone()));
    }

    spec.push_san(SanEntry::Ip(cluster_service_ip(topology.service_subnet())?));
    for ip in topology.master_ips() {
        spec.push_san(SanEntry::Ip(ip.clone()));
    }
    if let Some(ip) = topology.internal_advertise() {
        spec.push_san(SanEntry::Ip(ip.to_string()));
    }
    if let Some(ip) = topology.external_advertise() {
        spec.push_san(SanEntry::Ip(ip.to_string()));
    }
    Ok(spec)
}
