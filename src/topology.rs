// src/topology.rs
use serde::{Deserialize, Serialize};

/// A control-plane node as registered before generation starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterNode {
    pub ip: String,
    pub hostname: String,
}

/// The cluster facts every certificate subject is derived from.
///
/// Populated in a collect phase, then read-only once generation begins.
/// Master ips and hostnames are kept as parallel first-seen-order lists with
/// duplicates dropped; the first registered ip doubles as the default
/// internal advertise address until an explicit override arrives.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    ips: Vec<String>,
    hostnames: Vec<String>,
    internal_advertise: Option<String>,
    external_advertise: Option<String>,
    service_subnet: String,
}

impl Topology {
    pub fn new(service_subnet: &str) -> Self {
        Self {
            service_subnet: service_subnet.to_string(),
            ..Default::default()
        }
    }

    /// Idempotent registration: duplicate ips and hostnames are no-ops,
    /// never errors.
    pub fn register_master(&mut self, ip: &str, hostname: &str) {
        if self.ips.is_empty() && self.internal_advertise.is_none() {
            self.internal_advertise = Some(ip.to_string());
        }
        if !self.ips.iter().any(|known| known == ip) {
            self.ips.push(ip.to_string());
        }
        if !self.hostnames.iter().any(|known| known == hostname) {
            self.hostnames.push(hostname.to_string());
        }
    }

    pub fn set_internal_advertise(&mut self, ip: &str) {
        self.internal_advertise = Some(ip.to_string());
    }

    pub fn set_external_advertise(&mut self, ip: &str) {
        self.external_advertise = Some(ip.to_string());
    }

    /// Registered master ips, first-seen order, deduplicated.
    pub fn master_ips(&self) -> &[String] {
        &self.ips
    }

    /// Registered master hostnames, first-seen order, deduplicated.
    pub fn master_hostnames(&self) -> &[String] {
        &self.hostnames
    }

    pub fn internal_advertise(&self) -> Option<&str> {
        self.internal_advertise.as_deref()
    }

    pub fn external_advertise(&self) -> Option<&str> {
        self.external_advertise.as_deref()
    }

    pub fn service_subnet(&self) -> &str {
        &self.service_subnet
    }

    pub fn has_masters(&self) -> bool {
        !self.ips.is_empty()
    }
}
