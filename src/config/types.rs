// config/types.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{BootstrapError, Result};
use crate::topology::{MasterNode, Topology};

/// Distinguished-name fields shared by every leaf certificate. Per-role
/// rules override CN always and O for the `system:masters` identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectTemplate {
    pub country: String,
    pub state: String,
    pub city: String,
    pub organization: String,
    pub organization_unit: String,
    pub common_name: String,
}

impl Default for SubjectTemplate {
    fn default() -> Self {
        Self {
            country: "CN".to_string(),
            state: "shandong".to_string(),
            city: "jinan".to_string(),
            organization: "personal".to_string(),
            organization_unit: "personal".to_string(),
            common_name: "local.com".to_string(),
        }
    }
}

/// The collected-answers record: everything an operator would be asked
/// before generation starts, as a plain JSON file. Interactive collection
/// stays outside the core; `resolve` turns the record into the immutable
/// run configuration plus a populated topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAnswers {
    pub root_dir: String,
    pub service_subnet: String,
    pub validity_days: u32,
    pub log_level: String,
    pub subject: SubjectTemplate,
    pub masters: Vec<MasterNode>,
    pub internal_advertise: Option<String>,
    pub external_advertise: Option<String>,
}

impl Default for BootstrapAnswers {
    fn default() -> Self {
        Self {
            root_dir: "/etc/kubernetes".to_string(),
            service_subnet: "10.96.0.0/12".to_string(),
            validity_days: 3650,
            log_level: "info".to_string(),
            subject: SubjectTemplate::default(),
            masters: Vec::new(),
            internal_advertise: None,
            external_advertise: None,
        }
    }
}

impl BootstrapAnswers {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| BootstrapError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|e| BootstrapError::Read {
            path: PathBuf::from(path),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).map_err(|e| BootstrapError::ConfigWrite {
            path: PathBuf::from(path),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        fs::write(path, raw).map_err(|source| BootstrapError::ConfigWrite {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Pure transform from the answers record to the run configuration and
    /// the populated topology registry.
    pub fn resolve(&self) -> (GeneratorConfig, Topology) {
        let mut topology = Topology::new(&self.service_subnet);
        for master in &self.masters {
            topology.register_master(&master.ip, &master.hostname);
        }
        if let Some(ip) = &self.internal_advertise {
            topology.set_internal_advertise(ip);
        }
        if let Some(ip) = &self.external_advertise {
            topology.set_external_advertise(ip);
        }

        let config = GeneratorConfig {
            root_dir: PathBuf::from(shellexpand::tilde(&self.root_dir).to_string()),
            validity_days: self.validity_days,
            debug: self.log_level.eq_ignore_ascii_case("debug"),
            subject: self.subject.clone(),
        };
        (config, topology)
    }
}

/// The immutable per-run configuration threaded into the pipeline.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub root_dir: PathBuf,
    pub validity_days: u32,
    pub debug: bool,
    pub subject: SubjectTemplate,
}
