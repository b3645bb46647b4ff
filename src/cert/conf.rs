// cert/conf.rs
use crate::config::SubjectTemplate;

use super::types::CertificateSpec;

/// An ordered INI-style document, the shape `openssl req -config` expects.
/// Sections and keys render in insertion order; building the descriptor as
/// data instead of string concatenation keeps ordering and section
/// references correct.
#[derive(Debug, Default)]
pub struct ConfDocument {
    sections: Vec<(String, Vec<(String, String)>)>,
}

impl ConfDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&mut self, name: &str) {
        if !self.sections.iter().any(|(n, _)| n == name) {
            self.sections.push((name.to_string(), Vec::new()));
        }
    }

    /// Sets `key = value` in `section`, creating the section at the end of
    /// the document if it does not exist yet. A repeated key overwrites in
    /// place, keeping its original position.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let idx = match self.sections.iter().position(|(n, _)| n == section) {
            Some(idx) => idx,
            None => {
                self.sections.push((section.to_string(), Vec::new()));
                self.sections.len() - 1
            }
        };
        let entries = &mut self.sections[idx].1;
        if let Some(entry) = entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            entries.push((key.to_string(), value.to_string()));
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, entries) in &self.sections {
            out.push_str(&format!("[{}]\n", name));
            for (key, value) in entries {
                out.push_str(&format!("{} = {}\n", key, value));
            }
            out.push('\n');
        }
        out
    }
}

/// Builds the full signing-request descriptor for one leaf certificate:
/// request defaults, distinguished name from the subject template with the
/// role's CN/O overrides, the v3 extension block used both at CSR and at
/// signing time, and the SAN table when the role carries one.
pub fn csr_conf(spec: &CertificateSpec, subject: &SubjectTemplate) -> ConfDocument {
    let mut conf = ConfDocument::new();

    conf.set("req", "default_bits", "2048");
    conf.set("req", "prompt", "no");
    conf.set("req", "default_md", "sha256");
    conf.set("req", "req_extensions", "req_ext");
    conf.set("req", "distinguished_name", "req_distinguished_name");

    conf.set("req_distinguished_name", "C", &subject.country);
    conf.set("req_distinguished_name", "ST", &subject.state);
    conf.set("req_distinguished_name", "L", &subject.city);
    conf.set(
        "req_distinguished_name",
        "O",
        spec.organization.as_deref().unwrap_or(&subject.organization),
    );
    conf.set("req_distinguished_name", "OU", &subject.organization_unit);
    conf.set("req_distinguished_name", "CN", &spec.common_name);

    conf.set("v3_ext", "authorityKeyIdentifier", "keyid,issuer:always");
    conf.set("v3_ext", "basicConstraints", "CA:FALSE");
    conf.set("v3_ext", "keyUsage", "keyEncipherment,dataEncipherment");
    conf.set("v3_ext", "extendedKeyUsage", spec.kind.extended_key_usage());

    if !spec.alt_names.is_empty() {
        for (label, value) in spec.san_labels() {
            conf.set("alt_names", &label, value);
        }
        conf.set("v3_ext", "subjectAltName", "@alt_names");
    }

    // openssl tolerates the section being empty for SAN-less roles.
    conf.add_section("req_ext");
    if !spec.alt_names.is_empty() {
        conf.set("req_ext", "subjectAltName", "@alt_names");
    }

    conf
}
