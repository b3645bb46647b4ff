// cert/backend.rs
use std::path::Path;
use std::process::Command;

use crate::error::{BootstrapError, Result};
use crate::utils::logging::Logger;

/// The cryptographic collaborator the pipeline drives. Everything the
/// orchestrator knows about keys and signatures goes through this seam, so
/// tests can substitute a recording fake.
pub trait CryptoBackend {
    fn generate_keypair(&mut self, key_path: &Path, logger: &mut dyn Logger) -> Result<()>;

    fn self_sign(
        &mut self,
        key_path: &Path,
        subject: &str,
        validity_days: u32,
        cert_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<()>;

    fn generate_csr(
        &mut self,
        key_path: &Path,
        conf_path: &Path,
        csr_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<()>;

    fn sign_csr(
        &mut self,
        csr_path: &Path,
        ca_cert: &Path,
        ca_key: &Path,
        conf_path: &Path,
        validity_days: u32,
        cert_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<()>;

    /// EC key pair for service-account token signing: private key plus the
    /// extracted PEM public key.
    fn generate_sa_keypair(
        &mut self,
        key_path: &Path,
        pub_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<()>;

    fn inspect(&mut self, cert_path: &Path, logger: &mut dyn Logger) -> Result<String>;
}

/// Shells out to the `openssl` binary, capturing output so a failure can
/// report the tool's own diagnostics.
pub struct OpensslBackend {
    key_bits: u32,
}

impl OpensslBackend {
    pub fn new() -> Self {
        Self { key_bits: 2048 }
    }

    fn run(&self, mut cmd: Command, operation: &str, artifact: &Path) -> Result<Vec<u8>> {
        let output = cmd.output().map_err(|e| BootstrapError::CryptoBackend {
            operation: operation.to_string(),
            artifact: artifact.display().to_string(),
            detail: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Err(BootstrapError::CryptoBackend {
                operation: operation.to_string(),
                artifact: artifact.display().to_string(),
                detail: if stderr.is_empty() { stdout } else { stderr },
            });
        }
        Ok(output.stdout)
    }
}

impl Default for OpensslBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoBackend for OpensslBackend {
    fn generate_keypair(&mut self, key_path: &Path, logger: &mut dyn Logger) -> Result<()> {
        logger.debug_log(&format!("Generating private key: {}", key_path.display()));

        let mut cmd = Command::new("openssl");
        cmd.arg("genrsa")
            .arg("-out")
            .arg(key_path)
            .arg(self.key_bits.to_string());
        self.run(cmd, "genrsa", key_path)?;
        Ok(())
    }

    fn self_sign(
        &mut self,
        key_path: &Path,
        subject: &str,
        validity_days: u32,
        cert_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<()> {
        logger.debug_log(&format!(
            "Self-signing {} subject {}",
            cert_path.display(),
            subject
        ));

        let mut cmd = Command::new("openssl");
        cmd.args(["req", "-x509", "-new", "-nodes", "-key"])
            .arg(key_path)
            .arg("-days")
            .arg(validity_days.to_string())
            .arg("-out")
            .arg(cert_path)
            .arg("-subj")
            .arg(subject);
        self.run(cmd, "req -x509", cert_path)?;
        Ok(())
    }

    fn generate_csr(
        &mut self,
        key_path: &Path,
        conf_path: &Path,
        csr_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<()> {
        logger.debug_log(&format!("Generating CSR: {}", csr_path.display()));

        let mut cmd = Command::new("openssl");
        cmd.args(["req", "-new", "-key"])
            .arg(key_path)
            .arg("-out")
            .arg(csr_path)
            .arg("-config")
            .arg(conf_path);
        self.run(cmd, "req -new", csr_path)?;
        Ok(())
    }

    fn sign_csr(
        &mut self,
        csr_path: &Path,
        ca_cert: &Path,
        ca_key: &Path,
        conf_path: &Path,
        validity_days: u32,
        cert_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<()> {
        logger.debug_log(&format!(
            "Signing {} with CA {}",
            cert_path.display(),
            ca_cert.display()
        ));

        let mut cmd = Command::new("openssl");
        cmd.args(["x509", "-req", "-in"])
            .arg(csr_path)
            .arg("-CA")
            .arg(ca_cert)
            .arg("-CAkey")
            .arg(ca_key)
            .arg("-CAcreateserial")
            .arg("-out")
            .arg(cert_path)
            .arg("-days")
            .arg(validity_days.to_string())
            .args(["-extensions", "v3_ext", "-extfile"])
            .arg(conf_path);
        self.run(cmd, "x509 -req", cert_path)?;
        Ok(())
    }

    fn generate_sa_keypair(
        &mut self,
        key_path: &Path,
        pub_path: &Path,
        logger: &mut dyn Logger,
    ) -> Result<()> {
        logger.debug_log(&format!(
            "Generating service account key pair: {}",
            key_path.display()
        ));

        let mut cmd = Command::new("openssl");
        cmd.args(["ecparam", "-name", "secp521r1", "-genkey", "-noout", "-out"])
            .arg(key_path);
        self.run(cmd, "ecparam", key_path)?;

        let mut cmd = Command::new("openssl");
        cmd.args(["ec", "-in"])
            .arg(key_path)
            .args(["-outform", "PEM", "-pubout", "-out"])
            .arg(pub_path);
        self.run(cmd, "ec -pubout", pub_path)?;
        Ok(())
    }

    fn inspect(&mut self, cert_path: &Path, logger: &mut dyn Logger) -> Result<String> {
        logger.debug_log(&format!("Inspecting certificate: {}", cert_path.display()));

        let mut cmd = Command::new("openssl");
        cmd.args(["x509", "-in"])
            .arg(cert_path)
            .args(["-noout", "-text"]);
        let stdout = self.run(cmd, "x509 -text", cert_path)?;
        Ok(String::from_utf8_lossy(&stdout).to_string())
    }
}
