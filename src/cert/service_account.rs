// cert/service_account.rs
use crate::error::Result;
use crate::paths::PkiLayout;
use crate::utils::logging::Logger;

use super::backend::CryptoBackend;

/// Writes `sa.key`/`sa.pub` at the pki root. The pair signs service-account
/// tokens; it is not a certificate and no CA is involved.
pub fn generate_service_account_keys(
    backend: &mut dyn CryptoBackend,
    layout: &PkiLayout,
    logger: &mut dyn Logger,
) -> Result<()> {
    logger.log("Generating service account key pair");

    let key_path = layout.pki_dir().join("sa.key");
    let pub_path = layout.pki_dir().join("sa.pub");
    backend.generate_sa_keypair(&key_path, &pub_path, logger)?;

    logger.log("Service account key pair generated");
    Ok(())
}
