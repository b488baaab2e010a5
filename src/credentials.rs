//! Loading of signer credentials from PEM files.

use std::fs;
use std::path::Path;

use crate::cert::CertificateWithPrivateKey;
use crate::error::{MeshCertError, Result};

/// Loads the signer certificate and private key from the given files.
///
/// # Arguments
/// * `signer_cert_file` - PEM certificate of the signing CA.
/// * `signer_priv_file` - PEM private key of the signing CA.
///
/// Read and parse failures are reported as
/// [`MeshCertError::CredentialLoadError`].
pub fn load_signer_creds_from_files(
    signer_cert_file: impl AsRef<Path>,
    signer_priv_file: impl AsRef<Path>,
) -> Result<CertificateWithPrivateKey> {
    let signer_cert_file = signer_cert_file.as_ref();
    let signer_priv_file = signer_priv_file.as_ref();

    let cert_pem = fs::read_to_string(signer_cert_file).map_err(|e| {
        MeshCertError::CredentialLoadError(format!("certificate file reading failure ({e})"))
    })?;
    let key_pem = fs::read_to_string(signer_priv_file).map_err(|e| {
        MeshCertError::CredentialLoadError(format!("private key file reading failure ({e})"))
    })?;

    let creds = CertificateWithPrivateKey::from_pem(&cert_pem, &key_pem)?;
    tracing::debug!(
        cert = %signer_cert_file.display(),
        key = %signer_priv_file.display(),
        "loaded signer credentials"
    );
    Ok(creds)
}
