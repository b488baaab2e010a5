//! use meshcert::error::MeshCertError;

use thiserror::Error;

/// Represents errors that can occur while issuing workload certificates.
///
/// Issuance is all-or-nothing: every variant aborts the call that produced it
/// and carries the originating cause as text (or, for [`TemplateError`], as a
/// nested error).
///
/// [`TemplateError`]: MeshCertError::TemplateError
#[derive(Debug, Error, Clone)]
pub enum MeshCertError {
    /// The key pair could not be generated.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// A validity instant falls outside what X.509 times can carry
    /// (1970-01-01 through 9999-12-31 UTC).
    #[error("Validity out of range: {0}")]
    ValidityOutOfRange(String),

    /// The random serial number could not be drawn.
    #[error("Serial number generation failure: {0}")]
    SerialGenerationError(String),

    /// The subject alternative name extension could not be DER encoded.
    #[error("SAN extension building failure: {0}")]
    ExtensionEncodingError(String),

    /// Certificate template assembly failed.
    #[error("Certificate template creation failure: {0}")]
    TemplateError(#[source] Box<MeshCertError>),

    /// The signature over the certificate could not be produced.
    #[error("X.509 certificate signing failure: {0}")]
    SigningError(String),

    /// Signer certificate or key could not be read or parsed.
    #[error("Credential loading failure: {0}")]
    CredentialLoadError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MeshCertError {
    /// Wraps `self` as the cause of a template failure.
    pub(crate) fn into_template_error(self) -> Self {
        MeshCertError::TemplateError(Box::new(self))
    }

    /// Reports a failure of the signing stage as [`MeshCertError::SigningError`].
    pub(crate) fn into_signing_error(self) -> Self {
        match self {
            MeshCertError::SigningError(_) => self,
            other => MeshCertError::SigningError(other.to_string()),
        }
    }
}

impl From<der::Error> for MeshCertError {
    /// Converts a `der::Error` into a `MeshCertError`.
    fn from(err: der::Error) -> Self {
        MeshCertError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for MeshCertError {
    fn from(err: rsa::Error) -> Self {
        MeshCertError::KeyGenerationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MeshCertError>;
