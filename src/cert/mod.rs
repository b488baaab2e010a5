pub mod extensions;
pub mod params;

use crate::error::MeshCertError;
pub type Result<T> = std::result::Result<T, MeshCertError>;
use der::{Decode, DecodePem, Encode, EncodePem};
use extensions::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName, SubjectKeyIdentifier,
    ToAndFromX509Extension,
};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::identity::Identity;
use crate::key::KeyPair;

/// PEM label of an X.509 certificate.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// Pure Ed25519.
    Ed25519,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA carries an explicit NULL parameter (RFC 4055); the ECDSA and
    /// EdDSA identifiers have absent parameters.
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::asn1::Any::null()),
            },
            SignatureAlgorithm::Sha256WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Sha384WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
            SignatureAlgorithm::Ed25519 => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc8410::ID_ED_25519,
                parameters: None,
            },
        }
    }
}

/// Represents a signed X.509 certificate.
///
/// Besides DER/PEM encoding this exposes the fields and extensions a mesh
/// workload certificate carries.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| MeshCertError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| MeshCertError::EncodingError(e.to_string()))
    }

    pub fn from_der(der_bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der_bytes)?,
        })
    }

    pub fn from_pem(pem_str: &str) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_pem(pem_str)?,
        })
    }

    /// Big-endian serial number bytes as encoded in the certificate.
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    /// Serial number as lowercase hex, without the leading zero octet DER
    /// adds to keep the INTEGER positive.
    pub fn serial_number_hex(&self) -> String {
        let bytes = self.serial_number();
        let start = bytes
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(bytes.len().saturating_sub(1));
        hex::encode(&bytes[start..])
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn not_before(&self) -> Result<OffsetDateTime> {
        to_offset_date_time(&self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> Result<OffsetDateTime> {
        to_offset_date_time(&self.inner.tbs_certificate.validity.not_after)
    }

    pub fn public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    /// Looks up and decodes an extension by its type.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
            .transpose()
    }

    /// Identities from the subject alternative name extension, in order.
    pub fn subject_alt_names(&self) -> Result<Vec<Identity>> {
        Ok(self
            .extension::<SubjectAltName>()?
            .map(|san| san.identities)
            .unwrap_or_default())
    }

    pub fn is_ca(&self) -> Result<bool> {
        Ok(self
            .extension::<BasicConstraints>()?
            .is_some_and(|bc| bc.is_ca))
    }

    pub fn key_usage(&self) -> Result<Option<KeyUsage>> {
        self.extension::<KeyUsage>()
    }

    pub fn extended_key_usage(&self) -> Result<ExtendedKeyUsage> {
        Ok(self.extension::<ExtendedKeyUsage>()?.unwrap_or_default())
    }

    /// The subject key identifier extension, or the identifier computed from
    /// the subject public key when the extension is absent.
    pub fn subject_key_identifier(&self) -> Result<Vec<u8>> {
        match self.extension::<SubjectKeyIdentifier>()? {
            Some(ski) => Ok(ski.0),
            None => Ok(crate::key::key_identifier(self.public_key_info())),
        }
    }
}

fn to_offset_date_time(time: &x509_cert::time::Time) -> Result<OffsetDateTime> {
    let secs = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|e| MeshCertError::DecodingError(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(secs).map_err(|e| MeshCertError::DecodingError(e.to_string()))
}

/// A CA certificate together with the private key that signs on its behalf.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertificateWithPrivateKey {
    /// Pairs a certificate with its private key.
    ///
    /// Fails with [`MeshCertError::InvalidInput`] when the key does not
    /// belong to the certificate.
    pub fn new(cert: Certificate, key: KeyPair) -> Result<Self> {
        let key_spki = key.public_key_info()?.to_der()?;
        let cert_spki = cert.public_key_info().to_der()?;
        if key_spki != cert_spki {
            return Err(MeshCertError::InvalidInput(
                "private key does not match the certificate public key".to_string(),
            ));
        }
        Ok(Self { cert, key })
    }

    /// Parses a PEM certificate and PEM private key into a signer.
    ///
    /// Every failure is reported as [`MeshCertError::CredentialLoadError`].
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let cert = Certificate::from_pem(cert_pem).map_err(|e| {
            MeshCertError::CredentialLoadError(format!("certificate parsing failure ({e})"))
        })?;
        let key = KeyPair::from_pem(key_pem).map_err(|e| {
            MeshCertError::CredentialLoadError(format!("private key parsing failure ({e})"))
        })?;
        Self::new(cert, key).map_err(|e| MeshCertError::CredentialLoadError(e.to_string()))
    }
}
