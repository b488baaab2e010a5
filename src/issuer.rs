use der::Encode;
use der::asn1::BitString;
use rand_core::CryptoRngCore;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::params::{CertOptions, IssuanceMode};
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::error::{MeshCertError, Result};
use crate::key::KeyPair;
use crate::template::{CertificateTemplate, build_template};

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and to sign
/// certificate templates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> Result<Name>;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the key identifier placed in the authority key identifier
    /// extension of issued certificates.
    fn authority_key_identifier(&self) -> Result<Vec<u8>>;

    /// Signs `template` for the holder of `subject_key`.
    ///
    /// # Arguments
    /// * `template` - The certificate contents.
    /// * `subject_key` - Key pair whose public half is certified.
    fn sign(&self, template: &CertificateTemplate, subject_key: &KeyPair) -> Result<Certificate> {
        let signature_algorithm = self.signing_key().signature_algorithm();

        let tbs_cert_inner = template.to_tbs_certificate_inner(
            self.issuer_name()?,
            subject_key.public_key_info()?,
            signature_algorithm,
            &self.authority_key_identifier()?,
        )?;

        let tbs_der = tbs_cert_inner
            .to_der()
            .map_err(|e| MeshCertError::SigningError(e.to_string()))?;
        let signature = self.signing_key().sign_data(&tbs_der)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algorithm.into(),
            signature: BitString::from_bytes(&signature)
                .map_err(|e| MeshCertError::SigningError(e.to_string()))?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Result<Name> {
        Ok(self.name.clone())
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn authority_key_identifier(&self) -> Result<Vec<u8>> {
        Ok(crate::key::key_identifier(&self.key.public_key_info()?))
    }
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> Result<Name> {
        // The name of the issuer is the subject of the certificate
        Ok(self.cert.subject().clone())
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn authority_key_identifier(&self) -> Result<Vec<u8>> {
        self.cert.subject_key_identifier()
    }
}

/// Signs `template` according to `mode`.
///
/// Self-signed modes sign with `subject_key` under the template's own subject
/// name; signed modes use the CA credentials carried by the mode. Any failure
/// is returned as [`MeshCertError::SigningError`].
pub fn sign_template(
    template: &CertificateTemplate,
    subject_key: &KeyPair,
    mode: &IssuanceMode,
) -> Result<Certificate> {
    let signed = match mode.signer() {
        Some(signer) => signer.sign(template, subject_key),
        None => template.subject.as_x509_name().and_then(|name| {
            SelfIssuer {
                name,
                key: subject_key,
            }
            .sign(template, subject_key)
        }),
    };
    signed.map_err(MeshCertError::into_signing_error)
}

/// PEM encoded output of an issuance.
#[derive(Clone)]
pub struct IssuedCertificate {
    /// The certificate, labelled `CERTIFICATE`.
    pub cert_pem: Vec<u8>,
    /// The generated private key, labelled `RSA PRIVATE KEY`.
    pub key_pem: Vec<u8>,
}

/// Generates an RSA key and a certificate for it with the given options.
pub fn issue(options: &CertOptions) -> Result<IssuedCertificate> {
    issue_with_rng(options, &mut rand_core::OsRng)
}

/// Same as [`issue`], drawing the key and serial number from `rng`.
///
/// The key is generated first; nothing is returned unless every step
/// succeeds.
pub fn issue_with_rng<R: CryptoRngCore + ?Sized>(
    options: &CertOptions,
    rng: &mut R,
) -> Result<IssuedCertificate> {
    let key = KeyPair::generate_rsa_with_rng(options.rsa_key_size, rng)?;
    let template = build_template(options, rng)?;
    let cert = sign_template(&template, &key, &options.mode)?;

    let issued = IssuedCertificate {
        cert_pem: cert.to_pem()?.into_bytes(),
        key_pem: key.to_pem()?.into_bytes(),
    };

    tracing::debug!(
        serial = %cert.serial_number_hex(),
        hosts = options.hosts.len(),
        ca = options.mode.is_ca(),
        self_signed = options.mode.is_self_signed(),
        "issued certificate"
    );
    Ok(issued)
}
