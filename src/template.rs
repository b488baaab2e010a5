//! Certificate template construction.
//!
//! [`build_template`] turns [`CertOptions`] into a [`CertificateTemplate`]:
//! everything a certificate holds except the issuer, the public key and the
//! signature, which are only known once a signer is picked.

use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use der::flagset::FlagSet;
use rand_core::CryptoRngCore;
use time::{Duration, OffsetDateTime, UtcOffset};
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Time;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    KeyUsages, SubjectAltName, SubjectKeyIdentifier,
};
use crate::cert::params::{CertOptions, DistinguishedName, ExtensionParam, Validity};
use crate::error::{MeshCertError, Result};
use crate::identity::Identity;

/// Size of the random serial number in bytes (128 bits).
pub const SERIAL_NUMBER_LEN: usize = 16;

/// The unsigned contents of a certificate.
///
/// # Fields
/// * `serial_number` - 128-bit random serial.
/// * `subject` - Subject name (organization only).
/// * `validity` - The validity window.
/// * `key_usage` - Key usage bits.
/// * `ext_key_usage` - Extended key usages in declaration order.
/// * `is_ca` - Whether the certificate may sign others.
/// * `basic_constraints_valid` - Whether the basic constraints extension is emitted.
/// * `extra_extensions` - Extensions appended after the standard ones (the SAN).
#[derive(Clone, Debug)]
pub struct CertificateTemplate {
    pub serial_number: SerialNumber,
    pub subject: DistinguishedName,
    pub validity: Validity,
    pub key_usage: KeyUsage,
    pub ext_key_usage: Vec<ExtendedKeyUsageOption>,
    pub is_ca: bool,
    pub basic_constraints_valid: bool,
    pub extra_extensions: Vec<ExtensionParam>,
}

/// Builds a certificate template from `options`.
///
/// Any failure is returned as [`MeshCertError::TemplateError`] wrapping the
/// cause.
pub fn build_template<R: CryptoRngCore + ?Sized>(
    options: &CertOptions,
    rng: &mut R,
) -> Result<CertificateTemplate> {
    assemble_template(options, rng).map_err(MeshCertError::into_template_error)
}

fn assemble_template<R: CryptoRngCore + ?Sized>(
    options: &CertOptions,
    rng: &mut R,
) -> Result<CertificateTemplate> {
    let is_ca = options.mode.is_ca();

    let mut key_usage: FlagSet<KeyUsages> = if is_ca {
        KeyUsages::KeyCertSign.into()
    } else {
        KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment
    };

    let mut ext_key_usage = Vec::new();
    if options.is_server {
        ext_key_usage.push(ExtendedKeyUsageOption::ServerAuth);
    }
    if options.is_client {
        ext_key_usage.push(ExtendedKeyUsageOption::ClientAuth);
    }

    let not_before = options.not_before.unwrap_or_else(OffsetDateTime::now_utc);
    if options.ttl <= Duration::ZERO {
        tracing::warn!(ttl = %options.ttl, "non-positive ttl, certificate is never valid");
    }
    let validity = Validity::from_ttl(not_before, options.ttl)?;

    let serial_number = generate_serial_number(rng)?;

    let mut extra_extensions = Vec::new();
    if !options.hosts.is_empty() {
        extra_extensions.push(build_subject_alt_name_extension(&options.hosts)?);
    }

    // CA certificates always keep the signing bit, whatever was set above.
    if is_ca {
        key_usage |= KeyUsages::KeyCertSign;
    }

    Ok(CertificateTemplate {
        serial_number,
        subject: DistinguishedName::from_organization(&options.organization),
        validity,
        key_usage: KeyUsage(key_usage),
        ext_key_usage,
        is_ca,
        basic_constraints_valid: true,
        extra_extensions,
    })
}

/// Draws a serial number uniformly from `[0, 2^128)`.
pub fn generate_serial_number<R: CryptoRngCore + ?Sized>(rng: &mut R) -> Result<SerialNumber> {
    let mut bytes = [0u8; SERIAL_NUMBER_LEN];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| MeshCertError::SerialGenerationError(e.to_string()))?;
    SerialNumber::new(&bytes).map_err(|e| MeshCertError::SerialGenerationError(e.to_string()))
}

/// Classifies `hosts` and encodes them as a non-critical SAN extension.
pub fn build_subject_alt_name_extension(hosts: &[String]) -> Result<ExtensionParam> {
    let san = SubjectAltName {
        identities: hosts.iter().map(|host| Identity::from_host(host)).collect(),
    };
    ExtensionParam::from_extension(&san, false)
}

impl CertificateTemplate {
    /// Standard extensions followed by the extra ones.
    ///
    /// Key usage and basic constraints are critical; empty key usage and
    /// extended key usage are omitted.
    pub fn extensions(
        &self,
        subject_key_identifier: &[u8],
        authority_key_identifier: &[u8],
    ) -> Result<Vec<ExtensionParam>> {
        let mut extensions = Vec::new();

        if !self.key_usage.0.is_empty() {
            extensions.push(ExtensionParam::from_extension(&self.key_usage, true)?);
        }

        if !self.ext_key_usage.is_empty() {
            let eku = ExtendedKeyUsage {
                usage: self.ext_key_usage.clone(),
            };
            extensions.push(ExtensionParam::from_extension(&eku, false)?);
        }

        if self.basic_constraints_valid {
            let bc = BasicConstraints {
                is_ca: self.is_ca,
                max_path_length: None,
            };
            extensions.push(ExtensionParam::from_extension(&bc, true)?);
        }

        extensions.push(ExtensionParam::from_extension(
            &SubjectKeyIdentifier(subject_key_identifier.to_vec()),
            false,
        )?);
        extensions.push(ExtensionParam::from_extension(
            &AuthorityKeyIdentifier {
                key_identifier: authority_key_identifier.to_vec(),
            },
            false,
        )?);

        extensions.extend(self.extra_extensions.iter().cloned());
        Ok(extensions)
    }

    /// Converts the template into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(
        &self,
        issuer: Name,
        subject_public_key_info: SubjectPublicKeyInfoOwned,
        signature_algorithm: SignatureAlgorithm,
        authority_key_identifier: &[u8],
    ) -> Result<TbsCertificateInner> {
        let subject_key_identifier = crate::key::key_identifier(&subject_public_key_info);

        let extensions = self
            .extensions(&subject_key_identifier, authority_key_identifier)?
            .into_iter()
            .map(|ext| {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value)
                        .map_err(|e| MeshCertError::EncodingError(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.validity.not_before)?,
            not_after: to_x509_time(self.validity.not_after)?,
        };

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: self.serial_number.clone(),
            signature: signature_algorithm.into(),
            issuer,
            validity,
            subject: self.subject.as_x509_name()?,
            subject_public_key_info,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }
}

/// UTCTime through 2049, GeneralizedTime afterwards (RFC 5280 4.1.2.5).
/// Sub-second precision is dropped.
fn to_x509_time(instant: OffsetDateTime) -> Result<Time> {
    let instant = instant.to_offset(UtcOffset::UTC);
    let out_of_range = |detail: String| {
        MeshCertError::EncodingError(format!("time {instant} not representable: {detail}"))
    };

    let year = u16::try_from(instant.year()).map_err(|e| out_of_range(e.to_string()))?;
    let date_time = der::DateTime::new(
        year,
        u8::from(instant.month()),
        instant.day(),
        instant.hour(),
        instant.minute(),
        instant.second(),
    )
    .map_err(|e| out_of_range(e.to_string()))?;

    if year < 2050 {
        UtcTime::from_date_time(date_time)
            .map(Time::UtcTime)
            .map_err(|e| out_of_range(e.to_string()))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(date_time)))
    }
}
