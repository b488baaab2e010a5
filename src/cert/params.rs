use std::sync::Arc;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::Tag;
use der::asn1::{Any, SetOfVec};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::CertificateWithPrivateKey;
use super::extensions::ToAndFromX509Extension;
use crate::error::MeshCertError;

/// Key size used when the caller does not pick one.
pub const DEFAULT_RSA_KEY_SIZE: usize = 2048;

/// Last second representable as an X.509 time, 9999-12-31T23:59:59Z.
const MAX_X509_UNIX_TIME: i64 = 253_402_300_799;

const ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");

/// How a certificate is signed and whether it may sign others.
///
/// The signed variants always carry both the signer certificate and its
/// private key, so a "signed but missing signer" request cannot be expressed.
#[derive(Clone, Debug)]
pub enum IssuanceMode {
    /// End-entity certificate signed by its own key.
    SelfSignedLeaf,
    /// Root CA certificate signed by its own key.
    SelfSignedCa,
    /// End-entity certificate signed by the given CA.
    SignedLeaf(Arc<CertificateWithPrivateKey>),
    /// Intermediate CA certificate signed by the given CA.
    SignedIntermediateCa(Arc<CertificateWithPrivateKey>),
}

impl IssuanceMode {
    pub fn is_ca(&self) -> bool {
        matches!(
            self,
            IssuanceMode::SelfSignedCa | IssuanceMode::SignedIntermediateCa(_)
        )
    }

    pub fn is_self_signed(&self) -> bool {
        self.signer().is_none()
    }

    /// The CA credentials for the signed variants.
    pub fn signer(&self) -> Option<&CertificateWithPrivateKey> {
        match self {
            IssuanceMode::SelfSignedLeaf | IssuanceMode::SelfSignedCa => None,
            IssuanceMode::SignedLeaf(signer) | IssuanceMode::SignedIntermediateCa(signer) => {
                Some(&**signer)
            }
        }
    }
}

/// Options for generating a new workload certificate.
///
/// # Fields
/// * `hosts` - Host tokens for the subject alternative name extension; see
///   [`crate::identity::split_hosts`] for the comma-separated form.
/// * `not_before` - Start of validity; the current instant when unset.
/// * `ttl` - Added to `not_before` to get `not_after`. Not validated.
/// * `mode` - Self-signed or CA-signed, leaf or CA.
/// * `organization` - Subject organization.
/// * `is_client` - Adds the client auth extended key usage.
/// * `is_server` - Adds the server auth extended key usage.
/// * `rsa_key_size` - Size of the generated RSA key in bits.
#[derive(Clone, Debug, Builder)]
pub struct CertOptions {
    #[builder(default)]
    pub hosts: Vec<String>,
    pub not_before: Option<OffsetDateTime>,
    pub ttl: Duration,
    pub mode: IssuanceMode,
    #[builder(into, default)]
    pub organization: String,
    #[builder(default)]
    pub is_client: bool,
    #[builder(default)]
    pub is_server: bool,
    #[builder(default = DEFAULT_RSA_KEY_SIZE)]
    pub rsa_key_size: usize,
}

/// Subject name of a workload certificate: the organization only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub organization: Option<String>,
}

impl DistinguishedName {
    /// Builds a name holding `organization`; an empty string gives an empty
    /// name.
    pub fn from_organization(organization: &str) -> Self {
        Self {
            organization: (!organization.is_empty()).then(|| organization.to_string()),
        }
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> Result<Name, MeshCertError> {
        let Some(organization) = &self.organization else {
            return Ok(RdnSequence(Vec::new()));
        };

        let atv = AttributeTypeAndValue {
            oid: ORGANIZATION_NAME,
            value: Any::new(Tag::Utf8String, organization.as_bytes())
                .map_err(|e| MeshCertError::EncodingError(e.to_string()))?,
        };
        let rdn = RelativeDistinguishedName(
            SetOfVec::try_from(vec![atv]).map_err(|e| MeshCertError::EncodingError(e.to_string()))?,
        );
        Ok(RdnSequence(vec![rdn]))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes other than the organization are ignored.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let organization = x509dn
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|attr| attr.oid == ORGANIZATION_NAME)
            .and_then(|attr| std::str::from_utf8(attr.value.value()).ok())
            .map(str::to_string);
        Self { organization }
    }
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// A window of `ttl` starting at `not_before`.
    ///
    /// A negative `ttl` yields `not_after` before `not_before`. Both
    /// instants must lie between the Unix epoch and the end of year 9999,
    /// else [`MeshCertError::ValidityOutOfRange`] is returned.
    pub fn from_ttl(not_before: OffsetDateTime, ttl: Duration) -> Result<Self, MeshCertError> {
        let not_after = not_before.checked_add(ttl).ok_or_else(|| {
            MeshCertError::ValidityOutOfRange(format!(
                "not_before {not_before} plus ttl {ttl} overflows"
            ))
        })?;
        check_x509_range("not_before", not_before)?;
        check_x509_range("not_after", not_after)?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.not_after - self.not_before
    }
}

fn check_x509_range(field: &str, instant: OffsetDateTime) -> Result<(), MeshCertError> {
    if (0..=MAX_X509_UNIX_TIME).contains(&instant.unix_timestamp()) {
        Ok(())
    } else {
        Err(MeshCertError::ValidityOutOfRange(format!(
            "{field} {instant} is outside 1970-01-01..=9999-12-31"
        )))
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: &E,
        critical: bool,
    ) -> Result<Self, MeshCertError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, MeshCertError> {
        E::from_x509_extension_value(&self.value)
    }
}
