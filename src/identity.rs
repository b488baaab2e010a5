//! Workload identities carried in the subject alternative name extension.
//!
//! A host token is classified as an IP address, a SPIFFE-style URI, or a DNS
//! name. Nothing is validated here: whatever the caller passes ends up in the
//! certificate verbatim.

use std::net::IpAddr;

use der::{
    Decode, EncodeValue, ErrorKind, Header, Length, Reader, Tag, TagNumber, Tagged, Writer,
};

/// URI scheme used for mesh service identities.
pub const URI_SCHEME: &str = "spiffe";

/// The kind of a subject alternative name entry.
///
/// Each kind maps to a fixed `GeneralName` CHOICE alternative of RFC 5280.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    /// `dNSName [2] IA5String`
    Dns,
    /// `uniformResourceIdentifier [6] IA5String`
    Uri,
    /// `iPAddress [7] OCTET STRING`
    Ip,
}

impl IdentityKind {
    /// Context-specific tag number of the `GeneralName` alternative.
    pub fn tag_number(self) -> TagNumber {
        match self {
            IdentityKind::Dns => TagNumber::N2,
            IdentityKind::Uri => TagNumber::N6,
            IdentityKind::Ip => TagNumber::N7,
        }
    }

    fn from_tag_number(number: TagNumber) -> Option<Self> {
        match number {
            TagNumber::N2 => Some(IdentityKind::Dns),
            TagNumber::N6 => Some(IdentityKind::Uri),
            TagNumber::N7 => Some(IdentityKind::Ip),
            _ => None,
        }
    }
}

/// A single subject alternative name entry.
///
/// For [`IdentityKind::Ip`] the value is the 4 or 16 byte address in network
/// order; for the other kinds it is the literal host string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub kind: IdentityKind,
    pub value: Vec<u8>,
}

impl Identity {
    pub fn dns(name: impl Into<String>) -> Self {
        Self {
            kind: IdentityKind::Dns,
            value: name.into().into_bytes(),
        }
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            kind: IdentityKind::Uri,
            value: uri.into().into_bytes(),
        }
    }

    /// Builds an IP identity, preferring the 4-byte form whenever the
    /// address has an IPv4 representation (including IPv4-mapped IPv6).
    pub fn ip(addr: IpAddr) -> Self {
        let value = match addr {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => v4.octets().to_vec(),
                None => v6.octets().to_vec(),
            },
        };
        Self {
            kind: IdentityKind::Ip,
            value,
        }
    }

    /// Classifies one host token.
    ///
    /// # Example
    /// ```
    /// use meshcert::identity::{Identity, IdentityKind};
    /// let id = Identity::from_host("spiffe://cluster.local/ns/default/sa/foo");
    /// assert_eq!(id.kind, IdentityKind::Uri);
    /// ```
    pub fn from_host(host: &str) -> Self {
        if let Ok(addr) = host.parse::<IpAddr>() {
            return Self::ip(addr);
        }
        if host
            .strip_prefix(URI_SCHEME)
            .is_some_and(|rest| rest.starts_with(':'))
        {
            return Self::uri(host);
        }
        Self::dns(host)
    }

    /// Returns the value as text for DNS and URI identities.
    pub fn as_str(&self) -> Option<&str> {
        match self.kind {
            IdentityKind::Ip => None,
            IdentityKind::Dns | IdentityKind::Uri => std::str::from_utf8(&self.value).ok(),
        }
    }

    /// Returns the address for IP identities.
    pub fn as_ip(&self) -> Option<IpAddr> {
        if self.kind != IdentityKind::Ip {
            return None;
        }
        match self.value.len() {
            4 => <[u8; 4]>::try_from(self.value.as_slice())
                .ok()
                .map(IpAddr::from),
            16 => <[u8; 16]>::try_from(self.value.as_slice())
                .ok()
                .map(IpAddr::from),
            _ => None,
        }
    }
}

impl Tagged for Identity {
    fn tag(&self) -> Tag {
        Tag::ContextSpecific {
            constructed: false,
            number: self.kind.tag_number(),
        }
    }
}

// Every alternative we emit is IMPLICIT over a primitive string type, so the
// content octets are the raw value.
impl EncodeValue for Identity {
    fn value_len(&self) -> der::Result<Length> {
        self.value.len().try_into()
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        writer.write(&self.value)
    }
}

impl<'a> Decode<'a> for Identity {
    fn decode<R: Reader<'a>>(reader: &mut R) -> der::Result<Self> {
        let header = Header::decode(reader)?;
        let tag = header.tag;

        let kind = match tag {
            Tag::ContextSpecific {
                constructed: false,
                number,
            } => IdentityKind::from_tag_number(number),
            _ => None,
        }
        .ok_or(ErrorKind::TagUnexpected {
            expected: None,
            actual: tag,
        })?;

        let value = reader.read_vec(header.length)?;
        Ok(Self { kind, value })
    }
}

/// Splits the comma-separated source form of a host list.
///
/// The empty string yields an empty list; empty tokens between commas are
/// kept as they are.
pub fn split_hosts(hosts: &str) -> Vec<String> {
    if hosts.is_empty() {
        return Vec::new();
    }
    hosts.split(',').map(str::to_string).collect()
}

/// Classifies every token of a comma-separated host list, in order.
pub fn parse_hosts(hosts: &str) -> Vec<Identity> {
    split_hosts(hosts)
        .iter()
        .map(|host| Identity::from_host(host))
        .collect()
}
