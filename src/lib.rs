//! # MeshCert - Workload Identity Certificates in Pure Rust
//!
//! MeshCert issues X.509 certificates for workloads in a service mesh. The
//! workload identity (DNS names, IP addresses and `spiffe:` URIs) is carried
//! in the Subject Alternative Name extension. Certificates are either
//! self-signed or signed by a supplied CA, and may be CA, server or client
//! certificates. Everything is built on the rustcrypto libraries.
//!
//! ## Issuance Modes
//!
//! - **SelfSignedLeaf**: an end-entity certificate signing itself
//! - **SelfSignedCa**: a root CA
//! - **SignedLeaf**: an end-entity certificate signed by a CA
//! - **SignedIntermediateCa**: an intermediate CA signed by a CA
//!
//! The issued certificate always gets a fresh RSA key. Signing CAs may hold
//! RSA, ECDSA P-256/P-384 or Ed25519 keys.
//!
//! ## Quick Start
//!
//! ### Issuing a Self-Signed Root CA
//!
//! ```rust,no_run
//! use meshcert::{cert::params::{CertOptions, IssuanceMode}, issuer};
//!
//! # fn main() -> Result<(), meshcert::error::MeshCertError> {
//! let options = CertOptions::builder()
//!     .ttl(time::Duration::days(365))
//!     .mode(IssuanceMode::SelfSignedCa)
//!     .organization("cluster.local")
//!     .build();
//!
//! let issued = issuer::issue(&options)?;
//! println!("{}", String::from_utf8_lossy(&issued.cert_pem));
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing a Workload Certificate Signed by the CA
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshcert::{
//!     cert::params::{CertOptions, IssuanceMode},
//!     credentials::load_signer_creds_from_files,
//!     identity::split_hosts,
//!     issuer,
//! };
//!
//! # fn main() -> Result<(), meshcert::error::MeshCertError> {
//! let ca = load_signer_creds_from_files("ca-cert.pem", "ca-key.pem")?;
//!
//! let options = CertOptions::builder()
//!     .hosts(split_hosts("spiffe://cluster.local/ns/default/sa/foo,10.0.0.1"))
//!     .ttl(time::Duration::hours(24))
//!     .mode(IssuanceMode::SignedLeaf(Arc::new(ca)))
//!     .is_server(true)
//!     .is_client(true)
//!     .build();
//!
//! let issued = issuer::issue(&options)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Issuance is all-or-nothing; every failure is a [`error::MeshCertError`]
//! carrying its cause:
//!
//! ```rust
//! use meshcert::{cert::CertificateWithPrivateKey, error::MeshCertError};
//!
//! match CertificateWithPrivateKey::from_pem("invalid", "invalid") {
//!     Ok(_) => println!("Signer loaded"),
//!     Err(MeshCertError::CredentialLoadError(msg)) => println!("Bad credentials: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`identity`]: Classification of host tokens into SAN identities
//! - [`cert`]: Certificate model, extensions (including the SAN encoder) and options
//! - [`template`]: Certificate template construction
//! - [`issuer`]: Signing and issuance
//! - [`key`]: Key generation, signing and PEM import/export
//! - [`credentials`]: Signer credential loading
//! - [`error`]: Error types

pub mod cert;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod template;
