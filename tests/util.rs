#![allow(dead_code)]

use meshcert::cert::params::{CertOptions, IssuanceMode};
use meshcert::cert::{Certificate, CertificateWithPrivateKey};
use meshcert::identity::split_hosts;
use meshcert::issuer::{self, IssuedCertificate};
use meshcert::key::KeyPair;
use meshcert::template::build_template;
use time::Duration;

/// Keeps RSA generation fast in debug builds.
pub const TEST_KEY_SIZE: usize = 1024;

pub fn leaf_options(mode: IssuanceMode, hosts: &str) -> CertOptions {
    CertOptions::builder()
        .hosts(split_hosts(hosts))
        .ttl(Duration::hours(1))
        .mode(mode)
        .organization("Mesh Workloads")
        .is_server(true)
        .rsa_key_size(TEST_KEY_SIZE)
        .build()
}

pub fn issue(options: &CertOptions) -> IssuedCertificate {
    issuer::issue(options).expect("issuance failed")
}

pub fn parse(issued: &IssuedCertificate) -> Certificate {
    Certificate::from_pem(std::str::from_utf8(&issued.cert_pem).unwrap())
        .expect("issued certificate does not parse")
}

pub fn into_signer(issued: &IssuedCertificate) -> CertificateWithPrivateKey {
    CertificateWithPrivateKey::from_pem(
        std::str::from_utf8(&issued.cert_pem).unwrap(),
        std::str::from_utf8(&issued.key_pem).unwrap(),
    )
    .expect("issued credentials do not load")
}

/// Issues a self-signed RSA root CA.
pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    let options = CertOptions::builder()
        .ttl(Duration::days(1))
        .mode(IssuanceMode::SelfSignedCa)
        .organization("Mesh Root CA")
        .rsa_key_size(TEST_KEY_SIZE)
        .build();
    into_signer(&issue(&options))
}

/// Self-signs a root CA over an arbitrary key type.
pub fn generate_ca_cert_with_key(key: KeyPair) -> CertificateWithPrivateKey {
    let options = CertOptions::builder()
        .ttl(Duration::days(1))
        .mode(IssuanceMode::SelfSignedCa)
        .organization("Mesh Root CA")
        .build();
    let template = build_template(&options, &mut rand_core::OsRng).unwrap();
    let cert = meshcert::issuer::sign_template(&template, &key, &options.mode).unwrap();
    CertificateWithPrivateKey::new(cert, key).unwrap()
}

pub fn openssl_x509(issued: &IssuedCertificate) -> openssl::x509::X509 {
    openssl::x509::X509::from_pem(&issued.cert_pem).expect("OpenSSL failed to parse certificate")
}

pub fn openssl_public_key(
    cert: &Certificate,
) -> openssl::pkey::PKey<openssl::pkey::Public> {
    let der = cert.to_der().unwrap();
    openssl::x509::X509::from_der(&der)
        .unwrap()
        .public_key()
        .unwrap()
}
