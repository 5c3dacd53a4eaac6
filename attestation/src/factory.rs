//! Turns a leaf and intermediate certificate into a verified [AttestationRecord].

use crate::{
    chain::ChainVerifier,
    classifier::classify,
    extensions::{has_vendor_extension, VendorExtensions},
    record::AttestationRecord,
    registry::CaRegistry,
    x509::X509Certificate,
    Error,
};

const LOG: &str = "attestation::factory";

pub struct AttestationCertificateFactory<'a> {
    registry: &'a CaRegistry,
}

impl<'a> AttestationCertificateFactory<'a> {
    pub fn new(registry: &'a CaRegistry) -> Self {
        Self { registry }
    }

    /// Parses both certificates (PEM or DER), verifies the chain up to a trusted root and
    /// decodes the leaf.
    pub fn build(
        &self,
        leaf: &[u8],
        intermediate: &[u8],
    ) -> Result<AttestationRecord, Error> {
        let leaf = X509Certificate::from_pem_or_der(leaf)?;
        let intermediate = X509Certificate::from_pem_or_der(intermediate)?;
        self.build_parsed(&leaf, &intermediate)
    }

    pub fn build_parsed(
        &self,
        leaf: &X509Certificate,
        intermediate: &X509Certificate,
    ) -> Result<AttestationRecord, Error> {
        if !intermediate.view().has_extensions() {
            return Err(Error::CertificateMissingExtensions);
        }
        ensure_yubikey_certificate(leaf)?;

        let root = ChainVerifier::new(self.registry).verify_chain(leaf, intermediate)?;
        let record = describe(leaf)?;

        log::debug!(
            target: LOG,
            "attested slot {} of token {:?} under {}",
            record.key_reference(),
            record.serial_number,
            root.id()
        );
        Ok(record)
    }

    /// Decodes and classifies a single certificate. The chain is not verified, so the result
    /// must not be trusted.
    pub fn inspect(certificate: &[u8]) -> Result<AttestationRecord, Error> {
        let certificate = X509Certificate::from_pem_or_der(certificate)?;
        ensure_yubikey_certificate(&certificate)?;
        describe(&certificate)
    }
}

fn ensure_yubikey_certificate(certificate: &X509Certificate) -> Result<(), Error> {
    let view = certificate.view();
    if !view.has_extensions() {
        return Err(Error::CertificateMissingExtensions);
    }
    if !has_vendor_extension(&view.extensions) {
        return Err(Error::NotYubikeyCertificate);
    }
    Ok(())
}

fn describe(certificate: &X509Certificate) -> Result<AttestationRecord, Error> {
    let view = certificate.view();
    let extensions = VendorExtensions::decode(&view.extensions)?;
    let role = classify(view.subject_common_name().unwrap_or_default())?;
    Ok(AttestationRecord::new(role, extensions))
}
