use crate::{
    extensions::{FirmwareVersion, FormFactor, PinPolicy, TouchPolicy, VendorExtensions},
    key_reference::KeyReference,
};
use core::fmt;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CertificateType {
    EndEntity,
    IntermediateCa,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum CertificateRole {
    /// Attests a key generated in the slot named by `key_reference`
    #[serde(rename_all = "camelCase")]
    EndEntityAttestation { key_reference: KeyReference },
    /// The per-device intermediate, signed with the attestation key
    IntermediateAttestation,
}

impl CertificateRole {
    pub fn certificate_type(&self) -> CertificateType {
        match self {
            CertificateRole::EndEntityAttestation { .. } => CertificateType::EndEntity,
            CertificateRole::IntermediateAttestation => CertificateType::IntermediateCa,
        }
    }

    pub fn key_reference(&self) -> KeyReference {
        match self {
            CertificateRole::EndEntityAttestation { key_reference } => *key_reference,
            CertificateRole::IntermediateAttestation => KeyReference::ATTESTATION,
        }
    }
}

/// What an attestation certificate says about the token and key behind it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRecord {
    pub role: CertificateRole,
    pub firmware_version: Option<FirmwareVersion>,
    pub serial_number: Option<u64>,
    pub pin_policy: Option<PinPolicy>,
    pub touch_policy: Option<TouchPolicy>,
    pub form_factor: Option<FormFactor>,
    pub is_fips_validated: bool,
}

impl AttestationRecord {
    pub fn new(role: CertificateRole, extensions: VendorExtensions) -> Self {
        Self {
            role,
            firmware_version: extensions.firmware_version,
            serial_number: extensions.serial_number,
            pin_policy: extensions.pin_policy,
            touch_policy: extensions.touch_policy,
            form_factor: extensions.form_factor,
            is_fips_validated: extensions.is_fips_validated,
        }
    }

    pub fn certificate_type(&self) -> CertificateType {
        self.role.certificate_type()
    }

    pub fn key_reference(&self) -> KeyReference {
        self.role.key_reference()
    }
}

/// One line summary, e.g. `YubiKey Attestation Cert for slot 9a from a non-FIPS YubiKey USB Type
/// A Keychain, Serial Number 13083825, Firmware version 5.4.2, PIN Policy: required once per
/// session, Touch Policy: always required`.
impl fmt::Display for AttestationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YubiKey Attestation Cert for slot {}", self.key_reference())?;

        if self.is_fips_validated {
            f.write_str(" from a FIPS-validated YubiKey")?;
        } else {
            f.write_str(" from a non-FIPS YubiKey")?;
        }
        if let Some(form_factor) = self.form_factor.as_ref().and_then(FormFactor::description) {
            write!(f, " {}", form_factor)?;
        }
        if let Some(serial_number) = self.serial_number {
            write!(f, ", Serial Number {}", serial_number)?;
        }
        if let Some(firmware_version) = self.firmware_version {
            write!(f, ", Firmware version {}", firmware_version)?;
        }
        if let Some(pin_policy) = self.pin_policy {
            write!(f, ", PIN Policy: {}", pin_policy)?;
        }
        if let Some(touch_policy) = self.touch_policy {
            write!(f, ", Touch Policy: {}", touch_policy)?;
        }

        Ok(())
    }
}
