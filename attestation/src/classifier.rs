//! Derives the role of an attestation certificate from its subject common name.
//!
//! Leaves are named `"YubiKey PIV Attestation 9a"`, the slot being the last word. The
//! intermediate carries no slot in its name and always belongs to the attestation key.

use crate::{
    key_reference::KeyReference,
    record::CertificateRole,
    Error,
};

pub const INTERMEDIATE_COMMON_NAME: &str = "Yubico PIV Attestation";

const SLOT_MARKER: &str = "Attestation";

pub fn classify(common_name: &str) -> Result<CertificateRole, Error> {
    let words: Vec<&str> = common_name.split_whitespace().collect();

    if let [.., marker, slot] = words.as_slice() {
        if *marker == SLOT_MARKER && slot.len() == 2 {
            let key_reference = parse_slot(slot)?;
            return Ok(CertificateRole::EndEntityAttestation { key_reference });
        }
    }

    if common_name == INTERMEDIATE_COMMON_NAME {
        return Ok(CertificateRole::IntermediateAttestation);
    }

    Err(Error::UnknownCertificateType)
}

/// Slot tokens name PIV keys only. The attestation key is reached through the intermediate's
/// name, never through a slot token.
fn parse_slot(slot: &str) -> Result<KeyReference, Error> {
    u8::from_str_radix(slot, 16)
        .ok()
        .and_then(KeyReference::new)
        .filter(|reference| *reference != KeyReference::ATTESTATION)
        .ok_or_else(|| Error::InvalidKeyReference(slot.to_owned()))
}
