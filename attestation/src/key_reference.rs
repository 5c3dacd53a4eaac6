//! Key references from [SP 800-73-4 Part 1, Table 4b](https://nvlpubs.nist.gov/nistpubs/SpecialPublications/NIST.SP.800-73-4.pdf)
//! and the attestation key Yubico adds on top.

use core::fmt;
use serde::{Serialize, Serializer};

/// Reference of the key that signs attestation certificates on a YubiKey.
pub const ATTESTATION_KEY_REFERENCE: u8 = 0xF9;

pub const PIV_KEY_REFERENCES: [(u8, &str); 26] = [
    (0x04, "PIV Secure Messaging Key"),
    (0x9A, "PIV Authentication Key"),
    (0x9B, "PIV Card Application Administration Key"),
    (0x9C, "Digital Signature Key"),
    (0x9D, "Key Management Key"),
    (0x9E, "Card Authentication Key"),
    (0x82, "Retired Key Management Key 1"),
    (0x83, "Retired Key Management Key 2"),
    (0x84, "Retired Key Management Key 3"),
    (0x85, "Retired Key Management Key 4"),
    (0x86, "Retired Key Management Key 5"),
    (0x87, "Retired Key Management Key 6"),
    (0x88, "Retired Key Management Key 7"),
    (0x89, "Retired Key Management Key 8"),
    (0x8A, "Retired Key Management Key 9"),
    (0x8B, "Retired Key Management Key 10"),
    (0x8C, "Retired Key Management Key 11"),
    (0x8D, "Retired Key Management Key 12"),
    (0x8E, "Retired Key Management Key 13"),
    (0x8F, "Retired Key Management Key 14"),
    (0x90, "Retired Key Management Key 15"),
    (0x91, "Retired Key Management Key 16"),
    (0x92, "Retired Key Management Key 17"),
    (0x93, "Retired Key Management Key 18"),
    (0x94, "Retired Key Management Key 19"),
    (0x95, "Retired Key Management Key 20"),
];

pub fn is_piv_key_reference(reference: u8) -> bool {
    PIV_KEY_REFERENCES.iter().any(|(r, _)| *r == reference)
}

/// A key reference from the PIV table or the attestation key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyReference(u8);

impl KeyReference {
    pub const ATTESTATION: KeyReference = KeyReference(ATTESTATION_KEY_REFERENCE);

    pub fn new(reference: u8) -> Option<Self> {
        (reference == ATTESTATION_KEY_REFERENCE || is_piv_key_reference(reference))
            .then_some(KeyReference(reference))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        PIV_KEY_REFERENCES
            .iter()
            .find(|(r, _)| *r == self.0)
            .map_or("Attestation Key", |(_, name)| *name)
    }
}

/// Formats as the slot is written in certificate subjects, e.g. `9a`.
impl fmt::Display for KeyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

impl Serialize for KeyReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
