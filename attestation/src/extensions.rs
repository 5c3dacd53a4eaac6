//! Decoders for the proprietary extensions Yubico puts in PIV attestation certificates.
//!
//! All of them live under [YUBICO_OID_PIV_ROOT] and carry their payload as raw bytes inside the
//! `extnValue` octet string.

use crate::Error;
use core::fmt;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

pub const YUBICO_OID_PIV_ROOT: &str = "1.3.6.1.4.1.41482.3";
pub const YUBICO_OID_FIRMWARE_VERSION: &str = "1.3.6.1.4.1.41482.3.3";
pub const YUBICO_OID_SERIAL_NUMBER: &str = "1.3.6.1.4.1.41482.3.7";
pub const YUBICO_OID_PIN_TOUCH_POLICY: &str = "1.3.6.1.4.1.41482.3.8";
pub const YUBICO_OID_FORM_FACTOR: &str = "1.3.6.1.4.1.41482.3.9";
pub const YUBICO_OID_FIPS_VALIDATED: &str = "1.3.6.1.4.1.41482.3.10";

/// Marker the token may set on the form factor byte.
const FORM_FACTOR_CONTEXT_TAG: u8 = 0x80;

const ASN1_INTEGER_TAG: u8 = 0x02;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload has a fixed size that was not met
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    /// Nothing to decode
    #[error("the payload is empty")]
    Empty,
    /// The serial number is not an INTEGER
    #[error("expected an INTEGER tag, got {0:#04x}")]
    UnexpectedTag(u8),
    /// The serial number stops after its tag
    #[error("the INTEGER has no length")]
    MissingLength,
    /// The declared length and the content disagree
    #[error("the INTEGER declares {declared} content bytes but {actual} follow")]
    LengthMismatch { declared: usize, actual: usize },
    /// The serial number is wider than 64 bits
    #[error("an integer of {0} significant bytes does not fit in 64 bits")]
    IntegerTooLarge(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for FirmwareVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PinPolicy {
    Never,
    OncePerSession,
    Always,
    Unknown(u8),
}

impl PinPolicy {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Never,
            0x02 => Self::OncePerSession,
            0x03 => Self::Always,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Never => 0x01,
            Self::OncePerSession => 0x02,
            Self::Always => 0x03,
            Self::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for PinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Never => "never required",
            Self::OncePerSession => "required once per session",
            Self::Always => "always required",
            Self::Unknown(_) => "unknown or invalid",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchPolicy {
    Never,
    Always,
    CachedFor15s,
    Unknown(u8),
}

impl TouchPolicy {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Never,
            0x02 => Self::Always,
            0x03 => Self::CachedFor15s,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Never => 0x01,
            Self::Always => 0x02,
            Self::CachedFor15s => 0x03,
            Self::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for TouchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Never => "never required",
            Self::Always => "always required",
            Self::CachedFor15s => "cached for 15 seconds after touch",
            Self::Unknown(_) => "unknown or invalid",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormFactor {
    Undefined,
    UsbAKeychain,
    UsbANano,
    UsbCKeychain,
    UsbCNano,
    UsbCLightning,
    Unknown(u8),
}

impl FormFactor {
    /// Interprets a form factor code. The context marker must already be cleared.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Undefined,
            0x01 => Self::UsbAKeychain,
            0x02 => Self::UsbANano,
            0x03 => Self::UsbCKeychain,
            0x04 => Self::UsbCNano,
            0x05 => Self::UsbCLightning,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Undefined => 0x00,
            Self::UsbAKeychain => 0x01,
            Self::UsbANano => 0x02,
            Self::UsbCKeychain => 0x03,
            Self::UsbCNano => 0x04,
            Self::UsbCLightning => 0x05,
            Self::Unknown(code) => *code,
        }
    }

    /// Connector and shape as used in record descriptions, e.g. `"USB Type A Keychain"`.
    ///
    /// `None` for codes that say nothing about the hardware.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            Self::Undefined => Some("of unknown form factor"),
            Self::UsbAKeychain => Some("USB Type A Keychain"),
            Self::UsbANano => Some("USB Type A Nano"),
            Self::UsbCKeychain => Some("USB Type C Keychain"),
            Self::UsbCNano => Some("USB Type C Nano"),
            Self::UsbCLightning => Some("USB Type C and Lightning"),
            Self::Unknown(_) => None,
        }
    }
}

pub fn is_vendor_extension(oid: &str) -> bool {
    // Literal prefix, so a sibling arc like 1.3.6.1.4.1.41482.30 counts as well.
    oid.starts_with(YUBICO_OID_PIV_ROOT)
}

pub fn has_vendor_extension(extensions: &BTreeMap<String, Vec<u8>>) -> bool {
    extensions.keys().any(|oid| is_vendor_extension(oid))
}

pub fn decode_firmware_version(bytes: &[u8]) -> Result<FirmwareVersion, DecodeError> {
    match bytes {
        [major, minor, patch] => Ok(FirmwareVersion {
            major: *major,
            minor: *minor,
            patch: *patch,
        }),
        _ => Err(DecodeError::InvalidLength {
            expected: 3,
            actual: bytes.len(),
        }),
    }
}

/// Decodes the serial number, a complete DER INTEGER with a short form length.
pub fn decode_serial_number(bytes: &[u8]) -> Result<u64, DecodeError> {
    let (tag, rest) = bytes.split_first().ok_or(DecodeError::Empty)?;
    if *tag != ASN1_INTEGER_TAG {
        return Err(DecodeError::UnexpectedTag(*tag));
    }
    let (length, content) = rest.split_first().ok_or(DecodeError::MissingLength)?;
    let declared = usize::from(*length);
    if declared != content.len() {
        return Err(DecodeError::LengthMismatch {
            declared,
            actual: content.len(),
        });
    }

    let significant = match content.iter().position(|b| *b != 0) {
        Some(start) => &content[start..],
        None => return Ok(0),
    };
    if significant.len() > 8 {
        return Err(DecodeError::IntegerTooLarge(significant.len()));
    }
    Ok(significant
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

pub fn decode_pin_touch_policy(bytes: &[u8]) -> Result<(PinPolicy, TouchPolicy), DecodeError> {
    match bytes {
        [pin, touch] => Ok((PinPolicy::from_code(*pin), TouchPolicy::from_code(*touch))),
        _ => Err(DecodeError::InvalidLength {
            expected: 2,
            actual: bytes.len(),
        }),
    }
}

pub fn decode_form_factor(bytes: &[u8]) -> Result<FormFactor, DecodeError> {
    match bytes {
        [code] => Ok(FormFactor::from_code(code & !FORM_FACTOR_CONTEXT_TAG)),
        _ => Err(DecodeError::InvalidLength {
            expected: 1,
            actual: bytes.len(),
        }),
    }
}

/// Everything the vendor extensions of one certificate say about the token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VendorExtensions {
    pub firmware_version: Option<FirmwareVersion>,
    pub serial_number: Option<u64>,
    pub pin_policy: Option<PinPolicy>,
    pub touch_policy: Option<TouchPolicy>,
    pub form_factor: Option<FormFactor>,
    pub is_fips_validated: bool,
}

impl VendorExtensions {
    /// Decodes every vendor extension present in `extensions`. Absent ones stay empty.
    pub fn decode(extensions: &BTreeMap<String, Vec<u8>>) -> Result<Self, Error> {
        let (pin_policy, touch_policy) =
            decode_with(extensions, YUBICO_OID_PIN_TOUCH_POLICY, decode_pin_touch_policy)?.unzip();

        Ok(Self {
            firmware_version: decode_with(
                extensions,
                YUBICO_OID_FIRMWARE_VERSION,
                decode_firmware_version,
            )?,
            serial_number: decode_with(extensions, YUBICO_OID_SERIAL_NUMBER, decode_serial_number)?,
            pin_policy,
            touch_policy,
            form_factor: decode_with(extensions, YUBICO_OID_FORM_FACTOR, decode_form_factor)?,
            is_fips_validated: extensions.contains_key(YUBICO_OID_FIPS_VALIDATED),
        })
    }
}

fn decode_with<T>(
    extensions: &BTreeMap<String, Vec<u8>>,
    oid: &'static str,
    decode: fn(&[u8]) -> Result<T, DecodeError>,
) -> Result<Option<T>, Error> {
    extensions
        .get(oid)
        .map(|bytes| decode(bytes).map_err(|reason| Error::InvalidExtensionEncoding { oid, reason }))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn extensions(entries: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
        entries
            .iter()
            .map(|(oid, value)| (oid.to_string(), value.to_vec()))
            .collect()
    }

    #[test]
    fn test_firmware_version() {
        let version = decode_firmware_version(&hex!("050402")).unwrap();
        assert_eq!(
            version,
            FirmwareVersion {
                major: 5,
                minor: 4,
                patch: 2
            }
        );
        assert_eq!(version.to_string(), "5.4.2");
        assert_eq!(
            decode_firmware_version(&hex!("ff0010")).unwrap().to_string(),
            "255.0.16"
        );
        assert_eq!(
            decode_firmware_version(&hex!("0504")),
            Err(DecodeError::InvalidLength {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_serial_number() {
        assert_eq!(decode_serial_number(&hex!("020400c7a4b1")), Ok(13083825));
        assert_eq!(decode_serial_number(&hex!("0203abcdef")), Ok(11259375));
        assert_eq!(decode_serial_number(&hex!("0200")), Ok(0));
        assert_eq!(
            decode_serial_number(&hex!("020900ffffffffffffffff")),
            Ok(u64::MAX)
        );
    }

    #[test]
    fn test_serial_number_malformed() {
        assert_eq!(decode_serial_number(&[]), Err(DecodeError::Empty));
        assert_eq!(
            decode_serial_number(&hex!("02")),
            Err(DecodeError::MissingLength)
        );
        assert_eq!(
            decode_serial_number(&hex!("040400c7a4b1")),
            Err(DecodeError::UnexpectedTag(0x04))
        );
        assert_eq!(
            decode_serial_number(&hex!("020500c7a4b1")),
            Err(DecodeError::LengthMismatch {
                declared: 5,
                actual: 4
            })
        );
        assert_eq!(
            decode_serial_number(&hex!("0209010000000000000000")),
            Err(DecodeError::IntegerTooLarge(9))
        );
    }

    #[test]
    fn test_pin_touch_policy() {
        assert_eq!(
            decode_pin_touch_policy(&hex!("0202")),
            Ok((PinPolicy::OncePerSession, TouchPolicy::Always))
        );
        assert_eq!(
            decode_pin_touch_policy(&hex!("0303")),
            Ok((PinPolicy::Always, TouchPolicy::CachedFor15s))
        );
        assert_eq!(
            decode_pin_touch_policy(&hex!("0709")),
            Ok((PinPolicy::Unknown(7), TouchPolicy::Unknown(9)))
        );
        assert_eq!(
            decode_pin_touch_policy(&hex!("02")),
            Err(DecodeError::InvalidLength {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(PinPolicy::Unknown(7).to_string(), "unknown or invalid");
        assert_eq!(PinPolicy::from_code(0x01).code(), 0x01);
    }

    #[test]
    fn test_form_factor() {
        assert_eq!(decode_form_factor(&hex!("81")), Ok(FormFactor::UsbAKeychain));
        assert_eq!(decode_form_factor(&hex!("01")), Ok(FormFactor::UsbAKeychain));
        assert_eq!(decode_form_factor(&hex!("85")), Ok(FormFactor::UsbCLightning));
        assert_eq!(decode_form_factor(&hex!("80")), Ok(FormFactor::Undefined));
        assert_eq!(decode_form_factor(&hex!("86")), Ok(FormFactor::Unknown(6)));
        assert_eq!(
            decode_form_factor(&hex!("0101")),
            Err(DecodeError::InvalidLength {
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(FormFactor::Unknown(6).description(), None);
    }

    #[test]
    fn test_vendor_extension_prefix() {
        assert!(is_vendor_extension("1.3.6.1.4.1.41482.3.3"));
        assert!(is_vendor_extension("1.3.6.1.4.1.41482.3"));
        assert!(is_vendor_extension("1.3.6.1.4.1.41482.30"));
        assert!(!is_vendor_extension("1.3.6.1.4.1.41482.2"));
        assert!(!is_vendor_extension("2.5.29.19"));

        assert!(has_vendor_extension(&extensions(&[
            ("2.5.29.19", &hex!("3000")[..]),
            ("1.3.6.1.4.1.41482.3.10", &hex!("0500")[..]),
        ])));
        assert!(!has_vendor_extension(&extensions(&[("2.5.29.19", &hex!("3000")[..])])));
    }

    #[test]
    fn test_decode_all() {
        let decoded = VendorExtensions::decode(&extensions(&[
            (YUBICO_OID_FIRMWARE_VERSION, &hex!("050403")[..]),
            (YUBICO_OID_SERIAL_NUMBER, &hex!("0204011e1a02")[..]),
            (YUBICO_OID_PIN_TOUCH_POLICY, &hex!("0303")[..]),
            (YUBICO_OID_FORM_FACTOR, &hex!("03")[..]),
            (YUBICO_OID_FIPS_VALIDATED, &hex!("0500")[..]),
        ]))
        .unwrap();

        assert_eq!(
            decoded,
            VendorExtensions {
                firmware_version: Some(FirmwareVersion {
                    major: 5,
                    minor: 4,
                    patch: 3
                }),
                serial_number: Some(18749954),
                pin_policy: Some(PinPolicy::Always),
                touch_policy: Some(TouchPolicy::CachedFor15s),
                form_factor: Some(FormFactor::UsbCKeychain),
                is_fips_validated: true,
            }
        );
    }

    #[test]
    fn test_decode_absent() {
        let decoded = VendorExtensions::decode(&extensions(&[(
            YUBICO_OID_FIRMWARE_VERSION,
            &hex!("050402")[..],
        )]))
        .unwrap();
        assert_eq!(decoded.serial_number, None);
        assert_eq!(decoded.pin_policy, None);
        assert_eq!(decoded.touch_policy, None);
        assert_eq!(decoded.form_factor, None);
        assert!(!decoded.is_fips_validated);
    }

    #[test]
    fn test_decode_reports_oid() {
        let err = VendorExtensions::decode(&extensions(&[(
            YUBICO_OID_SERIAL_NUMBER,
            &hex!("020500c7a4b1")[..],
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidExtensionEncoding {
                oid: YUBICO_OID_SERIAL_NUMBER,
                reason: DecodeError::LengthMismatch { .. }
            }
        ));
    }
}
