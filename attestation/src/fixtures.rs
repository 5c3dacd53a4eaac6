//! Certificates generated by `res/test/generate.sh`.

pub const CA_PIV_V2: &str = include_str!("../res/test/ca_piv_v2.pem");
pub const CA_PIV_PREVIEW: &str = include_str!("../res/test/ca_piv_preview.pem");
pub const CA_U2F: &str = include_str!("../res/test/ca_u2f.pem");
pub const ROGUE_ROOT: &str = include_str!("../res/test/rogue_root.pem");

/// Intermediate of YubiKey 13083825, RSA, issued by the PIV v2 root.
pub const YK_13083825_F9: &str = include_str!("../res/test/yk_13083825_f9.pem");
/// Slot 9a of YubiKey 13083825, P-256 key, firmware 5.4.2.
pub const YK_13083825_9A: &str = include_str!("../res/test/yk_13083825_9a.pem");
/// Unrelated intermediate with the same subject as [YK_13083825_F9].
pub const YK_OTHER_F9: &str = include_str!("../res/test/yk_other_f9.pem");
/// Intermediate issued by a root outside the registry.
pub const UNKNOWN_ROOT_F9: &str = include_str!("../res/test/unknown_root_f9.pem");
/// Intermediate issued by [ROGUE_ROOT], naming the PIV v2 root as its issuer.
pub const ROGUE_F9: &str = include_str!("../res/test/rogue_f9.pem");

/// P-256 intermediate issued with ecdsa-with-SHA384 by the preview root.
pub const YK_FIPS_F9: &str = include_str!("../res/test/yk_fips_f9.pem");
/// Slot 9c, RSA key, FIPS flagged, USB-C keychain, serial 18749954.
pub const YK_FIPS_9C: &str = include_str!("../res/test/yk_fips_9c.pem");

pub const NOT_YUBIKEY: &str = include_str!("../res/test/not_yubikey.pem");
pub const UNKNOWN_SUBJECT: &str = include_str!("../res/test/unknown_subject.pem");
pub const INVALID_SLOT: &str = include_str!("../res/test/invalid_slot.pem");
pub const BAD_SERIAL: &str = include_str!("../res/test/bad_serial.pem");
pub const NO_EXTENSIONS: &str = include_str!("../res/test/no_extensions.pem");

/// RSA root outside the registry and a leaf it signed whose signature value starts with `00`.
pub const SHORT_SIG_ROOT: &str = include_str!("../res/test/short_sig_root.pem");
pub const SHORT_SIG_LEAF: &str = include_str!("../res/test/short_sig_leaf.pem");

use crate::registry::{CaId, CaRegistry};

pub fn test_registry() -> CaRegistry {
    CaRegistry::from_pem_sources([
        (CaId::PivV2, CA_PIV_V2),
        (CaId::PivPreview, CA_PIV_PREVIEW),
        (CaId::U2f, CA_U2F),
    ])
    .expect("fixture anchors load")
}
