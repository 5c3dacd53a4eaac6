//! The fixed set of Yubico roots attestation chains may end in.

use crate::{x509::X509Certificate, CaLookup, Error};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

const LOG: &str = "attestation::registry";

/// Identifies one of the Yubico attestation roots.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum CaId {
    /// Version 2 of the YubiKey PIV attestation root
    PivV2 = 0x01,
    /// Preview version of the YubiKey PIV attestation root
    PivPreview = 0x02,
    /// YubiKey U2F attestation root
    U2f = 0x03,
}

impl CaId {
    pub const ALL: [CaId; 3] = [CaId::PivV2, CaId::PivPreview, CaId::U2f];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ca| ca.id() == id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Subject of the root, formatted the way certificate views render names.
    pub fn subject(self) -> &'static str {
        match self {
            CaId::PivV2 => "CN = Yubico PIV Root CA Serial 263751",
            CaId::PivPreview => "CN = Yubico PIV Preview CA",
            CaId::U2f => "CN = Yubico U2F Root CA Serial 457200631",
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            CaId::PivV2 => "yubikey-attest-v2.pem",
            CaId::PivPreview => "yubikey-piv-preview.pem",
            CaId::U2f => "yubikey-u2f.pem",
        }
    }

    fn from_subject(subject: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ca| ca.subject() == subject)
    }
}

impl fmt::Display for CaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:#04x})", self, self.id())
    }
}

/// A root certificate together with the registry entry it was loaded for.
#[derive(Clone, Debug)]
pub struct TrustedCa {
    id: CaId,
    anchor: X509Certificate,
}

impl TrustedCa {
    pub fn id(&self) -> CaId {
        self.id
    }

    pub fn subject(&self) -> &'static str {
        self.id.subject()
    }

    pub fn anchor(&self) -> &X509Certificate {
        &self.anchor
    }
}

/// Where the anchors are read from.
///
/// ```json
/// { "resourceDir": "res", "files": { "pivPreview": "preview.pem" } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    pub resource_dir: PathBuf,
    /// Overrides of [CaId::default_file_name], relative to `resource_dir`.
    #[serde(default)]
    pub files: BTreeMap<CaId, PathBuf>,
}

impl RegistryConfig {
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            files: BTreeMap::new(),
        }
    }

    /// Reads a JSON config. A relative `resourceDir` is taken relative to the file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: RegistryConfig = serde_json::from_slice(&content)?;
        if config.resource_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.resource_dir = parent.join(&config.resource_dir);
            }
        }
        Ok(config)
    }

    pub fn anchor_path(&self, id: CaId) -> PathBuf {
        match self.files.get(&id) {
            Some(file) => self.resource_dir.join(file),
            None => self.resource_dir.join(id.default_file_name()),
        }
    }
}

/// Immutable after construction, shared by reference between verifications.
#[derive(Clone, Debug)]
pub struct CaRegistry {
    anchors: BTreeMap<CaId, TrustedCa>,
}

impl CaRegistry {
    /// Reads every anchor from the locations named by `config`.
    pub fn load(config: &RegistryConfig) -> Result<Self, Error> {
        let mut sources = Vec::with_capacity(CaId::ALL.len());
        for id in CaId::ALL {
            let path = config.anchor_path(id);
            log::debug!(target: LOG, "loading anchor {} from {}", id, path.display());
            let content = fs::read(&path).map_err(|source| Error::Io { path, source })?;
            sources.push((id, content));
        }
        Self::from_pem_sources(sources)
    }

    /// Builds the registry from PEM or DER encoded anchors. Every [CaId] has to be supplied once.
    pub fn from_pem_sources<I, B>(sources: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (CaId, B)>,
        B: AsRef<[u8]>,
    {
        let mut anchors = BTreeMap::new();
        for (id, source) in sources {
            let anchor = X509Certificate::from_pem_or_der(source.as_ref()).map_err(|e| {
                Error::AnchorLoad {
                    id,
                    reason: e.to_string(),
                }
            })?;
            let subject = anchor.view().subject_string();
            if subject != id.subject() {
                return Err(Error::AnchorLoad {
                    id,
                    reason: format!("subject {:?} does not match {:?}", subject, id.subject()),
                });
            }
            if anchors.insert(id, TrustedCa { id, anchor }).is_some() {
                return Err(Error::AnchorLoad {
                    id,
                    reason: "anchor supplied more than once".to_owned(),
                });
            }
        }

        if let Some(id) = CaId::ALL.into_iter().find(|id| !anchors.contains_key(id)) {
            return Err(Error::AnchorLoad {
                id,
                reason: "no anchor supplied".to_owned(),
            });
        }

        log::info!(target: LOG, "loaded {} trusted roots", anchors.len());
        Ok(Self { anchors })
    }

    pub fn load_by_id(&self, id: u8) -> Result<&TrustedCa, Error> {
        CaId::from_id(id)
            .and_then(|ca| self.anchors.get(&ca))
            .ok_or(Error::CaNotFound(CaLookup::Id(id)))
    }

    /// Looks up a root by its exact subject, e.g. `"CN = Yubico PIV Preview CA"`.
    pub fn load_by_name(&self, subject: &str) -> Result<&TrustedCa, Error> {
        CaId::from_subject(subject)
            .and_then(|ca| self.anchors.get(&ca))
            .ok_or_else(|| Error::CaNotFound(CaLookup::Name(subject.to_owned())))
    }

    /// Whether `subject` names one of the roots, i.e. whether [CaRegistry::load_by_name] finds it.
    pub fn handles_subject(subject: &str) -> bool {
        CaId::from_subject(subject).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrustedCa> {
        self.anchors.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn test_lookup() {
        let registry = test_registry();

        let v2 = registry.load_by_id(1).unwrap();
        assert_eq!(v2.id(), CaId::PivV2);
        assert_eq!(v2.subject(), "CN = Yubico PIV Root CA Serial 263751");
        assert_eq!(
            v2.anchor().view().subject_common_name(),
            Some("Yubico PIV Root CA Serial 263751")
        );
        assert_eq!(registry.load_by_id(2).unwrap().id(), CaId::PivPreview);
        assert_eq!(registry.load_by_id(3).unwrap().id(), CaId::U2f);

        let preview = registry.load_by_name("CN = Yubico PIV Preview CA").unwrap();
        assert_eq!(preview.id(), CaId::PivPreview);
        assert_eq!(registry.iter().count(), 3);
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = test_registry();

        for id in [0, 4, 0xff] {
            assert!(matches!(
                registry.load_by_id(id),
                Err(Error::CaNotFound(CaLookup::Id(i))) if i == id
            ));
        }
        for name in [
            "Yubico PIV Preview CA",
            "CN = yubico piv preview ca",
            "CN = Yubico PIV Preview CA ",
            "",
        ] {
            assert!(matches!(
                registry.load_by_name(name),
                Err(Error::CaNotFound(CaLookup::Name(_)))
            ));
            assert!(!CaRegistry::handles_subject(name));
        }
        assert!(CaRegistry::handles_subject(
            "CN = Yubico U2F Root CA Serial 457200631"
        ));
    }

    #[test]
    fn test_missing_anchor() {
        let err = CaRegistry::from_pem_sources([
            (CaId::PivV2, CA_PIV_V2),
            (CaId::PivPreview, CA_PIV_PREVIEW),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AnchorLoad { id: CaId::U2f, .. }));
    }

    #[test]
    fn test_anchor_with_wrong_subject() {
        let err = CaRegistry::from_pem_sources([
            (CaId::PivV2, CA_PIV_V2),
            (CaId::PivPreview, CA_U2F),
            (CaId::U2f, CA_U2F),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::AnchorLoad {
                id: CaId::PivPreview,
                ..
            }
        ));
    }

    #[test]
    fn test_unparsable_anchor() {
        let err = CaRegistry::from_pem_sources([
            (CaId::PivV2, "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n"),
            (CaId::PivPreview, CA_PIV_PREVIEW),
            (CaId::U2f, CA_U2F),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AnchorLoad { id: CaId::PivV2, .. }));
    }

    #[test]
    fn test_duplicate_anchor() {
        let err = CaRegistry::from_pem_sources([
            (CaId::PivV2, CA_PIV_V2),
            (CaId::PivV2, ROGUE_ROOT),
            (CaId::PivPreview, CA_PIV_PREVIEW),
            (CaId::U2f, CA_U2F),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AnchorLoad { id: CaId::PivV2, .. }));
    }

    #[test]
    fn test_load_from_config() {
        let config: RegistryConfig = serde_json::from_str(&format!(
            r#"{{
                "resourceDir": "{}/res/test",
                "files": {{
                    "pivV2": "ca_piv_v2.pem",
                    "pivPreview": "ca_piv_preview.pem",
                    "u2f": "ca_u2f.pem"
                }}
            }}"#,
            env!("CARGO_MANIFEST_DIR")
        ))
        .unwrap();
        assert_eq!(
            config.anchor_path(CaId::U2f),
            Path::new(env!("CARGO_MANIFEST_DIR")).join("res/test/ca_u2f.pem")
        );

        let registry = CaRegistry::load(&config).unwrap();
        assert_eq!(registry.iter().count(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let config = RegistryConfig::new(env!("CARGO_MANIFEST_DIR"));
        assert_eq!(
            config.anchor_path(CaId::PivV2),
            Path::new(env!("CARGO_MANIFEST_DIR")).join("yubikey-attest-v2.pem")
        );
        assert!(matches!(
            CaRegistry::load(&config),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CaRegistry>();
    }
}
