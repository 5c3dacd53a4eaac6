use crate::{extensions::DecodeError, registry::CaId, x509::error::ValidationError};
use core::fmt;
use std::path::PathBuf;

/// How a root was looked up when it could not be found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaLookup {
    Id(u8),
    Name(String),
}

impl fmt::Display for CaLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaLookup::Id(id) => write!(f, "id {:#04x}", id),
            CaLookup::Name(name) => write!(f, "subject {:?}", name),
        }
    }
}

/// The link of the root -> intermediate -> leaf chain that did not hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainLink {
    /// The leaf names someone else than the intermediate as its issuer
    LeafNotIssuedByIntermediate,
    /// The root's key did not sign the intermediate
    IntermediateNotSignedByRoot,
    /// The intermediate's key did not sign the leaf
    LeafNotSignedByIntermediate,
}

impl fmt::Display for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainLink::LeafNotIssuedByIntermediate => {
                "the leaf was not issued by the intermediate"
            }
            ChainLink::IntermediateNotSignedByRoot => {
                "the intermediate is not signed by the root"
            }
            ChainLink::LeafNotSignedByIntermediate => {
                "the leaf is not signed by the intermediate"
            }
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no trusted root with {0}")]
    CaNotFound(CaLookup),
    #[error("trusted root {id} could not be loaded: {reason}")]
    AnchorLoad { id: CaId, reason: String },
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Config(#[from] serde_json::Error),
    #[error("the certificate supplied is invalid: {0}")]
    InvalidCertificate(#[from] ValidationError),
    #[error("the certificate supplied is missing the required extensions")]
    CertificateMissingExtensions,
    #[error("the certificate supplied is missing any YubiKey extensions")]
    NotYubikeyCertificate,
    #[error("extension {oid} is malformed: {reason}")]
    InvalidExtensionEncoding {
        oid: &'static str,
        reason: DecodeError,
    },
    #[error("chain verification failed: {0}")]
    ChainVerificationFailed(ChainLink),
    #[error("the certificate has an unknown type")]
    UnknownCertificateType,
    #[error("{0:?} is not a PIV key reference")]
    InvalidKeyReference(String),
}

impl Error {
    pub fn log_error(&self) {
        log::error!(target: "attestation", "{}", self);
    }
}
