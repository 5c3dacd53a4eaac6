//! Verification of YubiKey PIV attestation certificates.
//!
//! A YubiKey attests a key by issuing a leaf certificate for it, signed by the per-device
//! intermediate in slot `f9`, which in turn is signed by one of Yubico's roots. Verifying the
//! chain and decoding the vendor extensions of the leaf yields an [AttestationRecord].

pub mod chain;
pub mod classifier;
mod error;
pub mod extensions;
pub mod factory;
pub mod key_reference;
pub mod record;
pub mod registry;
pub mod x509;

#[cfg(test)]
mod fixtures;

pub use chain::ChainVerifier;
pub use error::*;
pub use factory::AttestationCertificateFactory;
pub use record::{AttestationRecord, CertificateRole, CertificateType};
pub use registry::{CaId, CaRegistry, RegistryConfig, TrustedCa};
