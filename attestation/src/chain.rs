//! Two-hop verification: trusted root -> attestation intermediate -> leaf.

use crate::{
    registry::{CaRegistry, TrustedCa},
    x509::X509Certificate,
    ChainLink, Error,
};

const LOG: &str = "attestation::chain";

pub struct ChainVerifier<'a> {
    registry: &'a CaRegistry,
}

impl<'a> ChainVerifier<'a> {
    pub fn new(registry: &'a CaRegistry) -> Self {
        Self { registry }
    }

    /// Verifies that `intermediate` was signed by one of the registry's roots and `leaf` by
    /// `intermediate`, returning the root the chain ends in.
    ///
    /// The root is picked by the intermediate's issuer common name, no other chain is tried.
    pub fn verify_chain(
        &self,
        leaf: &X509Certificate,
        intermediate: &X509Certificate,
    ) -> Result<&'a TrustedCa, Error> {
        let issued_by_intermediate = match (
            leaf.view().issuer_common_name(),
            intermediate.view().subject_common_name(),
        ) {
            (Some(issuer), Some(subject)) => issuer == subject,
            _ => false,
        };
        if !issued_by_intermediate {
            return Err(Error::ChainVerificationFailed(
                ChainLink::LeafNotIssuedByIntermediate,
            ));
        }

        let root_name = format!(
            "CN = {}",
            intermediate.view().issuer_common_name().unwrap_or_default()
        );
        let root = self.registry.load_by_name(&root_name)?;

        intermediate
            .verify_signed_by(root.anchor())
            .map_err(|e| {
                log::debug!(
                    target: LOG,
                    "intermediate {} rejected by {}: {:?}",
                    intermediate.serial_number(),
                    root.id(),
                    e
                );
                Error::ChainVerificationFailed(ChainLink::IntermediateNotSignedByRoot)
            })?;

        leaf.verify_signed_by(intermediate).map_err(|e| {
            log::debug!(
                target: LOG,
                "leaf {} rejected by intermediate {}: {:?}",
                leaf.serial_number(),
                intermediate.serial_number(),
                e
            );
            Error::ChainVerificationFailed(ChainLink::LeafNotSignedByIntermediate)
        })?;

        log::debug!(target: LOG, "chain verified up to {}", root.id());
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures::*, registry::CaId, CaLookup};

    fn parse(pem: &str) -> X509Certificate {
        X509Certificate::from_pem_or_der(pem.as_bytes()).expect("fixture parses")
    }

    #[test]
    fn test_valid_chains() {
        let registry = test_registry();
        let verifier = ChainVerifier::new(&registry);

        let root = verifier
            .verify_chain(&parse(YK_13083825_9A), &parse(YK_13083825_F9))
            .unwrap();
        assert_eq!(root.id(), CaId::PivV2);

        let root = verifier
            .verify_chain(&parse(YK_FIPS_9C), &parse(YK_FIPS_F9))
            .unwrap();
        assert_eq!(root.id(), CaId::PivPreview);
    }

    #[test]
    fn test_leaf_not_issued_by_intermediate() {
        let registry = test_registry();
        let verifier = ChainVerifier::new(&registry);

        // the intermediate handed in as leaf names the root as issuer
        let err = verifier
            .verify_chain(&parse(YK_13083825_F9), &parse(YK_13083825_F9))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ChainVerificationFailed(ChainLink::LeafNotIssuedByIntermediate)
        ));
    }

    #[test]
    fn test_unknown_root() {
        let registry = test_registry();
        let verifier = ChainVerifier::new(&registry);

        let err = verifier
            .verify_chain(&parse(YK_13083825_9A), &parse(UNKNOWN_ROOT_F9))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CaNotFound(CaLookup::Name(name)) if name == "CN = Some Other Root"
        ));
    }

    #[test]
    fn test_intermediate_not_signed_by_root() {
        let registry = test_registry();
        let verifier = ChainVerifier::new(&registry);

        let err = verifier
            .verify_chain(&parse(YK_13083825_9A), &parse(ROGUE_F9))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ChainVerificationFailed(ChainLink::IntermediateNotSignedByRoot)
        ));
    }

    #[test]
    fn test_leaf_not_signed_by_intermediate() {
        let registry = test_registry();
        let verifier = ChainVerifier::new(&registry);

        let err = verifier
            .verify_chain(&parse(YK_13083825_9A), &parse(YK_OTHER_F9))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ChainVerificationFailed(ChainLink::LeafNotSignedByIntermediate)
        ));
    }
}
