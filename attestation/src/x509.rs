//! Just enough X.509 to read attestation certificates: the subject and issuer names, the
//! extension map and the signature over the `tbsCertificate`.

pub mod asn;
pub mod error;

use asn::*;
use asn1::{oid, ObjectIdentifier, SequenceOf, Tlv};
use core::fmt;
use error::ValidationError;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use rsa::{pkcs1v15, signature::Verifier, BigUint, RsaPublicKey};
use sha2::{digest::const_oid::AssociatedOid, Digest};
use std::collections::BTreeMap;

const SHA256_WITH_RSA_ALGORITHM: ObjectIdentifier = oid!(1, 2, 840, 113549, 1, 1, 11);
const SHA384_WITH_RSA_ALGORITHM: ObjectIdentifier = oid!(1, 2, 840, 113549, 1, 1, 12);
const SHA512_WITH_RSA_ALGORITHM: ObjectIdentifier = oid!(1, 2, 840, 113549, 1, 1, 13);
const ECDSA_WITH_SHA256_ALGORITHM: ObjectIdentifier = oid!(1, 2, 840, 10045, 4, 3, 2); // https://oidref.com/1.2.840.10045.4.3.2
const ECDSA_WITH_SHA384_ALGORITHM: ObjectIdentifier = oid!(1, 2, 840, 10045, 4, 3, 3); // https://oidref.com/1.2.840.10045.4.3.3
const ECDSA_WITH_SHA512_ALGORITHM: ObjectIdentifier = oid!(1, 2, 840, 10045, 4, 3, 4);

const SIGNATURE_ALGORITHMS: [ObjectIdentifier; 6] = [
    SHA256_WITH_RSA_ALGORITHM,
    SHA384_WITH_RSA_ALGORITHM,
    SHA512_WITH_RSA_ALGORITHM,
    ECDSA_WITH_SHA256_ALGORITHM,
    ECDSA_WITH_SHA384_ALGORITHM,
    ECDSA_WITH_SHA512_ALGORITHM,
];

const RSA_PBK: ObjectIdentifier = oid!(1, 2, 840, 113549, 1, 1, 1);
const ECDSA_PBK: ObjectIdentifier = oid!(1, 2, 840, 10045, 2, 1);

const CURVE_P256: ObjectIdentifier = oid!(1, 2, 840, 10045, 3, 1, 7);
const CURVE_P384: ObjectIdentifier = oid!(1, 3, 132, 0, 34);

/// Short names used when rendering distinguished names, matching OpenSSL's.
const NAME_ATTRIBUTES: [(ObjectIdentifier, &str); 9] = [
    (oid!(2, 5, 4, 3), "CN"),
    (oid!(2, 5, 4, 6), "C"),
    (oid!(2, 5, 4, 7), "L"),
    (oid!(2, 5, 4, 8), "ST"),
    (oid!(2, 5, 4, 10), "O"),
    (oid!(2, 5, 4, 11), "OU"),
    (oid!(2, 5, 4, 5), "serialNumber"),
    (oid!(2, 5, 4, 12), "title"),
    (oid!(1, 2, 840, 113549, 1, 9, 1), "emailAddress"),
];

const COMMON_NAME: &str = "CN";

// Universal tags of the string types found in names.
const UTF8_STRING: u8 = 0x0c;
const NUMERIC_STRING: u8 = 0x12;
const PRINTABLE_STRING: u8 = 0x13;
const T61_STRING: u8 = 0x14;
const IA5_STRING: u8 = 0x16;
const VISIBLE_STRING: u8 = 0x1a;
const UNIVERSAL_STRING: u8 = 0x1c;
const BMP_STRING: u8 = 0x1e;

/// The parts of a certificate the attestation checks look at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateView {
    /// Subject attributes in encoding order, keyed by short name (`CN`, `O`, ...).
    pub subject: Vec<(String, String)>,
    /// Issuer attributes in encoding order.
    pub issuer: Vec<(String, String)>,
    /// Extensions keyed by dotted OID, valued with the raw `extnValue` contents.
    pub extensions: BTreeMap<String, Vec<u8>>,
}

impl CertificateView {
    pub fn subject_common_name(&self) -> Option<&str> {
        attribute(&self.subject, COMMON_NAME)
    }

    pub fn issuer_common_name(&self) -> Option<&str> {
        attribute(&self.issuer, COMMON_NAME)
    }

    /// The subject as `"CN = value, O = value"`.
    pub fn subject_string(&self) -> String {
        format_name(&self.subject)
    }

    pub fn issuer_string(&self) -> String {
        format_name(&self.issuer)
    }

    pub fn has_extensions(&self) -> bool {
        !self.extensions.is_empty()
    }

    pub fn extension(&self, oid: &str) -> Option<&[u8]> {
        self.extensions.get(oid).map(Vec::as_slice)
    }
}

fn attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn format_name(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!("{} = {}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A parsed certificate that owns its encoding.
#[derive(Clone)]
pub struct X509Certificate {
    view: CertificateView,
    serial_number: String,
    tbs_certificate: Vec<u8>,
    signature_algorithm: ObjectIdentifier,
    payload_signature_algorithm: ObjectIdentifier,
    signature: Vec<u8>,
    subject_public_key_info: Vec<u8>,
}

impl X509Certificate {
    /// Parses a DER encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, ValidationError> {
        let cert = asn1::parse_single::<Certificate>(der)?;
        let payload = asn1::parse_single::<CertificateRawPayload>(der)?;
        let tbs = &cert.tbs_certificate;

        let view = CertificateView {
            subject: name_attributes(&tbs.subject)?,
            issuer: name_attributes(&tbs.issuer)?,
            extensions: extension_map(tbs.extensions.clone()),
        };
        let subject_public_key_info = asn1::write_single(&tbs.subject_public_key_info)
            .map_err(|_| ValidationError::ParseError)?;

        Ok(Self {
            view,
            serial_number: hex::encode(tbs.serial_number.as_bytes()),
            tbs_certificate: payload.tbs_certificate.full_data().to_vec(),
            signature_algorithm: cert.signature_algorithm.algorithm.clone(),
            payload_signature_algorithm: tbs.signature.algorithm.clone(),
            signature: cert.signature_value.as_bytes().to_vec(),
            subject_public_key_info,
        })
    }

    /// Parses a certificate that is either PEM armored or plain DER. Text around the PEM block,
    /// such as the `subject=` lines `openssl x509 -text` writes, is skipped.
    pub fn from_pem_or_der(input: &[u8]) -> Result<Self, ValidationError> {
        if !is_pem(input) {
            return Self::from_der(input);
        }
        let block = pem::parse(input)?;
        if block.tag() != "CERTIFICATE" {
            return Err(ValidationError::UnexpectedPemLabel(block.tag().to_owned()));
        }
        Self::from_der(block.contents())
    }

    pub fn view(&self) -> &CertificateView {
        &self.view
    }

    /// Hex encoding of the certificate serial number, for diagnostics.
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn public_key(&self) -> Result<PublicKey, ValidationError> {
        let info = asn1::parse_single::<SubjectPublicKeyInfo>(&self.subject_public_key_info)?;
        PublicKey::parse(&info)
    }

    /// Checks that `issuer`'s key produced the signature on this certificate.
    pub fn verify_signed_by(&self, issuer: &X509Certificate) -> Result<(), ValidationError> {
        let pbk = issuer.public_key()?;
        validate(self, &pbk)
    }
}

impl fmt::Debug for X509Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X509Certificate")
            .field("subject", &self.view.subject_string())
            .field("issuer", &self.view.issuer_string())
            .field("serial_number", &self.serial_number)
            .finish()
    }
}

fn is_pem(input: &[u8]) -> bool {
    input.windows(PEM_BEGIN.len()).any(|window| window == PEM_BEGIN)
}

const PEM_BEGIN: &[u8] = b"-----BEGIN";

fn name_attributes(name: &Name) -> Result<Vec<(String, String)>, ValidationError> {
    let Name::RDNSequence(rdns) = name;
    rdns.clone()
        .flatten()
        .map(|attribute| {
            let key = NAME_ATTRIBUTES
                .iter()
                .find(|(oid, _)| *oid == attribute.typ)
                .map(|(_, short)| (*short).to_owned())
                .unwrap_or_else(|| attribute.typ.to_string());
            match decode_string(&attribute.value) {
                Some(value) => Ok((key, value)),
                None => Err(ValidationError::InvalidNameAttribute(key)),
            }
        })
        .collect()
}

/// Decodes a name attribute value. Values that are not strings render as `#` and their hex
/// encoded DER, as OpenSSL prints them.
fn decode_string(value: &Tlv<'_>) -> Option<String> {
    let Some(tag) = value.tag().as_u8() else {
        return Some(format!("#{}", hex::encode(value.full_data())));
    };
    match tag {
        UTF8_STRING | NUMERIC_STRING | PRINTABLE_STRING | IA5_STRING | VISIBLE_STRING => {
            core::str::from_utf8(value.data()).ok().map(str::to_owned)
        }
        // Latin-1, like OpenSSL reads it
        T61_STRING => Some(value.data().iter().map(|&b| char::from(b)).collect()),
        BMP_STRING => {
            let units = value.parse::<asn1::BMPString>().ok()?.as_utf16_be_bytes();
            char::decode_utf16(
                units
                    .chunks_exact(2)
                    .map(|unit| u16::from_be_bytes([unit[0], unit[1]])),
            )
            .collect::<Result<String, _>>()
            .ok()
        }
        UNIVERSAL_STRING => value
            .parse::<asn1::UniversalString>()
            .ok()?
            .as_utf32_be_bytes()
            .chunks_exact(4)
            .map(|unit| char::from_u32(u32::from_be_bytes([unit[0], unit[1], unit[2], unit[3]])))
            .collect(),
        _ => Some(format!("#{}", hex::encode(value.full_data()))),
    }
}

fn extension_map<'a>(
    extensions: Option<SequenceOf<'a, Extension<'a>>>,
) -> BTreeMap<String, Vec<u8>> {
    extensions
        .into_iter()
        .flatten()
        .map(|extension| (extension.extn_id.to_string(), extension.extn_value.to_vec()))
        .collect()
}

#[derive(Clone)]
pub enum PublicKey {
    RSA(RsaPublicKey),
    ECDSA(ECDSACurve),
}

#[derive(Clone)]
pub enum ECDSACurve {
    CurveP256(p256::ecdsa::VerifyingKey),
    CurveP384(p384::ecdsa::VerifyingKey),
}

impl PublicKey {
    fn parse(info: &SubjectPublicKeyInfo) -> Result<Self, ValidationError> {
        match &info.algorithm.algorithm {
            &RSA_PBK => {
                let pbk = parse_rsa_pbk(info.subject_public_key.as_bytes())?;
                Ok(PublicKey::RSA(pbk))
            }
            &ECDSA_PBK => {
                let pbk_param = info
                    .algorithm
                    .parameters
                    .ok_or(ValidationError::MissingECDSAAlgorithmTyp)?;
                let typ = asn1::parse_single::<ObjectIdentifier>(pbk_param.full_data())?;
                let encoded = info.subject_public_key.as_bytes();
                match typ {
                    CURVE_P256 => {
                        let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(encoded)
                            .or(Err(ValidationError::ParseP256PublicKey))?;
                        Ok(PublicKey::ECDSA(ECDSACurve::CurveP256(verifying_key)))
                    }
                    CURVE_P384 => {
                        let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(encoded)
                            .or(Err(ValidationError::ParseP384PublicKey))?;
                        Ok(PublicKey::ECDSA(ECDSACurve::CurveP384(verifying_key)))
                    }
                    other => Err(ValidationError::UnsupportedPublicKeyAlgorithm(format!(
                        "EC curve {}",
                        other
                    ))),
                }
            }
            other => Err(ValidationError::UnsupportedPublicKeyAlgorithm(
                other.to_string(),
            )),
        }
    }
}

fn parse_rsa_pbk(data: &[u8]) -> Result<RsaPublicKey, ValidationError> {
    let pbk = asn1::parse_single::<RSAPublicKey>(data)?;
    RsaPublicKey::new(
        BigUint::from_bytes_be(pbk.modulus.as_bytes()),
        BigUint::from_bytes_be(pbk.exponent.as_bytes()),
    )
    .or(Err(ValidationError::ParseRSAPublicKey))
}

fn validate(cert: &X509Certificate, pbk: &PublicKey) -> Result<(), ValidationError> {
    if cert.signature_algorithm != cert.payload_signature_algorithm {
        return Err(ValidationError::SignatureMismatch);
    }
    let payload = cert.tbs_certificate.as_slice();
    let signature = cert.signature.as_slice();
    match (&cert.signature_algorithm, pbk) {
        (&SHA256_WITH_RSA_ALGORITHM, PublicKey::RSA(pbk)) => {
            validate_rsa::<sha2::Sha256>(payload, signature, pbk)
        }
        (&SHA384_WITH_RSA_ALGORITHM, PublicKey::RSA(pbk)) => {
            validate_rsa::<sha2::Sha384>(payload, signature, pbk)
        }
        (&SHA512_WITH_RSA_ALGORITHM, PublicKey::RSA(pbk)) => {
            validate_rsa::<sha2::Sha512>(payload, signature, pbk)
        }
        (&ECDSA_WITH_SHA256_ALGORITHM, PublicKey::ECDSA(curve)) => {
            validate_ecdsa::<sha2::Sha256>(payload, signature, curve)
        }
        (&ECDSA_WITH_SHA384_ALGORITHM, PublicKey::ECDSA(curve)) => {
            validate_ecdsa::<sha2::Sha384>(payload, signature, curve)
        }
        (&ECDSA_WITH_SHA512_ALGORITHM, PublicKey::ECDSA(curve)) => {
            validate_ecdsa::<sha2::Sha512>(payload, signature, curve)
        }
        (algorithm, _) if SIGNATURE_ALGORITHMS.contains(algorithm) => {
            Err(ValidationError::KeyAlgorithmMismatch)
        }
        (algorithm, _) => Err(ValidationError::UnsupportedSignatureAlgorithm(
            algorithm.to_string(),
        )),
    }
}

/// RSASSA-PKCS1-v1_5 verification, [RFC 8017 section 8.2.2](https://www.rfc-editor.org/rfc/rfc8017#section-8.2.2).
fn validate_rsa<D>(
    payload: &[u8],
    signature: &[u8],
    pbk: &RsaPublicKey,
) -> Result<(), ValidationError>
where
    D: Digest + AssociatedOid,
{
    let verifying_key = pkcs1v15::VerifyingKey::<D>::new(pbk.clone());
    let signature = pkcs1v15::Signature::try_from(signature)
        .or(Err(ValidationError::InvalidSignatureEncoding))?;
    verifying_key
        .verify(payload, &signature)
        .or(Err(ValidationError::InvalidSignature))
}

fn validate_ecdsa<D>(
    payload: &[u8],
    signature: &[u8],
    curve: &ECDSACurve,
) -> Result<(), ValidationError>
where
    D: Digest,
{
    let hashed = D::digest(payload);
    match curve {
        ECDSACurve::CurveP256(verifying_key) => {
            let signature = p256::ecdsa::Signature::from_der(signature)
                .or(Err(ValidationError::InvalidSignatureEncoding))?;
            verifying_key
                .verify_prehash(&hashed[..], &signature)
                .or(Err(ValidationError::InvalidSignature))?;
        }
        ECDSACurve::CurveP384(verifying_key) => {
            let signature = p384::ecdsa::Signature::from_der(signature)
                .or(Err(ValidationError::InvalidSignatureEncoding))?;
            verifying_key
                .verify_prehash(&hashed[..], &signature)
                .or(Err(ValidationError::InvalidSignature))?;
        }
    };

    Ok(())
}
