use asn1::{
    Asn1Read, Asn1Write, BitString, ObjectIdentifier, SequenceOf, SetOf, Tlv,
};

#[derive(Asn1Read, Asn1Write, Clone)]
/// Represents the root structure of a [X.509 v3 certificate](https://www.rfc-editor.org/rfc/rfc5280#section-4.1)
/// See how to map these to [asn1 structs](https://docs.rs/asn1/0.15.5/asn1/#structs)
pub struct Certificate<'a> {
    pub tbs_certificate: TBSCertificate<'a>,
    pub signature_algorithm: AlgorithmIdentifier<'a>,
    pub signature_value: BitString<'a>,
}

#[derive(Asn1Read, Asn1Write)]
/// As Certificate, represents the root structure of a [X.509 v3 certificate](https://www.rfc-editor.org/rfc/rfc5280#section-4.1).
/// This version does not decode the payload, the raw bytes are what the issuer signed.
pub struct CertificateRawPayload<'a> {
    pub tbs_certificate: Tlv<'a>,
    pub signature_algorithm: AlgorithmIdentifier<'a>,
    pub signature_value: BitString<'a>,
}

#[derive(Asn1Read, Asn1Write, Clone)]
/// [See RFC](https://www.rfc-editor.org/rfc/rfc5280#section-4.1.1.2)
pub struct AlgorithmIdentifier<'a> {
    pub algorithm: ObjectIdentifier,
    pub parameters: Option<Tlv<'a>>,
}

#[derive(Asn1Read, Asn1Write, Clone)]
pub struct TBSCertificate<'a> {
    #[explicit(0)]
    #[default(0u64)]
    pub version: u64,
    // Attestation leaves carry random serials, don't insist on a positive encoding.
    pub serial_number: asn1::BigInt<'a>,
    pub signature: AlgorithmIdentifier<'a>,
    // RFC: https://www.rfc-editor.org/rfc/rfc5280#section-4.1.2.4
    pub issuer: Name<'a>,
    pub validity: Validity,
    pub subject: Name<'a>,
    pub subject_public_key_info: SubjectPublicKeyInfo<'a>,
    // If present, version MUST be v2 or v3
    #[implicit(1)]
    pub issuer_unique_id: Option<BitString<'a>>,
    // If present, version MUST be v2 or v3
    #[implicit(2)]
    pub subject_unique_id: Option<BitString<'a>>,
    // If present, version MUST be v3
    #[explicit(3)]
    pub extensions: Option<SequenceOf<'a, Extension<'a>>>,
}

#[derive(asn1::Asn1Read, asn1::Asn1Write, Clone)]
pub enum Name<'a> {
    RDNSequence(RDNSequence<'a>),
}

pub type RDNSequence<'a> = SequenceOf<'a, RelativeDistinguishedName<'a>>;

pub type RelativeDistinguishedName<'a> = SetOf<'a, AttributeTypeAndValue<'a>>;

#[derive(Asn1Read, Asn1Write, Clone)]
pub struct AttributeTypeAndValue<'a> {
    pub typ: ObjectIdentifier,
    /// A value with the format defined by `typ`, in practice one of the ASN.1 string types.
    /// See https://www.rfc-editor.org/rfc/rfc5280#section-4.1.2.4
    pub value: Tlv<'a>,
}

#[derive(Asn1Read, Asn1Write, Clone)]
pub struct Validity {
    pub not_before: Time,
    pub not_after: Time,
}

#[derive(Asn1Read, Asn1Write, Clone)]
pub enum Time {
    UTCTime(asn1::UtcTime),
    GeneralizedTime(asn1::GeneralizedTime),
}

#[derive(Asn1Read, Asn1Write, Clone)]
pub struct SubjectPublicKeyInfo<'a> {
    pub algorithm: AlgorithmIdentifier<'a>,
    pub subject_public_key: BitString<'a>,
}

#[derive(Asn1Read, Asn1Write, Clone)]
pub struct Extension<'a> {
    pub extn_id: ObjectIdentifier,
    #[default(false)]
    pub critical: bool,
    /// contains the DER encoding of an ASN.1 value
    /// corresponding to the extension type identified by extnID
    pub extn_value: &'a [u8],
}

#[derive(asn1::Asn1Read, asn1::Asn1Write)]
pub struct RSAPublicKey<'a> {
    pub modulus: asn1::BigUint<'a>,
    pub exponent: asn1::BigUint<'a>,
}
