use asn1::ParseError;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The input is neither DER nor a PEM armored certificate
    #[error("the input is not a PEM or DER encoded certificate")]
    DecodeError,
    /// The PEM block does not contain a certificate
    #[error("unexpected PEM label {0:?}, expected \"CERTIFICATE\"")]
    UnexpectedPemLabel(String),
    /// Generic parse error
    #[error("the certificate could not be parsed as X.509")]
    ParseError,
    /// Error occured while parsing the P256 public key
    #[error("invalid P-256 public key")]
    ParseP256PublicKey,
    /// Error occured while parsing the P384 public key
    #[error("invalid P-384 public key")]
    ParseP384PublicKey,
    /// Error occured while parsing the RSA public key
    #[error("invalid RSA public key")]
    ParseRSAPublicKey,
    /// ECDSA Algorithm missing
    #[error("the EC public key does not name its curve")]
    MissingECDSAAlgorithmTyp,
    /// Signature has an invalid encoding
    #[error("the signature is not encoded correctly")]
    InvalidSignatureEncoding,
    /// Signature is invalid
    #[error("the signature does not verify")]
    InvalidSignature,
    /// A name attribute holds a string that does not decode
    #[error("name attribute {0} is not a valid string")]
    InvalidNameAttribute(String),
    /// Signature Algorithm is not supported
    #[error("unsupported signature algorithm {0}")]
    UnsupportedSignatureAlgorithm(String),
    /// Public Key Algorithm is not supported
    #[error("unsupported public key algorithm {0}")]
    UnsupportedPublicKeyAlgorithm(String),
    /// The issuer key is of a different family than the signature algorithm
    #[error("the issuer key cannot produce this kind of signature")]
    KeyAlgorithmMismatch,
    /// Specified signature algorithms do not match.
    ///
    /// The signature field in the sequence
    /// [tbsCertificate](https://www.rfc-editor.org/rfc/rfc5280#section-4.1.2.3)
    /// MUST contain the same algorithm identifier as the signatureAlgorithm
    /// field in the sequence
    /// [Certificate](https://www.rfc-editor.org/rfc/rfc5280#section-4.1.1.2).
    #[error("signature algorithm of the certificate and its payload differ")]
    SignatureMismatch,
}

impl From<ParseError> for ValidationError {
    fn from(_: ParseError) -> Self {
        Self::ParseError
    }
}

impl From<pem::PemError> for ValidationError {
    fn from(_: pem::PemError) -> Self {
        Self::DecodeError
    }
}
