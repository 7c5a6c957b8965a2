use crate::error::KrbError;
use der::asn1::Ia5String;
use der::{DecodeValue, EncodeValue, FixedTag, Length, Reader, Tag, Writer};
use std::fmt;
use std::str::FromStr;

/// ```text
/// KerberosString  ::= GeneralString (IA5String)
/// ````
// AD sends UTF-8 here, so decoding only requires valid UTF-8. Values we
// build ourselves are held to IA5 by `from_str`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct KerberosString(pub(crate) String);

impl FixedTag for KerberosString {
    const TAG: Tag = Tag::GeneralString;
}

impl<'a> DecodeValue<'a> for KerberosString {
    type Error = der::Error;

    fn decode_value<R: Reader<'a>>(reader: &mut R, header: der::Header) -> der::Result<Self> {
        let bytes = reader.read_vec(header.length())?;
        let s = String::from_utf8(bytes).map_err(|err| err.utf8_error())?;
        Ok(Self(s))
    }
}

impl EncodeValue for KerberosString {
    fn value_len(&self) -> der::Result<Length> {
        Length::try_from(self.0.len())
    }
    fn encode_value(&self, encoder: &mut impl Writer) -> der::Result<()> {
        encoder.write(self.0.as_bytes())
    }
}

impl fmt::Display for KerberosString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KerberosString {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl KerberosString {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl From<&KerberosString> for String {
    fn from(value: &KerberosString) -> Self {
        value.0.clone()
    }
}

impl FromStr for KerberosString {
    type Err = KrbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ia5String::new(s).map_err(|_| KrbError::DerEncodeKerberosString)?;
        Ok(KerberosString(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::KerberosString;
    use der::{Decode, Encode};
    use std::str::FromStr;

    #[test]
    fn kerberos_string_uses_general_string_tag() {
        let s = KerberosString::from_str("krbtgt").expect("Failed to build KerberosString");
        let bytes = s.to_der().expect("Failed to encode");
        assert_eq!(bytes, hex::decode("1b066b7262746774").expect("Failed to decode hex"));

        let back = KerberosString::from_der(&bytes).expect("Failed to decode");
        assert_eq!(back.as_str(), "krbtgt");
    }

    #[test]
    fn kerberos_string_rejects_non_ascii() {
        assert!(KerberosString::from_str("sérvice").is_err());
    }

    #[test]
    fn kerberos_string_decodes_utf8() {
        // "AFOREST.ADjosé" as AD sends it.
        let bytes = hex::decode("1b0f41464f524553542e41446a6f73c3a9").expect("Failed to decode hex");
        let s = KerberosString::from_der(&bytes).expect("Failed to decode");
        assert_eq!(s.as_str(), "AFOREST.ADjosé");

        // Re-encoding keeps the received bytes.
        assert_eq!(s.to_der().expect("Failed to encode"), bytes);

        // Latin-1 is not valid UTF-8.
        let bytes = hex::decode("1b0241e9").expect("Failed to decode hex");
        assert!(KerberosString::from_der(&bytes).is_err());
    }
}
