use super::constants::PrincipalNameType;
use super::kerberos_string::KerberosString;
use crate::error::KrbError;
use der::Sequence;
use std::str::FromStr;

/// ```text
///   PrincipalName   ::= SEQUENCE {
///           name-type       [0] Int32,
///           name-string     [1] SEQUENCE OF KerberosString
///   }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub(crate) struct PrincipalName {
    #[asn1(context_specific = "0")]
    // This field specifies the type of name that follows.  Pre-defined
    // values for this field are specified in Section 6.2.  The name-type
    // SHOULD be treated as a hint.
    pub(crate) name_type: i32,
    #[asn1(context_specific = "1")]
    // This field encodes a sequence of components that form a name, each
    // component encoded as a KerberosString.
    pub(crate) name_string: Vec<KerberosString>,
}

impl PrincipalName {
    /// Build a name from already split components. Components are not
    /// validated beyond being representable as a KerberosString.
    pub(crate) fn from_components<T>(
        name_type: PrincipalNameType,
        components: &[T],
    ) -> Result<Self, KrbError>
    where
        T: AsRef<str>,
    {
        let name_string = components
            .iter()
            .map(|c| KerberosString::from_str(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name_type: name_type.into(),
            name_string,
        })
    }
}

impl From<PrincipalName> for String {
    fn from(value: PrincipalName) -> Self {
        let v: Vec<&str> = value.name_string.iter().map(KerberosString::as_str).collect();
        v.join("/")
    }
}
