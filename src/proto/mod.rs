mod reply;
mod request;

pub use self::reply::{AuthenticationReply, ErrorReply, KerberosReply, PreauthErrorReply};
pub use self::request::{
    build_as_req, AuthenticationRequest, AuthenticationRequestBuilder, KerberosRequest,
};

use crate::asn1::{
    constants::{EncryptionType, PaDataType, PrincipalNameType},
    etype_info2::ETypeInfo2 as KdcETypeInfo2,
    pa_data::PaData,
    principal_name::PrincipalName,
    realm::Realm,
};
use crate::constants::KRBTGT;
use crate::error::KrbError;
use der::Decode;
use std::fmt;
use std::str::FromStr;
use tracing::{error, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Name {
    Principal {
        name: String,
        realm: String,
    },
    SrvInst {
        service: String,
        instance: Vec<String>,
        realm: String,
    },
    // Replies may name things with types we never send. Keep them as is so
    // an odd sname never stops us reading the padata next to it.
    Other {
        name_type: i32,
        components: Vec<String>,
        realm: String,
    },
}

impl Name {
    pub fn principal(name: &str, realm: &str) -> Self {
        Self::Principal {
            name: name.to_string(),
            realm: realm.to_string(),
        }
    }

    pub fn service_krbtgt(realm: &str) -> Self {
        /*
         * RFC4120, section 7.3, Name of the TGS
         * The principal identifier of the ticket-granting service shall be
         * composed of three parts: the realm of the KDC issuing the TGS ticket,
         * and a two-part name of type NT-SRV-INST, with the first part "krbtgt"
         * and the second part the name of the realm that will accept the TGT.
         */
        Self::SrvInst {
            service: KRBTGT.to_string(),
            instance: vec![realm.to_string()],
            realm: realm.to_string(),
        }
    }

    /// Parse `name@REALM`. The split is on the last `@`, so enterprise style
    /// names such as `user@domain@REALM` keep their inner `@`.
    pub fn from_principal_str(princ: &str) -> Result<Self, KrbError> {
        let Some((name, realm)) = princ.rsplit_once('@') else {
            error!(?princ, "principal has no realm");
            return Err(KrbError::PrincipalMissingRealm);
        };

        if name.is_empty() || realm.is_empty() {
            error!(?princ, "principal has an empty name or realm");
            return Err(KrbError::PrincipalMissingRealm);
        }

        Ok(Self::principal(name, realm))
    }

    /// If the name is a PRINCIPAL then return its name and realm components.
    pub fn principal_name(&self) -> Result<(&str, &str), KrbError> {
        match self {
            Name::Principal { name, realm } => Ok((name.as_str(), realm.as_str())),
            _ => {
                error!(name = %self, "not a principal name");
                Err(KrbError::NameNotPrincipal)
            }
        }
    }

    pub fn realm(&self) -> &str {
        match self {
            Name::Principal { realm, .. }
            | Name::SrvInst { realm, .. }
            | Name::Other { realm, .. } => realm.as_str(),
        }
    }
}

impl FromStr for Name {
    type Err = KrbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::from_principal_str(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Principal { name, realm } => write!(f, "{name}@{realm}"),
            Name::SrvInst {
                service,
                instance,
                realm,
            } => {
                write!(f, "{service}")?;
                for inst in instance {
                    write!(f, "/{inst}")?;
                }
                write!(f, "@{realm}")
            }
            Name::Other {
                components, realm, ..
            } => write!(f, "{}@{}", components.join("/"), realm),
        }
    }
}

impl TryFrom<&Name> for (PrincipalName, Realm) {
    type Error = KrbError;

    fn try_from(name: &Name) -> Result<(PrincipalName, Realm), KrbError> {
        let (princ, realm) = match name {
            Name::Principal { name, realm } => (
                PrincipalName::from_components(PrincipalNameType::NtPrincipal, &[name])?,
                realm,
            ),
            Name::SrvInst {
                service,
                instance,
                realm,
            } => {
                let mut components = Vec::with_capacity(instance.len() + 1);
                components.push(service.as_str());
                components.extend(instance.iter().map(String::as_str));
                (
                    PrincipalName::from_components(PrincipalNameType::NtSrvInst, &components)?,
                    realm,
                )
            }
            Name::Other {
                name_type,
                components,
                realm,
            } => {
                let mut princ =
                    PrincipalName::from_components(PrincipalNameType::NtUnknown, components)?;
                princ.name_type = *name_type;
                (princ, realm)
            }
        };

        let realm = Realm::from_str(realm)?;
        Ok((princ, realm))
    }
}

impl From<(PrincipalName, Realm)> for Name {
    fn from((princ, realm): (PrincipalName, Realm)) -> Self {
        let PrincipalName {
            name_type,
            name_string,
        } = princ;

        let realm = String::from(&realm);
        let mut components: Vec<String> = name_string.iter().map(String::from).collect();

        match PrincipalNameType::try_from(name_type) {
            Ok(PrincipalNameType::NtPrincipal) if components.len() == 1 => {
                let name = components.remove(0);
                Name::Principal { name, realm }
            }
            Ok(PrincipalNameType::NtSrvInst) if !components.is_empty() => {
                let service = components.remove(0);
                Name::SrvInst {
                    service,
                    instance: components,
                    realm,
                }
            }
            _ => {
                trace!(?name_type, "keeping principal name of unhandled shape");
                Name::Other {
                    name_type,
                    components,
                    realm,
                }
            }
        }
    }
}

/// One entry of an ETYPE-INFO2 hint, as sent by the KDC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtypeInfo2 {
    // Kept raw: a KDC may advertise etypes we have no name for.
    etype: i32,

    salt: Option<String>,

    // For AES HMAC SHA1:
    //   The parameter string is four octets indicating an unsigned
    //   number in big-endian order.  This is the number of iterations to be
    //   performed.  If the value is 00 00 00 00, the number of iterations to
    //   be performed is 4,294,967,296 (2**32).
    s2kparams: Option<Vec<u8>>,
}

impl EtypeInfo2 {
    pub fn etype(&self) -> i32 {
        self.etype
    }

    pub fn encryption_type(&self) -> Option<EncryptionType> {
        EncryptionType::try_from(self.etype).ok()
    }

    pub fn salt(&self) -> Option<&str> {
        self.salt.as_deref()
    }

    pub fn s2kparams(&self) -> Option<&[u8]> {
        self.s2kparams.as_deref()
    }

    /// The PBKDF2 iteration count carried in s2kparams, if the KDC sent one
    /// in the AES form. A zero here means 2**32 and is returned as 0.
    pub fn iteration_count(&self) -> Option<u32> {
        let params: [u8; 4] = self.s2kparams.as_deref()?.try_into().ok()?;
        Some(u32::from_be_bytes(params))
    }

    fn is_one_of(&self, etypes: &[EncryptionType]) -> bool {
        etypes.iter().any(|e| i32::from(*e) == self.etype)
    }
}

/// The pre-authentication hints of a reply. Only the first ETYPE-INFO2 the
/// KDC sent is retained, with its entries in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreauthData {
    pub(crate) padata_types: Vec<i32>,
    pub(crate) enc_timestamp: bool,
    pub(crate) etype_info2: Option<Vec<EtypeInfo2>>,
}

impl PreauthData {
    /// The raw padata-type of every entry, in the order the KDC sent them.
    pub fn padata_types(&self) -> &[i32] {
        &self.padata_types
    }

    pub fn enc_timestamp(&self) -> bool {
        self.enc_timestamp
    }

    pub fn etype_info2(&self) -> Option<&[EtypeInfo2]> {
        self.etype_info2.as_deref()
    }

    /// Salt of the first ETYPE-INFO2 entry whose etype is any of `etypes`.
    pub fn salt_for(&self, etypes: &[EncryptionType]) -> Result<&str, KrbError> {
        let etype_info2 = self.etype_info2.as_deref().ok_or_else(|| {
            error!(padata_types = ?self.padata_types, "no ETYPE-INFO2 in padata");
            KrbError::PreauthMissingEtypeInfo2
        })?;

        let entry = etype_info2
            .iter()
            .find(|einfo| einfo.is_one_of(etypes))
            .ok_or_else(|| {
                error!(?etypes, ?etype_info2, "no ETYPE-INFO2 entry for etype");
                KrbError::PreauthMissingEtype
            })?;

        entry.salt().ok_or_else(|| {
            error!(etype = entry.etype, "ETYPE-INFO2 entry has no salt");
            KrbError::PreauthMissingSalt
        })
    }
}

impl TryFrom<Vec<PaData>> for PreauthData {
    type Error = KrbError;

    fn try_from(pavec: Vec<PaData>) -> Result<Self, Self::Error> {
        // Per https://www.rfc-editor.org/rfc/rfc4120#section-7.5.2
        let mut padata_types = Vec::with_capacity(pavec.len());
        let mut enc_timestamp = false;
        let mut etype_info2 = None;

        for PaData {
            padata_type,
            padata_value,
        } in pavec
        {
            padata_types.push(padata_type);

            let Ok(padt) = PaDataType::try_from(padata_type) else {
                // padatatype that we don't support
                continue;
            };

            match padt {
                PaDataType::PaEncTimestamp => enc_timestamp = true,
                PaDataType::PaEtypeInfo2 if etype_info2.is_none() => {
                    let einfo2_sequence = KdcETypeInfo2::from_der(padata_value.as_bytes())
                        .map_err(|err| {
                            error!(?err, "unable to decode ETYPE-INFO2");
                            KrbError::DerDecodeEtypeInfo2
                        })?;

                    let entries = einfo2_sequence
                        .into_iter()
                        .map(|einfo2| EtypeInfo2 {
                            etype: einfo2.etype,
                            salt: einfo2.salt.as_ref().map(String::from),
                            s2kparams: einfo2.s2kparams.map(|v| v.as_bytes().to_vec()),
                        })
                        .collect();

                    etype_info2 = Some(entries);
                }
                _ => {
                    // Ignore unsupported pa data types.
                }
            }
        }

        Ok(PreauthData {
            padata_types,
            enc_timestamp,
            etype_info2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EtypeInfo2, Name, PreauthData};
    use crate::asn1::constants::{EncryptionType, PaDataType, PrincipalNameType};
    use crate::asn1::etype_info2::ETypeInfo2Entry;
    use crate::asn1::kerberos_string::KerberosString;
    use crate::asn1::pa_data::PaData;
    use crate::asn1::principal_name::PrincipalName;
    use crate::asn1::realm::Realm;
    use crate::asn1::OctetString;
    use crate::error::KrbError;
    use der::Encode;
    use std::str::FromStr;

    fn etype_info2_padata(entries: &[(EncryptionType, Option<&str>)]) -> PaData {
        let entries: Vec<ETypeInfo2Entry> = entries
            .iter()
            .map(|(etype, salt)| ETypeInfo2Entry {
                etype: (*etype).into(),
                salt: salt.map(|s| KerberosString::from_str(s).unwrap()),
                s2kparams: None,
            })
            .collect();

        PaData {
            padata_type: PaDataType::PaEtypeInfo2 as i32,
            padata_value: OctetString::new(entries.to_der().unwrap()).unwrap(),
        }
    }

    #[test]
    fn principal_str_splits_on_last_at() {
        let name = Name::from_principal_str("user@corp.example.com@EXAMPLE.COM").unwrap();
        assert_eq!(
            name,
            Name::principal("user@corp.example.com", "EXAMPLE.COM")
        );
        assert_eq!(name.realm(), "EXAMPLE.COM");
        assert_eq!(
            name.principal_name().unwrap(),
            ("user@corp.example.com", "EXAMPLE.COM")
        );
        assert!(matches!(
            Name::service_krbtgt("EXAMPLE.COM").principal_name(),
            Err(KrbError::NameNotPrincipal)
        ));

        assert!(matches!(
            Name::from_principal_str("user"),
            Err(KrbError::PrincipalMissingRealm)
        ));
        assert!(matches!(
            Name::from_principal_str("user@"),
            Err(KrbError::PrincipalMissingRealm)
        ));
    }

    #[test]
    fn krbtgt_name_to_asn1() {
        let name = Name::service_krbtgt("EXAMPLE.COM");
        assert_eq!(name.to_string(), "krbtgt/EXAMPLE.COM@EXAMPLE.COM");

        let (princ, realm): (PrincipalName, Realm) = (&name).try_into().unwrap();
        assert_eq!(princ.name_type, PrincipalNameType::NtSrvInst as i32);
        assert_eq!(String::from(princ.clone()), "krbtgt/EXAMPLE.COM");
        assert_eq!(realm.as_str(), "EXAMPLE.COM");

        assert_eq!(Name::from((princ, realm)), name);
    }

    #[test]
    fn unusual_name_type_is_kept() {
        let princ = PrincipalName::from_components(
            PrincipalNameType::NtEnterprise,
            &["user@corp.example.com"],
        )
        .unwrap();
        let realm = Realm::from_str("EXAMPLE.COM").unwrap();

        let name = Name::from((princ, realm));
        assert!(matches!(name, Name::Other { name_type: 10, .. }));
        assert_eq!(name.to_string(), "user@corp.example.com@EXAMPLE.COM");
    }

    #[test]
    fn preauth_data_keeps_wire_order() {
        let pavec = vec![
            PaData {
                padata_type: PaDataType::PaEncTimestamp as i32,
                padata_value: OctetString::new(Vec::new()).unwrap(),
            },
            etype_info2_padata(&[
                (EncryptionType::AES128_CTS_HMAC_SHA1_96, Some("A")),
                (EncryptionType::AES256_CTS_HMAC_SHA1_96, Some("B")),
            ]),
            // A second ETYPE-INFO2 is ignored.
            etype_info2_padata(&[(EncryptionType::AES256_CTS_HMAC_SHA1_96, Some("C"))]),
        ];

        let pa_data = PreauthData::try_from(pavec).unwrap();
        assert!(pa_data.enc_timestamp());
        assert_eq!(pa_data.padata_types(), &[2, 19, 19]);

        let einfo2 = pa_data.etype_info2().unwrap();
        assert_eq!(einfo2.len(), 2);
        assert_eq!(
            einfo2[0].encryption_type(),
            Some(EncryptionType::AES128_CTS_HMAC_SHA1_96)
        );

        let aes256 = [EncryptionType::AES256_CTS_HMAC_SHA1_96];
        let either = [
            EncryptionType::AES256_CTS_HMAC_SHA1_96,
            EncryptionType::AES128_CTS_HMAC_SHA1_96,
        ];
        assert_eq!(pa_data.salt_for(&aes256).unwrap(), "B");
        assert_eq!(pa_data.salt_for(&either).unwrap(), "A");
    }

    #[test]
    fn preauth_data_salt_failures() {
        let pa_data = PreauthData::default();
        assert!(matches!(
            pa_data.salt_for(&[EncryptionType::AES256_CTS_HMAC_SHA1_96]),
            Err(KrbError::PreauthMissingEtypeInfo2)
        ));

        let pa_data = PreauthData::try_from(vec![etype_info2_padata(&[
            (EncryptionType::RC4_HMAC, Some("RC4")),
            (EncryptionType::AES256_CTS_HMAC_SHA1_96, None),
        ])])
        .unwrap();
        assert!(matches!(
            pa_data.salt_for(&[EncryptionType::AES128_CTS_HMAC_SHA1_96]),
            Err(KrbError::PreauthMissingEtype)
        ));
        assert!(matches!(
            pa_data.salt_for(&[EncryptionType::AES256_CTS_HMAC_SHA1_96]),
            Err(KrbError::PreauthMissingSalt)
        ));

        let garbage = PaData {
            padata_type: PaDataType::PaEtypeInfo2 as i32,
            padata_value: OctetString::new(vec![0x30, 0x05, 0x00]).unwrap(),
        };
        assert!(matches!(
            PreauthData::try_from(vec![garbage]),
            Err(KrbError::DerDecodeEtypeInfo2)
        ));
    }

    #[test]
    fn etype_info2_iteration_count() {
        let einfo = EtypeInfo2 {
            etype: 18,
            salt: None,
            s2kparams: Some(vec![0x00, 0x00, 0x80, 0x00]),
        };
        assert_eq!(einfo.iteration_count(), Some(0x8000));

        let einfo = EtypeInfo2 {
            etype: 999,
            salt: Some("x".to_string()),
            s2kparams: Some(vec![0x01]),
        };
        assert_eq!(einfo.iteration_count(), None);
        assert_eq!(einfo.encryption_type(), None);
        assert_eq!(einfo.etype(), 999);
    }
}
