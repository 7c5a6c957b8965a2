use crate::asn1::{
    constants::{EncryptionType, KrbMessageType},
    kdc_req::KdcReq,
    kdc_req_body::KdcReqBody,
    kerberos_flags::KerberosFlags,
    kerberos_time::KerberosTime,
    krb_message::KrbMessage,
    principal_name::PrincipalName,
    realm::Realm,
};
use crate::constants::NONCE_MAX;
use crate::error::KrbError;
use der::Encode;
use rand::Rng;

use std::time::SystemTime;
use tracing::{error, trace};

use super::Name;

#[derive(Debug)]
pub enum KerberosRequest {
    AS(AuthenticationRequest),
}

#[derive(Debug)]
pub struct AuthenticationRequest {
    pub nonce: i32,
    pub client_name: Name,
    pub service_name: Name,
    pub until: SystemTime,
    pub etypes: Vec<EncryptionType>,
    pub(crate) kdc_options: KerberosFlags,
}

#[derive(Debug)]
pub struct AuthenticationRequestBuilder {
    client_name: Name,
    service_name: Name,
    until: SystemTime,
    etypes: Vec<EncryptionType>,
}

impl KerberosRequest {
    /// Start an AS-REQ that asks for no options, no particular lifetime and
    /// either AES etype. With no padata attached, a KDC that requires
    /// preauthentication answers with its ETYPE-INFO2 hints.
    pub fn build_as(client_name: &Name, service_name: Name) -> AuthenticationRequestBuilder {
        let etypes = vec![
            EncryptionType::AES128_CTS_HMAC_SHA1_96,
            EncryptionType::AES256_CTS_HMAC_SHA1_96,
        ];

        AuthenticationRequestBuilder {
            client_name: client_name.clone(),
            service_name,
            // The epoch is the conventional "as soon as possible" till.
            until: SystemTime::UNIX_EPOCH,
            etypes,
        }
    }

    pub fn to_der(&self) -> Result<Vec<u8>, KrbError> {
        let message = match self {
            KerberosRequest::AS(as_req) => KrbMessage::AsReq(as_req.to_asn()?),
        };

        message.to_der().map_err(|err| {
            error!(?err, "unable to encode AS-REQ");
            KrbError::DerEncodeAsReq
        })
    }
}

impl AuthenticationRequestBuilder {
    pub fn until(mut self, until: SystemTime) -> Self {
        self.until = until;
        self
    }

    pub fn build(self) -> KerberosRequest {
        self.build_with_rng(&mut rand::rng())
    }

    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> KerberosRequest {
        let AuthenticationRequestBuilder {
            client_name,
            service_name,
            until,
            etypes,
        } = self;

        // BUG IN MIT KRB5 - If the value is greater than i32 max you get:
        // krb5kdc[1](Error): ASN.1 value too large - while dispatching (tcp)
        let nonce = rng.random_range(0..=NONCE_MAX);

        KerberosRequest::AS(AuthenticationRequest {
            nonce,
            client_name,
            service_name,
            until,
            etypes,
            kdc_options: KerberosFlags::none(),
        })
    }
}

impl AuthenticationRequest {
    fn to_asn(&self) -> Result<KdcReq, KrbError> {
        let (cname, _): (PrincipalName, Realm) = (&self.client_name).try_into()?;
        let (sname, realm): (PrincipalName, Realm) = (&self.service_name).try_into()?;

        let till = KerberosTime::from_system_time(self.until).map_err(|err| {
            error!(?err, until = ?self.until, "unable to encode till time");
            KrbError::DerEncodeKerberosTime
        })?;

        let req_body = KdcReqBody {
            kdc_options: self.kdc_options,
            cname: Some(cname),
            realm,
            sname: Some(sname),
            from: None,
            till,
            rtime: None,
            nonce: self.nonce,
            etype: self.etypes.iter().map(|e| i32::from(*e)).collect(),
            addresses: None,
            enc_authorization_data: None,
            additional_tickets: None,
        };
        trace!(?req_body);

        Ok(KdcReq {
            pvno: 5,
            msg_type: KrbMessageType::KrbAsReq.into(),
            padata: None,
            req_body,
        })
    }
}

/// Encode the AS-REQ used to probe `principal_name@realm` for its salt.
pub fn build_as_req(principal_name: &str, realm: &str) -> Result<Vec<u8>, KrbError> {
    build_as_req_with_rng(principal_name, realm, &mut rand::rng())
}

pub(crate) fn build_as_req_with_rng<R: Rng + ?Sized>(
    principal_name: &str,
    realm: &str,
    rng: &mut R,
) -> Result<Vec<u8>, KrbError> {
    let client_name = Name::principal(principal_name, realm);
    KerberosRequest::build_as(&client_name, Name::service_krbtgt(realm))
        .build_with_rng(rng)
        .to_der()
}
