use crate::asn1::{
    constants::{KrbErrorCode, KrbMessageType},
    kdc_rep::KdcRep,
    krb_error::KrbError as KdcKrbError,
    krb_error::MethodData,
    krb_message::{KrbMessage, AS_REP_TAG, KRB_ERROR_TAG},
    pa_data::PaData,
};
use crate::error::KrbError;
use der::Decode;

use std::time::{Duration, SystemTime};
use tracing::{error, trace};

use super::{Name, PreauthData};

#[derive(Debug)]
pub enum KerberosReply {
    // The client has preauth disabled, and the KDC handed out a ticket.
    AS(AuthenticationReply),
    // KDC_ERR_PREAUTH_REQUIRED. This is the expected answer to a probe, so it's
    // a valid reply rather than an error.
    PA(PreauthErrorReply),
    ERR(ErrorReply),
}

#[derive(Debug)]
pub struct AuthenticationReply {
    pub name: Name,
    pub pa_data: Option<PreauthData>,
    /// etype of the encrypted part, which is keyed by the client's long term key.
    pub enc_part_etype: i32,
}

#[derive(Debug)]
pub struct PreauthErrorReply {
    pub pa_data: PreauthData,
    pub service: Name,
    pub stime: SystemTime,
}

#[derive(Debug)]
pub struct ErrorReply {
    pub code: i32,
    pub service: Name,
    pub error_text: Option<String>,
    pub stime: SystemTime,
}

impl ErrorReply {
    /// The error code, if it's one we have a name for.
    pub fn error_code(&self) -> Option<KrbErrorCode> {
        KrbErrorCode::try_from(self.code).ok()
    }
}

impl TryFrom<&[u8]> for KerberosReply {
    type Error = KrbError;

    fn try_from(bytes: &[u8]) -> Result<Self, KrbError> {
        let tag = KrbMessage::peek_tag(bytes).map_err(|err| {
            error!(?err, "unable to read the reply header");
            KrbError::DerDecodeReply(err)
        })?;
        trace!(?tag);

        if tag != AS_REP_TAG && tag != KRB_ERROR_TAG {
            error!(%tag, "reply is neither an AS-REP nor a KRB-ERROR");
            return Err(KrbError::UnsupportedReply(tag));
        }

        let message = KrbMessage::from_der(bytes).map_err(|err| {
            error!(?err, %tag, "unable to decode reply");
            if tag == KRB_ERROR_TAG {
                KrbError::DerDecodeKrbError
            } else {
                KrbError::DerDecodeKdcRep
            }
        })?;

        match message {
            KrbMessage::AsRep(kdc_rep) => KerberosReply::try_from(kdc_rep),
            KrbMessage::Error(err_rep) => KerberosReply::try_from(err_rep),
            KrbMessage::AsReq(_) => Err(KrbError::UnsupportedReply(tag)),
        }
    }
}

fn server_time(stime: &der::asn1::GeneralizedTime, susec: u32) -> SystemTime {
    stime.to_system_time() + Duration::from_micros(u64::from(susec))
}

impl TryFrom<KdcKrbError> for KerberosReply {
    type Error = KrbError;

    fn try_from(rep: KdcKrbError) -> Result<Self, KrbError> {
        // assert the pvno and msg_type
        if rep.pvno != 5 {
            error!(pvno = rep.pvno, "invalid protocol version");
            return Err(KrbError::InvalidPvno);
        }

        if !matches!(
            KrbMessageType::try_from(rep.msg_type),
            Ok(KrbMessageType::KrbError)
        ) {
            error!(msg_type = rep.msg_type, "KRB-ERROR carries the wrong msg-type");
            return Err(KrbError::InvalidMessageType);
        }

        let service = Name::from((rep.service_name, rep.service_realm));
        let stime = server_time(&rep.stime, rep.susec);

        if rep.error_code != i32::from(KrbErrorCode::KdcErrPreauthRequired) {
            let error_text = rep.error_text.as_ref().map(String::from);
            trace!(code = rep.error_code, ?error_text, "KDC returned an error");
            return Ok(KerberosReply::ERR(ErrorReply {
                code: rep.error_code,
                service,
                error_text,
                stime,
            }));
        }

        // The pre-auth data is stuffed into error_data as METHOD-DATA.
        let edata = rep.error_data.ok_or_else(|| {
            error!("preauth required, but e-data is absent");
            KrbError::MissingPaData
        })?;

        let pavec: Vec<PaData> = MethodData::from_der(edata.as_bytes()).map_err(|err| {
            error!(?err, "unable to decode METHOD-DATA");
            KrbError::DerDecodePaData
        })?;

        let pa_data = PreauthData::try_from(pavec)?;
        trace!(?pa_data);

        Ok(KerberosReply::PA(PreauthErrorReply {
            pa_data,
            service,
            stime,
        }))
    }
}

impl TryFrom<KdcRep> for KerberosReply {
    type Error = KrbError;

    fn try_from(rep: KdcRep) -> Result<Self, KrbError> {
        // assert the pvno and msg_type
        if rep.pvno != 5 {
            error!(pvno = rep.pvno, "invalid protocol version");
            return Err(KrbError::InvalidPvno);
        }

        if !matches!(
            KrbMessageType::try_from(rep.msg_type),
            Ok(KrbMessageType::KrbAsRep)
        ) {
            error!(msg_type = rep.msg_type, "AS-REP carries the wrong msg-type");
            return Err(KrbError::InvalidMessageType);
        }

        let pa_data = rep.padata.map(PreauthData::try_from).transpose()?;
        trace!(?pa_data);

        let name = Name::from((rep.cname, rep.crealm));

        Ok(KerberosReply::AS(AuthenticationReply {
            name,
            pa_data,
            enc_part_etype: rep.enc_part.etype,
        }))
    }
}
