use super::kdc_rep::KdcRep;
use super::kdc_req::KdcReq;
use super::krb_error::KrbError;
use der::{Decode, Encode, Length, Reader, SliceReader, Tag, TagNumber, Writer};

pub(crate) const AS_REQ_TAG: Tag = Tag::Application {
    constructed: true,
    number: TagNumber(10),
};

pub(crate) const AS_REP_TAG: Tag = Tag::Application {
    constructed: true,
    number: TagNumber(11),
};

pub(crate) const KRB_ERROR_TAG: Tag = Tag::Application {
    constructed: true,
    number: TagNumber(30),
};

/// ```text
/// AS-REQ          ::= [APPLICATION 10] KDC-REQ
/// AS-REP          ::= [APPLICATION 11] KDC-REP
/// KRB-ERROR       ::= [APPLICATION 30] SEQUENCE { ... }
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum KrbMessage {
    AsReq(KdcReq),
    AsRep(KdcRep),
    Error(KrbError),
}

impl KrbMessage {
    /// Read only the outer tag and length of an encoded message. The body is
    /// left untouched, so this succeeds on messages we can't decode.
    pub(crate) fn peek_tag(bytes: &[u8]) -> der::Result<Tag> {
        let mut reader = SliceReader::new(bytes)?;
        let tag: Tag = reader.decode()?;
        let _len: Length = reader.decode()?;
        Ok(tag)
    }

    fn tag(&self) -> Tag {
        match self {
            KrbMessage::AsReq(_) => AS_REQ_TAG,
            KrbMessage::AsRep(_) => AS_REP_TAG,
            KrbMessage::Error(_) => KRB_ERROR_TAG,
        }
    }

    fn inner_len(&self) -> der::Result<Length> {
        match self {
            KrbMessage::AsReq(as_req) => as_req.encoded_len(),
            KrbMessage::AsRep(as_rep) => as_rep.encoded_len(),
            KrbMessage::Error(err) => err.encoded_len(),
        }
    }
}

impl<'a> Decode<'a> for KrbMessage {
    type Error = der::Error;

    fn decode<R: Reader<'a>>(decoder: &mut R) -> der::Result<Self> {
        let tag: Tag = decoder.decode()?;
        let len: Length = decoder.decode()?;

        // The body must fill the outer length exactly.
        match tag {
            AS_REQ_TAG => {
                let kdc_req: KdcReq = decoder.read_nested(len, |r| r.decode())?;
                Ok(KrbMessage::AsReq(kdc_req))
            }
            AS_REP_TAG => {
                let kdc_rep: KdcRep = decoder.read_nested(len, |r| r.decode())?;
                Ok(KrbMessage::AsRep(kdc_rep))
            }
            KRB_ERROR_TAG => {
                let err_rep: KrbError = decoder.read_nested(len, |r| r.decode())?;
                Ok(KrbMessage::Error(err_rep))
            }
            _ => Err(der::Error::from(der::ErrorKind::TagUnexpected {
                expected: None,
                actual: tag,
            })),
        }
    }
}

impl Encode for KrbMessage {
    fn encoded_len(&self) -> der::Result<Length> {
        let inner_len = self.inner_len()?;
        self.tag().encoded_len()? + inner_len + inner_len.encoded_len()?
    }

    fn encode(&self, writer: &mut impl Writer) -> der::Result<()> {
        self.tag().encode(writer)?;
        self.inner_len()?.encode(writer)?;
        match self {
            KrbMessage::AsReq(as_req) => as_req.encode(writer),
            KrbMessage::AsRep(as_rep) => as_rep.encode(writer),
            KrbMessage::Error(err) => err.encode(writer),
        }
    }
}
