use std::fmt;

/// Broad class of a [`KrbError`]. A caller uses this to decide whether a
/// failed probe is worth retrying, or whether to fall back to the heuristic
/// salt instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The KDC could not be reached, or the exchange did not complete.
    Transport,
    /// The reply bytes are not a valid encoding of the expected structure.
    Decode,
    /// The reply decoded, but does not carry a salt where one is expected.
    Protocol,
    /// The reply is neither an AS-REP nor a KRB-ERROR.
    UnsupportedReply,
    /// A request could not be encoded from the given inputs.
    Encode,
    /// Local configuration or input is invalid.
    Config,
}

#[derive(Debug)]
pub enum KrbError {
    // =========================================================================================
    // Variants carry only what the caller needs to diagnose a failed probe: the observed
    // tag or error code, or the underlying codec/io error. Anything else should be reported
    // with the error! macro at the raise site.
    // =========================================================================================
    IoError(std::io::Error),
    TransportTimeout,
    TransportClosed,
    ReplyTooLarge,
    NoAddress,

    DerDecodeReply(der::Error),
    DerDecodeKrbError,
    DerDecodeKdcRep,
    DerDecodePaData,
    DerDecodeEtypeInfo2,
    InvalidPvno,
    InvalidMessageType,

    UnexpectedErrorCode(i32),
    MissingPaData,
    PreauthMissingEtypeInfo2,
    PreauthMissingEtype,
    PreauthMissingSalt,

    UnsupportedReply(der::Tag),

    DerEncodeKerberosString,
    DerEncodeKerberosTime,
    DerEncodeAsReq,

    ConfigError,
    InvalidPasswordHex,
    InvalidIterationCount,
    PrincipalMissingRealm,
    NameNotPrincipal,
}

impl KrbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KrbError::IoError(_)
            | KrbError::TransportTimeout
            | KrbError::TransportClosed
            | KrbError::ReplyTooLarge
            | KrbError::NoAddress => ErrorKind::Transport,

            KrbError::DerDecodeReply(_)
            | KrbError::DerDecodeKrbError
            | KrbError::DerDecodeKdcRep
            | KrbError::DerDecodePaData
            | KrbError::DerDecodeEtypeInfo2
            | KrbError::InvalidPvno
            | KrbError::InvalidMessageType => ErrorKind::Decode,

            KrbError::UnexpectedErrorCode(_)
            | KrbError::MissingPaData
            | KrbError::PreauthMissingEtypeInfo2
            | KrbError::PreauthMissingEtype
            | KrbError::PreauthMissingSalt => ErrorKind::Protocol,

            KrbError::UnsupportedReply(_) => ErrorKind::UnsupportedReply,

            KrbError::DerEncodeKerberosString
            | KrbError::DerEncodeKerberosTime
            | KrbError::DerEncodeAsReq => ErrorKind::Encode,

            KrbError::ConfigError
            | KrbError::InvalidPasswordHex
            | KrbError::InvalidIterationCount
            | KrbError::PrincipalMissingRealm
            | KrbError::NameNotPrincipal => ErrorKind::Config,
        }
    }
}

impl fmt::Display for KrbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KrbError::IoError(err) => write!(f, "transport failure: {err}"),
            KrbError::TransportTimeout => write!(f, "timed out waiting for the KDC"),
            KrbError::TransportClosed => write!(f, "KDC closed the connection mid-reply"),
            KrbError::ReplyTooLarge => write!(f, "KDC reply exceeds the maximum frame size"),
            KrbError::NoAddress => write!(f, "KDC host did not resolve to any address"),
            KrbError::DerDecodeReply(err) => write!(f, "malformed reply: {err}"),
            KrbError::DerDecodeKrbError => write!(f, "malformed KRB-ERROR"),
            KrbError::DerDecodeKdcRep => write!(f, "malformed AS-REP"),
            KrbError::DerDecodePaData => write!(f, "malformed PA-DATA"),
            KrbError::DerDecodeEtypeInfo2 => write!(f, "malformed ETYPE-INFO2"),
            KrbError::InvalidPvno => write!(f, "reply is not Kerberos protocol version 5"),
            KrbError::InvalidMessageType => write!(f, "reply carries an unexpected msg-type"),
            KrbError::UnexpectedErrorCode(code) => {
                write!(f, "KDC returned error code {code}, expected preauth required")
            }
            KrbError::MissingPaData => write!(f, "reply carries no pre-authentication data"),
            KrbError::PreauthMissingEtypeInfo2 => write!(f, "reply carries no ETYPE-INFO2"),
            KrbError::PreauthMissingEtype => {
                write!(f, "ETYPE-INFO2 has no entry for the expected encryption type")
            }
            KrbError::PreauthMissingSalt => write!(f, "ETYPE-INFO2 entry has no salt"),
            KrbError::UnsupportedReply(tag) => write!(f, "unsupported reply with tag {tag}"),
            KrbError::DerEncodeKerberosString => {
                write!(f, "value is not representable as a KerberosString")
            }
            KrbError::DerEncodeKerberosTime => write!(f, "unable to encode KerberosTime"),
            KrbError::DerEncodeAsReq => write!(f, "unable to encode AS-REQ"),
            KrbError::ConfigError => write!(f, "invalid configuration"),
            KrbError::InvalidPasswordHex => write!(f, "password is not valid hex"),
            KrbError::InvalidIterationCount => write!(f, "string-to-key iteration count is 0"),
            KrbError::PrincipalMissingRealm => write!(f, "principal must be of the form name@REALM"),
            KrbError::NameNotPrincipal => write!(f, "name is not a principal name"),
        }
    }
}

impl std::error::Error for KrbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KrbError::IoError(err) => Some(err),
            KrbError::DerDecodeReply(err) => Some(err),
            _ => None,
        }
    }
}

impl From<der::Error> for KrbError {
    fn from(value: der::Error) -> Self {
        KrbError::DerDecodeReply(value)
    }
}

impl From<std::io::Error> for KrbError {
    fn from(value: std::io::Error) -> Self {
        KrbError::IoError(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, KrbError};
    use der::{Tag, TagNumber};

    #[test]
    fn error_kind_classification() {
        let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert_eq!(KrbError::from(io).kind(), ErrorKind::Transport);
        assert_eq!(KrbError::TransportTimeout.kind(), ErrorKind::Transport);
        assert_eq!(KrbError::DerDecodeEtypeInfo2.kind(), ErrorKind::Decode);
        assert_eq!(KrbError::UnexpectedErrorCode(6).kind(), ErrorKind::Protocol);
        assert_eq!(KrbError::PreauthMissingSalt.kind(), ErrorKind::Protocol);

        let tag = Tag::Application {
            constructed: true,
            number: TagNumber(13),
        };
        let err = KrbError::UnsupportedReply(tag);
        assert_eq!(err.kind(), ErrorKind::UnsupportedReply);
        assert!(err.to_string().contains("tag"));
    }
}
