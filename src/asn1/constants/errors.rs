use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Error codes from RFC 4120 section 7.5.9. Only the codes a KDC can send
/// back to an AS-REQ are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum KrbErrorCode {
    KdcErrNone = 0,
    KdcErrNameExp = 1,
    KdcErrServiceExp = 2,
    KdcErrBadPvno = 3,
    KdcErrCOldMastKvno = 4,
    KdcErrSOldMastKvno = 5,
    KdcErrCPrincipalUnknown = 6,
    KdcErrSPrincipalUnknown = 7,
    KdcErrPrincipalNotUnique = 8,
    KdcErrNullKey = 9,
    KdcErrCannotPostdate = 10,
    KdcErrNeverValid = 11,
    KdcErrPolicy = 12,
    KdcErrBadoption = 13,
    KdcErrEtypeNosupp = 14,
    KdcErrSumtypeNosupp = 15,
    KdcErrPadataTypeNosupp = 16,
    KdcErrTrtypeNosupp = 17,
    KdcErrClientRevoked = 18,
    KdcErrServiceRevoked = 19,
    KdcErrTgtRevoked = 20,
    KdcErrClientNotyet = 21,
    KdcErrServiceNotyet = 22,
    KdcErrKeyExpired = 23,
    KdcErrPreauthFailed = 24,
    KdcErrPreauthRequired = 25,
    KdcErrServerNomatch = 26,
    KdcErrMustUseUser2user = 27,
    KdcErrPathNotAccepted = 28,
    KdcErrSvcUnavailable = 29,
    KrbApErrSkew = 37,
    KrbErrResponseTooBig = 52,
    KrbErrGeneric = 60,
    KrbErrFieldToolong = 61,
    KdcErrWrongRealm = 68,
}
