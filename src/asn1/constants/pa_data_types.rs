use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum PaDataType {
    PaTgsReq = 1,
    PaEncTimestamp = 2,
    PaPwSalt = 3,
    PaEtypeInfo = 11,
    PaPkAsReqOld = 14, // (pkinit)
    PaPkAsRepOld = 15, // (pkinit)
    PaPkAsReq = 16,    // (pkinit)
    PaPkAsRep = 17,    // (pkinit)
    PaEtypeInfo2 = 19, // (replaces pa-etype-info)
    PaPacRequest = 128,
    PaFxCookie = 133, // RFC6113 FAST Cookie
    PaFxFast = 136,   // RFC6113 FAST
    EncpadataReqEncPaRep = 149,
    PadataAsFreshness = 150,
}
