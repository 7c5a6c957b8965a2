/// ```text
/// Microseconds    ::= INTEGER (0..999999)
/// ```
pub(crate) type Microseconds = u32;
