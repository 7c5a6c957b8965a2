// #![deny(warnings)]

#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::disallowed_types)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Find the salt a KDC uses for a principal's AES keys.
//!
//! A KDC answers an AS-REQ that carries no pre-authentication with
//! KDC_ERR_PREAUTH_REQUIRED, and lists the salt for each key of the client in
//! an ETYPE-INFO2 hint. Principals with pre-authentication disabled get an
//! AS-REP instead, which carries the same hint. When the KDC can't be asked,
//! [salt_from_heuristic] reproduces the salt AD assigns to computer and
//! managed service accounts.

mod asn1;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod proto;
pub mod salt;
pub mod transport;

pub use crate::asn1::constants::{EncryptionType, KrbErrorCode};
pub use crate::config::ProbeConfig;
pub use crate::error::{ErrorKind, KrbError};
pub use crate::proto::build_as_req;
pub use crate::salt::{
    extract_salt, get_salt_from_preauth, get_salt_from_preauth_with, salt_from_heuristic,
};
pub use crate::transport::{send_as_req, send_as_req_with, Transport};
