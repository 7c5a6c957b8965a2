pub mod constants;
pub mod encrypted_data;
pub mod etype_info2;
pub mod kdc_options;
pub mod kdc_rep;
pub mod kdc_req;
pub mod kdc_req_body;
pub mod kerberos_flags;
pub mod kerberos_string;
pub mod kerberos_time;
pub mod krb_error;
pub mod krb_message;
pub mod microseconds;
pub mod pa_data;
pub mod principal_name;
pub mod realm;
pub mod tagged_ticket;

pub use der::asn1::OctetString;
