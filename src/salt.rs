use crate::asn1::constants::EncryptionType;
use crate::config::ProbeConfig;
use crate::error::KrbError;
use crate::proto::KerberosReply;
use crate::transport::send_as_req_with;
use tracing::{debug, error, instrument};

// A preauth required error must advertise the AES256 salt.
const PREAUTH_SALT_ETYPES: &[EncryptionType] = &[EncryptionType::AES256_CTS_HMAC_SHA1_96];

// An AS-REP is only seen for principals with preauth disabled, and either AES
// salt is accepted from it.
const AS_REP_SALT_ETYPES: &[EncryptionType] = &[
    EncryptionType::AES256_CTS_HMAC_SHA1_96,
    EncryptionType::AES128_CTS_HMAC_SHA1_96,
];

/// Recover the principal's salt from a KDC reply to a probe AS-REQ.
pub fn extract_salt(reply: &[u8]) -> Result<String, KrbError> {
    match KerberosReply::try_from(reply)? {
        KerberosReply::PA(pa_rep) => {
            let salt = pa_rep.pa_data.salt_for(PREAUTH_SALT_ETYPES)?;
            debug!(%salt, service = %pa_rep.service, "salt from preauth required error");
            Ok(salt.to_string())
        }
        KerberosReply::AS(as_rep) => {
            let pa_data = as_rep.pa_data.as_ref().ok_or_else(|| {
                error!(name = %as_rep.name, "AS-REP carries no padata");
                KrbError::MissingPaData
            })?;
            let salt = pa_data.salt_for(AS_REP_SALT_ETYPES)?;
            debug!(%salt, name = %as_rep.name, "salt from AS-REP");
            Ok(salt.to_string())
        }
        KerberosReply::ERR(err_rep) => {
            error!(
                code = err_rep.code,
                error_code = ?err_rep.error_code(),
                error_text = ?err_rep.error_text,
                "KDC returned an error other than preauth required"
            );
            Err(KrbError::UnexpectedErrorCode(err_rep.code))
        }
    }
}

/// Probe the KDC on port 88 over TCP for the salt of `principal_name@realm`.
pub async fn get_salt_from_preauth(
    server_host: &str,
    principal_name: &str,
    realm: &str,
) -> Result<String, KrbError> {
    get_salt_from_preauth_with(&ProbeConfig::default(), server_host, principal_name, realm).await
}

#[instrument(level = "debug", skip(config))]
pub async fn get_salt_from_preauth_with(
    config: &ProbeConfig,
    server_host: &str,
    principal_name: &str,
    realm: &str,
) -> Result<String, KrbError> {
    let reply = send_as_req_with(config, server_host, principal_name, realm).await?;
    extract_salt(&reply)
}

/// The salt AD assigns to computer accounts, which is also what a managed
/// service account gets ([MS-KILE] 3.1.1.2). No network access.
pub fn salt_from_heuristic(account_name: &str, realm: &str) -> String {
    let account_name = account_name.strip_suffix('$').unwrap_or(account_name);
    format!(
        "{}host{}.{}",
        realm.to_uppercase(),
        account_name,
        realm.to_lowercase()
    )
}
