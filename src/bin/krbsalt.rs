#![deny(warnings)]
#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::disallowed_types)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]

use clap::{ArgGroup, Parser};
use krbsalt::constants::RFC_PBKDF2_SHA1_ITER;
use krbsalt::crypto::{
    decode_password_hex, string_to_key_aes128_cts_hmac_sha1_96,
    string_to_key_aes256_cts_hmac_sha1_96,
};
use krbsalt::proto::Name;
use krbsalt::{
    get_salt_from_preauth_with, salt_from_heuristic, ErrorKind, KrbError, ProbeConfig, Transport,
};
use std::path::PathBuf;
use tracing::{debug, error, info, warn, Level};

#[derive(Debug, Parser)]
#[clap(about = "Find the Kerberos salt of a principal and derive its AES keys")]
#[clap(group(ArgGroup::new("salt_source").required(true).args(["salt", "principal"])))]
struct OptParser {
    #[clap(short, long)]
    verbose: bool,
    /// Probe configuration (TOML)
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Salt to derive keys with. Skips discovery.
    #[clap(long)]
    salt: Option<String>,
    /// Principal (name@REALM) to discover the salt of.
    #[clap(long)]
    principal: Option<String>,
    #[clap(long, env = "KRBSALT_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Password as hex encoded UTF-16LE, as read from msDS-ManagedPassword.
    #[clap(long, conflicts_with = "password")]
    password_hex: Option<String>,
    /// KDC to probe. Defaults to the configured kdc, then the realm's DNS name.
    #[clap(long)]
    kdc: Option<String>,
    #[clap(long)]
    udp: bool,
    /// Use the host salt convention instead of asking the KDC.
    #[clap(long, requires = "principal")]
    heuristic: bool,
    #[clap(long)]
    no_keys: bool,
    #[clap(long, default_value_t = RFC_PBKDF2_SHA1_ITER)]
    iterations: u32,
}

fn parse_principal(principal: &str, config: &ProbeConfig) -> Result<(String, String), KrbError> {
    let name = match (principal.contains('@'), config.realm.as_deref()) {
        (false, Some(realm)) => Name::principal(principal, realm),
        _ => Name::from_principal_str(principal)?,
    };
    let (name, realm) = name.principal_name()?;
    Ok((name.to_string(), realm.to_string()))
}

async fn discover_salt(
    opt: &OptParser,
    config: &ProbeConfig,
    principal: &str,
) -> Result<String, KrbError> {
    let (name, realm) = parse_principal(principal, config)?;

    if opt.heuristic {
        return Ok(salt_from_heuristic(&name, &realm));
    }

    // Realms are conventionally the upper case DNS domain.
    let realm = realm.to_uppercase();
    let kdc = opt
        .kdc
        .clone()
        .or_else(|| config.kdc.clone())
        .unwrap_or_else(|| realm.to_lowercase());
    debug!(%kdc, %name, %realm, "probing for salt");

    match get_salt_from_preauth_with(config, &kdc, &name, &realm).await {
        Ok(salt) => Ok(salt),
        Err(err) if config.heuristic_fallback && err.kind() == ErrorKind::Transport => {
            warn!(%err, %kdc, "KDC unreachable, using the heuristic salt");
            Ok(salt_from_heuristic(&name, &realm))
        }
        Err(err) => Err(err),
    }
}

fn password(opt: &OptParser) -> Result<Option<String>, KrbError> {
    if let Some(password_hex) = &opt.password_hex {
        return decode_password_hex(password_hex).map(Some);
    }
    Ok(opt.password.clone())
}

async fn run(opt: &OptParser) -> Result<(), KrbError> {
    let mut config = match &opt.config {
        Some(path) => ProbeConfig::parse(path)?,
        None => ProbeConfig::default(),
    };
    if opt.udp {
        config.transport = Transport::Udp;
    }

    let salt = match (&opt.salt, &opt.principal) {
        (Some(salt), _) => salt.clone(),
        (None, Some(principal)) => discover_salt(opt, &config, principal).await?,
        // clap requires one of the two.
        (None, None) => unreachable!(),
    };
    println!("salt: {salt}");

    if opt.no_keys {
        return Ok(());
    }

    let Some(password) = password(opt)? else {
        info!("no password given, not deriving keys");
        return Ok(());
    };

    let aes256_key = string_to_key_aes256_cts_hmac_sha1_96(
        password.as_bytes(),
        salt.as_bytes(),
        opt.iterations,
    )?;
    let aes128_key = string_to_key_aes128_cts_hmac_sha1_96(
        password.as_bytes(),
        salt.as_bytes(),
        opt.iterations,
    )?;

    println!("AES256: {}", hex::encode(aes256_key));
    println!("AES128: {}", hex::encode(aes128_key));

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ()> {
    let opt = OptParser::parse();

    let level = if opt.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    run(&opt).await.map_err(|err| {
        error!(%err, kind = ?err.kind());
    })
}
