use anyhow::{anyhow, bail, Result};
use chrono::TimeDelta;

use user::{EnvSigningKey, SigningKeyProvider, TokenIssuer};

/// Print a signed token for `username`
pub fn issue(username: String, scopes: Vec<String>, ttl_secs: i64) -> Result<()> {
    if ttl_secs <= 0 {
        bail!("--ttl-secs must be positive");
    }

    let ttl = TimeDelta::try_seconds(ttl_secs)
        .ok_or_else(|| anyhow!("--ttl-secs {} is out of range", ttl_secs))?;

    let key = EnvSigningKey::default().signing_key()?;
    let token = TokenIssuer::new(&key).issue(&username, scopes, ttl)?;

    println!("{}", token);
    Ok(())
}
