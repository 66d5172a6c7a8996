use anyhow::{bail, Result};
use colored::*;

use user::Principal;

use super::StoreArgs;

pub async fn add(username: String, scopes: Vec<String>, args: StoreArgs) -> Result<()> {
    if username.is_empty() {
        bail!("username must not be empty");
    }

    let store = args.open().await?;
    store
        .insert_principal(&Principal::new(username.as_str()).with_scopes(scopes))
        .await?;
    store.close().await?;

    println!("{} {}", "Added".green(), username);
    Ok(())
}

pub async fn remove(username: String, args: StoreArgs) -> Result<()> {
    let store = args.open().await?;
    let removed = store.remove_principal(&username).await?;
    store.close().await?;

    if removed {
        println!("{} {}", "Removed".green(), username);
    } else {
        println!("{} {}", "Not found:".yellow(), username);
    }
    Ok(())
}
