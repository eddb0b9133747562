//! API key command handlers

use std::sync::Arc;

use crate::cli::KeysCommands;
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthError, AuthService, SeaOrmAuthService};

pub async fn cmd_keys(config: &Config, command: KeysCommands) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let auth: Arc<dyn AuthService> =
        Arc::new(SeaOrmAuthService::new(store, config.security.clone()));

    match command {
        KeysCommands::Create { name } => cmd_create(auth.as_ref(), &name.join(" ")).await,
        KeysCommands::List => cmd_list(auth.as_ref()).await,
        KeysCommands::Disable { id } => cmd_disable(auth.as_ref(), id).await,
    }
}

async fn cmd_create(auth: &dyn AuthService, name: &str) -> anyhow::Result<()> {
    match auth.create_api_key(name).await {
        Ok(issued) => {
            println!("Created API key '{}' (ID: {})", issued.key.name, issued.key.id);
            println!();
            println!("  {}", issued.token);
            println!();
            println!("Store it now, it cannot be shown again.");
            Ok(())
        }
        Err(AuthError::Validation(msg)) => {
            println!("{msg}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_list(auth: &dyn AuthService) -> anyhow::Result<()> {
    let keys = auth.list_api_keys().await?;

    if keys.is_empty() {
        println!("No API keys.");
        println!();
        println!("Create one with: shufflr keys create \"my app\"");
        return Ok(());
    }

    println!("API Keys ({} total)", keys.len());
    println!("{:-<70}", "");

    for entry in keys {
        let key = entry.key;
        let status = if key.enabled { "enabled" } else { "disabled" };
        println!("[{}] {} ({status})", key.id, key.name);
        println!(
            "  Created: {} | Last used: {} | Requests: {}",
            key.created_at,
            key.last_used_at.as_deref().unwrap_or("never"),
            entry.request_count
        );
    }

    Ok(())
}

async fn cmd_disable(auth: &dyn AuthService, id: i32) -> anyhow::Result<()> {
    match auth.set_api_key_enabled(id, false).await {
        Ok(()) => println!("API key {id} disabled."),
        Err(AuthError::KeyNotFound) => println!("API key {id} not found."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
