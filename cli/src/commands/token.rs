//! Offline session token helpers. Nothing here talks to the server.

use anyhow::Result;
use colored::*;
use user::auth::token;

/// Decode a token and print its parts
pub fn inspect(raw: &str, format: &str) -> Result<()> {
    let parsed = token::parse(raw.trim())?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&parsed)?),
        _ => {
            println!("{}", "=== Session Token ===".bold());
            println!("{}: {}", "User".bold(), parsed.identity_id.cyan());
            println!("{}: {}", "Session".bold(), parsed.session_id);
        }
    }

    Ok(())
}

/// Print a freshly minted token for `user_id`.
///
/// The server accepts it as long as the user exists.
pub fn mint(user_id: &str) -> Result<()> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        anyhow::bail!("User id must not be empty");
    }

    println!("{}", token::mint(user_id));
    Ok(())
}
