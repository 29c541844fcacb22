use crate::utils::client::ApiClient;
use anyhow::{anyhow, Result};
use colored::*;
use serde_json::json;

pub async fn login(client: &ApiClient, email: &str, quiet: bool) -> Result<()> {
    let data = client
        .post("/auth/login", &json!({ "email": email }), None)
        .await?;

    let token = data["token"]
        .as_str()
        .ok_or_else(|| anyhow!("Login response did not include a token"))?;

    if quiet {
        println!("{}", token);
        return Ok(());
    }

    let user = &data["user"];
    println!(
        "{} Logged in as {} ({})",
        "✓".green(),
        user["email"].as_str().unwrap_or(email).bold(),
        user["role"].as_str().unwrap_or("?").yellow()
    );
    println!("{}", token);
    println!();
    println!("Export it for later commands:");
    println!("  export TRELLIS_TOKEN={}", token);

    Ok(())
}

pub async fn whoami(client: &ApiClient, token: &str) -> Result<()> {
    let data = client.get("/auth/me", Some(token)).await?;
    let user = &data["user"];

    println!("{}", "=== Current User ===".bold());
    println!("{}: {}", "Id".bold(), user["id"].as_str().unwrap_or("").cyan());
    println!("{}: {}", "Email".bold(), user["email"].as_str().unwrap_or(""));
    println!("{}: {}", "Name".bold(), user["name"].as_str().unwrap_or(""));
    println!(
        "{}: {}",
        "Role".bold(),
        user["role"].as_str().unwrap_or("").yellow()
    );
    println!(
        "{}: {}",
        "Session".bold(),
        data["session_id"].as_str().unwrap_or("")
    );

    let permissions: Vec<&str> = data["permissions"]
        .as_array()
        .map(|p| p.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    println!("{}: {}", "Permissions".bold(), permissions.join(", ").green());

    Ok(())
}
