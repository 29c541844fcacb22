use crate::utils::client::ApiClient;
use anyhow::Result;
use colored::*;
use serde_json::{json, Value};

/// Execute the health check command
pub async fn execute(client: &ApiClient, format: &str) -> Result<()> {
    let status = check_server_health(client).await;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => print_health_status_text(&status),
    }

    Ok(())
}

/// An unreachable server is reported, not treated as a command failure
async fn check_server_health(client: &ApiClient) -> Value {
    match client.get("/health", None).await {
        Ok(data) => json!({
            "status": data["status"].as_str().unwrap_or("unknown"),
            "endpoint": client.base_url(),
            "server": data,
        }),
        Err(e) => json!({
            "status": "offline",
            "endpoint": client.base_url(),
            "message": e.to_string(),
        }),
    }
}

/// Print health status in a formatted text output
fn print_health_status_text(status: &Value) {
    println!("{}", "=== Trellis Health Check ===".bold());
    println!();

    let overall_status = status["status"].as_str().unwrap_or("unknown");
    let status_display = match overall_status {
        "healthy" => "HEALTHY".green().bold(),
        "offline" => "OFFLINE".red().bold(),
        _ => "UNKNOWN".white().bold(),
    };

    println!("Overall Status: {}", status_display);
    println!("Endpoint: {}", status["endpoint"].as_str().unwrap_or(""));

    if let Some(message) = status["message"].as_str() {
        println!("  {}", message);
    }

    let server = &status["server"];
    if server.is_object() {
        println!("Version: {}", server["version"].as_str().unwrap_or("?"));
        println!("Timestamp: {}", server["timestamp"].as_str().unwrap_or(""));
        println!();
        println!("{}", "Records:".bold());
        println!("{}", "─".repeat(30));
        for key in ["users", "projects", "api_keys"] {
            println!(
                "  {:<10} {}",
                key.cyan(),
                server[key].as_u64().unwrap_or_default()
            );
        }
    }
}
