use anyhow::{Context, Result};
use colored::*;
use std::io::Read;

use api::{AuthorizerEvent, Decision};

use super::AuthorizerArgs;

/// Evaluate one event and print the resulting policy document
pub async fn execute(event: String, format: String, args: AuthorizerArgs) -> Result<()> {
    let raw = read_event(&event)?;
    let event: AuthorizerEvent =
        serde_json::from_str(&raw).context("Event is not a valid authorizer event")?;

    let authorizer = args.build().await?;
    let decision = authorizer.authorize(&event).await?;

    match format.as_str() {
        "text" => print_decision_text(&decision),
        _ => println!("{}", serde_json::to_string_pretty(decision.response())?),
    }

    Ok(())
}

fn read_event(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        return Ok(raw);
    }

    std::fs::read_to_string(source).with_context(|| format!("Failed to read event from {}", source))
}

fn print_decision_text(decision: &Decision) {
    let response = decision.response();

    let verdict = match decision.deny_reason() {
        None => "ALLOW".green().bold(),
        Some(_) => "DENY".red().bold(),
    };
    println!("Decision: {}", verdict);
    if let Some(reason) = decision.deny_reason() {
        println!("Reason: {}", reason);
    }
    println!("Principal: {}", response.principal_id);
    println!();

    for statement in &response.policy_document.statement {
        println!("{} {}", statement.effect.to_string().bold(), statement.action);
        for resource in &statement.resource {
            println!("  {}", resource);
        }
        if let Some(condition) = &statement.condition {
            println!("  when {}", serde_json::Value::Object(condition.clone()));
        }
    }
}
