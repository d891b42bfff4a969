//! Fact lookup commands: free-text search and conversation context.

use anyhow::{Context, Result};
use colored::Colorize;
use graphmem_core::{Config, Fact, GraphApi, Message, RoleType};

use super::connect;

/// Search facts by query.
pub async fn search(query: &str, limit: usize, json: bool, config: &Config) -> Result<()> {
    let client = connect(config)?;
    let facts = client
        .search(query, limit.max(1))
        .await
        .context("Knowledge graph search failed")?;
    print_facts(&facts, json)
}

/// Facts relevant to a piece of conversation, via get-memory.
pub async fn context(text: &str, max_facts: usize, json: bool, config: &Config) -> Result<()> {
    let client = connect(config)?;
    let messages = [Message::new(RoleType::User, "user", text)];
    let facts = client
        .get_memory(&messages, max_facts.max(1))
        .await
        .context("Knowledge graph memory lookup failed")?;
    print_facts(&facts, json)
}

fn print_facts(facts: &[Fact], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(facts)?);
        return Ok(());
    }

    if facts.is_empty() {
        println!("{}", "No relevant facts found".yellow());
        return Ok(());
    }

    println!("{} {} fact(s)", "Found".green(), facts.len());
    println!();
    for fact in facts {
        println!("{}", describe(fact));
    }
    Ok(())
}

fn describe(fact: &Fact) -> String {
    let mut line = format!("  {} {}: {}", "•".cyan(), fact.name.bold(), fact.fact);
    match (fact.valid_from(), fact.valid_until()) {
        (Some(from), Some(until)) => line.push_str(&format!(
            " {}",
            format!("[{} → {}]", from.format("%Y-%m-%d"), until.format("%Y-%m-%d")).dimmed()
        )),
        (Some(from), None) => line.push_str(&format!(
            " {}",
            format!("[since {}]", from.format("%Y-%m-%d")).dimmed()
        )),
        _ => {}
    }
    if !fact.is_current() {
        line.push_str(&format!(" {}", "(no longer valid)".yellow()));
    }
    line
}
