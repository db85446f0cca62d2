//! CLI module for the recipe gateway.
//!
//! Provides subcommands for interacting with a running server:
//! - `status` - Check that the server answers its health probe
//! - `generate <INGREDIENTS>...` - Request one recipe per ingredient list
//! - `config check` - Validate configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{ErrorResponse, GenerateRecipeRequest, HealthResponse};
use crate::config::Config;
use crate::recipe::{GeneratedRecipe, RecipeEntry, RecipeHistory};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "recipe-gateway")]
#[command(author, version, about = "Recipe generation gateway with Google sign-in", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "recipe-gateway.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Server URL to connect to
    #[arg(
        long,
        env = "RECIPE_GATEWAY_URL",
        default_value = "http://localhost:5000"
    )]
    pub api_url: String,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the server is up
    Status,

    /// Generate a recipe for each ingredient list
    Generate {
        /// Comma-separated ingredient lists, e.g. "chicken, rice, garlic"
        #[arg(required = true)]
        ingredients: Vec<String>,
    },

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

fn create_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")
}

pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Status) => cmd_status(cli).await,
        Some(Commands::Generate { ingredients }) => cmd_generate(cli, ingredients).await,
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        None => {
            // No subcommand means start the server - this is handled in main.rs
            Ok(())
        }
    }
}

async fn cmd_status(cli: &Cli) -> Result<()> {
    let client = create_client()?;
    let base_url = cli.api_url.trim_end_matches('/');

    println!("Connecting to {}...", base_url);

    let response = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .context("Failed to connect to server. Is recipe-gateway running?")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Server returned error {}: {}", status, body);
    }

    let health: HealthResponse = response
        .json()
        .await
        .context("Failed to parse health response")?;

    println!();
    println!("Status:     [OK] {}", health.status);
    println!("Message:    {}", health.message);
    println!();
    Ok(())
}

async fn cmd_generate(cli: &Cli, lists: &[String]) -> Result<()> {
    let client = create_client()?;
    let url = format!("{}/api/generate-recipe", cli.api_url.trim_end_matches('/'));
    let mut history = RecipeHistory::new();

    for ingredients in lists {
        let response = client
            .post(&url)
            .json(&GenerateRecipeRequest {
                ingredients: Some(ingredients.clone()),
            })
            .send()
            .await
            .context("Failed to connect to server. Is recipe-gateway running?")?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ErrorResponse>().await {
                Ok(err) => err.error,
                Err(_) => "Failed to generate recipe".to_string(),
            };
            anyhow::bail!("Server returned error {}: {}", status, message);
        }

        let recipe: GeneratedRecipe = response
            .json()
            .await
            .context("Failed to parse recipe response")?;
        history.push(RecipeEntry::new(ingredients.clone(), recipe));
    }

    println!("Generated {} recipe(s), newest first", history.len());
    println!();
    for entry in history.entries() {
        print_entry(entry);
    }
    Ok(())
}

fn print_entry(entry: &RecipeEntry) {
    println!("=== {} ===", entry.ingredients);
    println!(
        "{} | {}",
        entry.source_label(),
        entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!("{}", entry.content);
    println!();
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!("Defaults and environment variables will be used when starting the server.");
        println!();
    }

    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("[!!] Configuration is invalid:");
            println!("  {:#}", e);
            anyhow::bail!("Configuration check failed");
        }
    };

    if let Err(e) = config.validate() {
        println!("[!!] Configuration is invalid:");
        println!("  {:#}", e);
        anyhow::bail!("Configuration check failed");
    }

    println!("[OK] Configuration is valid!");
    println!();
    println!("=== Configuration Summary ===");
    println!();
    println!("Server:");
    println!("  Host:         {}", config.server.host);
    println!("  Port:         {}", config.server.port);
    println!("  Environment:  {:?}", config.server.environment);
    println!("  Client URL:   {}", config.client.url);
    println!();
    println!("Integrations:");
    println!(
        "  Google OAuth: {}",
        if config.google.credentials().is_some() {
            "Configured"
        } else {
            "Not configured (login disabled)"
        }
    );
    println!(
        "  Hugging Face: {}",
        if config.recipe.credential().is_some() {
            "Configured"
        } else {
            "Not configured (template recipes only)"
        }
    );
    println!();
    println!("Security:");
    println!(
        "  Rate Limiting: {}",
        if config.rate_limit.enabled {
            format!(
                "{} requests / {}s",
                config.rate_limit.requests_per_window, config.rate_limit.window_seconds
            )
        } else {
            "Disabled".to_string()
        }
    );
    println!("  Session TTL:  {}s", config.session.ttl_seconds);

    let warnings = config.warnings();
    if !warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &warnings {
            println!("  [!!] {}", warning);
        }
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_starts_server() {
        let cli = Cli::try_parse_from(["recipe-gateway"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("recipe-gateway.toml"));
    }

    #[test]
    fn test_generate_takes_several_lists() {
        let cli = Cli::try_parse_from([
            "recipe-gateway",
            "generate",
            "chicken, rice",
            "eggs, spinach",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Generate { ingredients }) => {
                assert_eq!(ingredients, vec!["chicken, rice", "eggs, spinach"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_generate_requires_ingredients() {
        assert!(Cli::try_parse_from(["recipe-gateway", "generate"]).is_err());
    }

    #[test]
    fn test_config_check_parses() {
        let cli =
            Cli::try_parse_from(["recipe-gateway", "-c", "custom.toml", "config", "check"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config(ConfigCommands::Check))
        ));
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
    }
}
