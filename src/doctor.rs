//! Health checks for askweb.
//!
//! Provides the `doctor` command functionality:
//! - Configuration checks (API key, model, endpoints)
//! - Ollama connectivity and installed models

use anyhow::Result;

use crate::config::{Config, ConfigError};
use crate::ollama::OllamaClientBuilder;

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Health status for a component.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    /// Component is healthy
    Ok,
    /// Component has a warning but is functional
    Warning(String),
    /// Component is not functional
    Error(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }
}

/// Configuration health information.
#[derive(Debug)]
pub struct ConfigHealth {
    pub status: HealthStatus,
    pub search_url: Option<String>,
    pub model: Option<String>,
}

/// Ollama connectivity information.
#[derive(Debug)]
pub struct OllamaHealth {
    pub status: HealthStatus,
    pub base_url: String,
    pub models: Vec<String>,
}

// ============================================================================
// Health Check Functions
// ============================================================================

/// Performs all health checks and prints results.
///
/// Fails when any check did not pass.
pub fn run_health_checks(config: &ConfigHealth, ollama_host: &str) -> Result<()> {
    let ollama_health = check_ollama_health(ollama_host, config.model.as_deref());

    print_health_report(config, &ollama_health);

    if !config.status.is_ok() || !ollama_health.status.is_ok() {
        anyhow::bail!("health checks failed");
    }
    Ok(())
}

impl ConfigHealth {
    /// Health of a configuration that loaded successfully.
    pub fn from_config(config: &Config) -> Self {
        Self {
            status: match config.require_model() {
                Ok(_) => HealthStatus::Ok,
                Err(e) => HealthStatus::Warning(e.to_string()),
            },
            search_url: Some(config.search_url.clone()),
            model: config.model.clone(),
        }
    }

    /// Health of a configuration that failed to load.
    pub fn from_error(error: &ConfigError) -> Self {
        Self {
            status: HealthStatus::Error(error.to_string()),
            search_url: None,
            model: None,
        }
    }
}

pub fn check_ollama_health(base_url: &str, model: Option<&str>) -> OllamaHealth {
    let client = match OllamaClientBuilder::new().base_url(base_url).build() {
        Ok(c) => c,
        Err(e) => {
            return OllamaHealth {
                status: HealthStatus::Error(format!("Failed to build client: {}", e)),
                base_url: base_url.to_string(),
                models: Vec::new(),
            };
        }
    };

    let base_url = client.base_url().to_string();

    match client.list_models() {
        Ok(models) => {
            let status = match model {
                _ if models.is_empty() => HealthStatus::Warning("No models installed".to_string()),
                Some(model) if !is_model_installed(&models, model) => HealthStatus::Warning(
                    format!("Model '{}' is not installed (ollama pull {})", model, model),
                ),
                _ => HealthStatus::Ok,
            };
            OllamaHealth {
                status,
                base_url,
                models,
            }
        }
        Err(e) => OllamaHealth {
            status: HealthStatus::Error(format!("Connection failed: {}", e)),
            base_url,
            models: Vec::new(),
        },
    }
}

/// Ollama treats a bare model name as its `:latest` tag.
fn is_model_installed(installed: &[String], model: &str) -> bool {
    installed.iter().any(|name| {
        name == model || (!model.contains(':') && *name == format!("{}:latest", model))
    })
}

// ============================================================================
// Pretty Printing
// ============================================================================

fn status_symbol(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => "\u{2713}",
        HealthStatus::Warning(_) => "!",
        HealthStatus::Error(_) => "\u{2717}",
    }
}

fn status_color(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => GREEN,
        HealthStatus::Warning(_) => YELLOW,
        HealthStatus::Error(_) => RED,
    }
}

fn status_text(status: &HealthStatus, ok: &str) -> String {
    match status {
        HealthStatus::Ok => ok.to_string(),
        HealthStatus::Warning(w) => w.clone(),
        HealthStatus::Error(e) => e.clone(),
    }
}

fn print_health_report(config: &ConfigHealth, ollama: &OllamaHealth) {
    println!("{}askweb doctor{}", BOLD, RESET);
    println!();

    println!("{}Configuration{}", BOLD, RESET);
    println!(
        "  {}{}{} Status: {}",
        status_color(&config.status),
        status_symbol(&config.status),
        RESET,
        status_text(&config.status, "OK")
    );
    if let Some(url) = &config.search_url {
        println!("    {}Search: {}{}", DIM, url, RESET);
    }
    if let Some(model) = &config.model {
        println!("    {}Model: {}{}", DIM, model, RESET);
    }
    println!();

    println!("{}Ollama{}", BOLD, RESET);
    println!(
        "  {}{}{} Status: {}",
        status_color(&ollama.status),
        status_symbol(&ollama.status),
        RESET,
        status_text(&ollama.status, "Connected")
    );
    println!("    {}URL: {}{}", DIM, ollama.base_url, RESET);
    if !ollama.models.is_empty() {
        let models_display = if ollama.models.len() > 3 {
            format!(
                "{}, ... ({} more)",
                ollama.models[..3].join(", "),
                ollama.models.len() - 3
            )
        } else {
            ollama.models.join(", ")
        };
        println!("    {}Models: {}{}", DIM, models_display, RESET);
    }
}
