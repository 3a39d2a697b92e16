use anyhow::Result;
use std::env;

use crate::config::{Config, LOCAL_CONFIG_FILE};

const KNOWN_PROVIDERS: [&str; 4] = ["gemini", "anthropic", "openai", "openai-compatible"];

/// State of the credential environment variable, never its value.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyStatus {
    NotRequired,
    Set(String),
    Missing(String),
}

pub fn key_status(config: &Config) -> KeyStatus {
    match config.llm.key_env_var() {
        None => KeyStatus::NotRequired,
        Some(var) => match env::var(&var) {
            Ok(value) if !value.trim().is_empty() => KeyStatus::Set(var),
            _ => KeyStatus::Missing(var),
        },
    }
}

/// Problems that would make `compile` fail before or at the model call.
pub fn check(config: &Config) -> Vec<String> {
    let mut problems = Vec::new();

    if !KNOWN_PROVIDERS.contains(&config.llm.provider.as_str()) {
        problems.push(format!(
            "Unknown provider '{}' (expected one of: {})",
            config.llm.provider,
            KNOWN_PROVIDERS.join(", ")
        ));
    }
    if config.llm.model.trim().is_empty() {
        problems.push("llm.model is empty".to_string());
    }
    if config.llm.timeout_secs == 0 {
        problems.push("llm.timeout_secs must be greater than zero".to_string());
    }
    if let KeyStatus::Missing(var) = key_status(config) {
        if config.llm.provider != "openai-compatible" {
            problems.push(format!("API key variable {} is not set", var));
        }
    }

    problems
}

pub fn run(config_path: Option<String>) -> Result<()> {
    let source = match &config_path {
        Some(path) => path.clone(),
        None => {
            if std::path::Path::new(LOCAL_CONFIG_FILE).exists() {
                format!("./{}", LOCAL_CONFIG_FILE)
            } else {
                Config::user_config_path()
                    .filter(|p| p.exists())
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "built-in defaults".to_string())
            }
        }
    };
    let config = Config::load_with_path(config_path)?;

    println!("Configuration: {}", source);
    println!("  provider:          {}", config.llm.provider);
    println!("  model:             {}", config.llm.model);
    if let Some(ref url) = config.llm.base_url {
        println!("  base_url:          {}", url);
    }
    println!("  max_tokens:        {}", config.llm.get_max_tokens());
    println!("  timeout_secs:      {}", config.llm.timeout_secs);
    println!("  max_archive_bytes: {}", config.compile.max_archive_bytes);
    println!("  max_extracted_bytes: {}", config.compile.max_extracted_bytes);
    println!("  output_dir:        {}", config.compile.output_dir);
    match key_status(&config) {
        KeyStatus::NotRequired => println!("  api key:           not required"),
        KeyStatus::Set(var) => println!("  api key:           ${} is set", var),
        KeyStatus::Missing(var) => println!("  api key:           ${} is NOT set", var),
    }

    let problems = check(&config);
    if problems.is_empty() {
        println!("\n✓ Configuration looks usable");
    } else {
        println!("\nProblems:");
        for problem in &problems {
            println!("  • {}", problem);
        }
        anyhow::bail!("{} configuration problem(s) found", problems.len());
    }

    Ok(())
}
