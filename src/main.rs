use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skill2cmd::cli;

#[derive(Parser)]
#[command(name = "skill2cmd", version)]
#[command(about = "Compile Claude Skill archives into Gemini CLI commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a zipped skill into a command archive
    Compile {
        /// Skill archive (.zip containing SKILL.MD and resources)
        archive: String,

        /// Command name, starting with '/' (e.g. "/my-skill")
        #[arg(short = 'n', long)]
        name: String,

        /// Directory for the output archive (default: from config, else ".")
        #[arg(short = 'o', long = "output-dir")]
        output_dir: Option<String>,

        /// Path to config file (defaults to ./skill2cmd.toml or ~/.config/skill2cmd/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Override LLM provider (gemini, anthropic, openai, openai-compatible)
        #[arg(long)]
        provider: Option<String>,

        /// Override LLM model (e.g., "gemini-2.5-pro")
        #[arg(long)]
        model: Option<String>,

        /// Override API base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Override request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Use mock LLM client instead of calling a model
        #[arg(long)]
        dry_run: bool,
    },

    /// Lint a command.toml, or the command.toml inside a compiled .zip
    Lint {
        path: String,
    },

    /// Show the effective configuration and check the API key is available
    ConfigCheck {
        /// Path to config file
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            archive,
            name,
            output_dir,
            config,
            provider,
            model,
            base_url,
            timeout,
            dry_run,
        } => {
            cli::compile::run(cli::compile::CompileArgs {
                archive,
                name,
                output_dir,
                config_path: config,
                provider,
                model,
                base_url,
                timeout_secs: timeout,
                dry_run,
            })
            .await?;
        }
        Commands::Lint { path } => cli::lint::run(&path)?,
        Commands::ConfigCheck { config } => cli::config_check::run(config)?,
    }

    Ok(())
}
