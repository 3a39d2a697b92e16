use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::CompileError;
use crate::lint::CommandLinter;
use crate::llm::factory;
use crate::pipeline::compiler::PromptCompiler;
use crate::pipeline::generator::{CompileStatus, Generator};
use crate::pipeline::packager::{self, validate_command_name, OutputArchive};

/// Options for one `compile` invocation; `None` fields fall back to config.
#[derive(Debug, Clone, Default)]
pub struct CompileArgs {
    pub archive: String,
    pub name: String,
    pub output_dir: Option<String>,
    pub config_path: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub dry_run: bool,
}

fn apply_overrides(config: &mut Config, args: &CompileArgs) {
    if let Some(ref provider) = args.provider {
        info!("CLI override: provider = {}", provider);
        if *provider != config.llm.provider {
            // Key variable follows the provider
            if let Some(var) = config.llm.api_key_env.take() {
                warn!(
                    "Ignoring api_key_env = {} for provider {}; using the provider's own key variable",
                    var, provider
                );
            }
            config.llm.provider = provider.clone();
        }
    }
    if let Some(ref model) = args.model {
        info!("CLI override: model = {}", model);
        config.llm.model = model.clone();
    }
    if let Some(ref base_url) = args.base_url {
        info!("CLI override: base_url = {}", base_url);
        config.llm.base_url = Some(base_url.clone());
    }
    if let Some(timeout) = args.timeout_secs {
        info!("CLI override: timeout = {}s", timeout);
        config.llm.timeout_secs = timeout;
    }
    if let Some(ref dir) = args.output_dir {
        config.compile.output_dir = dir.clone();
    }
}

/// Read the input archive, refusing files over the configured size limit.
fn read_input(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    if !path.exists() {
        bail!("Archive not found: {}", path.display());
    }
    let size = fs::metadata(path)
        .with_context(|| format!("Cannot stat {}", path.display()))?
        .len();
    if size > max_bytes {
        bail!(
            "Archive {} is {} bytes, over the {} byte limit (compile.max_archive_bytes)",
            path.display(),
            size,
            max_bytes
        );
    }
    fs::read(path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Terminal state reported for a finished run.
fn final_status(result: &Result<PathBuf>) -> CompileStatus {
    match result {
        Ok(path) => CompileStatus::Success {
            file_name: path.display().to_string(),
        },
        Err(e) => CompileStatus::Error {
            message: format!("{:#}", e),
        },
    }
}

/// Compile a skill archive into a command archive.
///
/// Returns the written archive path; Ctrl-C cancels the model call and
/// nothing is written.
pub async fn run(args: CompileArgs) -> Result<PathBuf> {
    let status = CompileStatus::default();
    debug!("Compile status: {}", status);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling compilation");
            on_interrupt.cancel();
        }
    });

    let result = run_with_cancel(args, &cancel).await;
    watcher.abort();

    let status = final_status(&result);
    match &status {
        CompileStatus::Error { .. } => error!("Compile status: {}", status),
        _ => info!("Compile status: {}", status),
    }

    result
}

/// Write the archive unless the run was cancelled after generation.
fn deliver_unless_cancelled(
    archive: &OutputArchive,
    dir: &Path,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    if cancel.is_cancelled() {
        return Err(CompileError::Cancelled.into());
    }
    Ok(packager::deliver(archive, dir)?)
}

/// [`run`] with a caller-owned cancellation token.
pub async fn run_with_cancel(args: CompileArgs, cancel: &CancellationToken) -> Result<PathBuf> {
    validate_command_name(&args.name)?;

    let mut config = Config::load_with_path(args.config_path.clone())?;
    apply_overrides(&mut config, &args);

    let archive_path = Path::new(&args.archive);
    info!("Skill archive: {}", archive_path.display());
    info!("Command name: {}", args.name);
    info!("Dry run: {}", args.dry_run);

    let bytes = read_input(archive_path, config.compile.max_archive_bytes)?;

    let client = factory::create_client(&config.llm, args.dry_run)?;
    if args.dry_run {
        info!("Using mock LLM client");
    } else {
        info!(
            "Using {} LLM provider with model {}",
            config.llm.provider, config.llm.model
        );
    }

    let compiler = PromptCompiler::new(client)
        .with_timeout(Duration::from_secs(config.llm.timeout_secs));
    let generator =
        Generator::new(compiler).with_extract_limit(config.compile.max_extracted_bytes);

    let generated = generator.generate(&bytes, &args.name, cancel).await?;

    // Advisory only: the archive is delivered either way
    let linter = CommandLinter::new();
    let issues = linter.lint(generated.document.as_str());
    linter.print_issues(&issues);

    let path = deliver_unless_cancelled(
        &generated.archive,
        Path::new(&config.compile.output_dir),
        cancel,
    )?;
    println!("✓ Compiled {} → {}", args.name, path.display());
    println!("  Unzip it and follow README.md to install the command in Gemini CLI.");

    Ok(path)
}
