mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_ARCHIVE_ERROR, EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use sealcheck_core::{install_signal_handler, CoreError, VerifyConfig, VerifyOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "sealcheck",
    version,
    about = "Verify that an evidence archive matches a manifest of SHA-256 hashes"
)]
struct Cli {
    /// Config file (defaults to ./sealcheck.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Verify an archive against a hash manifest.
    Verify {
        /// Hash manifest (`SHA256 <hex> <absolute path>` per line).
        manifest: PathBuf,
        /// Archive to verify (.zip, .tar, .tar.gz or .tgz).
        archive: PathBuf,
        /// Directory the manifest paths are relative to (inferred when omitted).
        #[arg(long)]
        base_dir: Option<String>,
        /// Number of files digested in parallel.
        #[arg(long)]
        jobs: Option<usize>,
        /// Parent directory for the temporary extraction area.
        #[arg(long)]
        work_dir: Option<PathBuf>,
        /// Also list files that matched.
        #[arg(long, default_value_t = false)]
        show_matched: bool,
    },
    /// Show parsed manifest entries, base directory, and diagnostics.
    InspectManifest {
        manifest: PathBuf,
        /// Directory the manifest paths are relative to (inferred when omitted).
        #[arg(long)]
        base_dir: Option<String>,
    },
    /// Show the effective root and file keys of an archive.
    InspectArchive {
        archive: PathBuf,
        /// Parent directory for the temporary extraction area.
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SEALCHECK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let json_output = cli.json;
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Verify {
            manifest,
            archive,
            base_dir,
            jobs,
            work_dir,
            show_matched,
        } => effective_config(
            config_path,
            VerifyConfig {
                base_directory: base_dir,
                jobs,
                work_dir,
            },
        )
        .and_then(|config| {
            commands::verify::run(
                &manifest,
                &archive,
                VerifyOptions::from_config(&config),
                config.work_dir.as_deref(),
                show_matched,
                json_output,
            )
        }),
        Commands::InspectManifest { manifest, base_dir } => effective_config(
            config_path,
            VerifyConfig {
                base_directory: base_dir,
                ..VerifyConfig::default()
            },
        )
        .and_then(|config| {
            commands::inspect_manifest::run(
                &manifest,
                config.base_directory.as_deref(),
                json_output,
            )
        }),
        Commands::InspectArchive { archive, work_dir } => effective_config(
            config_path,
            VerifyConfig {
                work_dir,
                ..VerifyConfig::default()
            },
        )
        .and_then(|config| {
            commands::inspect_archive::run(&archive, config.work_dir.as_deref(), json_output)
        }),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

/// Config file values overlaid with command-line flags.
fn effective_config(path: Option<&Path>, flags: VerifyConfig) -> Result<VerifyConfig, String> {
    let file = match path {
        Some(path) => VerifyConfig::load(path).map_err(|e| CoreError::from(e).to_string())?,
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| format!("cannot read current directory: {e}"))?;
            VerifyConfig::discover(&cwd)
                .map_err(|e| CoreError::from(e).to_string())?
                .unwrap_or_default()
        }
    };
    let merged = file.merged_with(flags);
    merged
        .validate()
        .map_err(|e| CoreError::from(e).to_string())?;
    debug!(
        "effective config: base_directory={:?} jobs={:?} work_dir={:?}",
        merged.base_directory, merged.jobs, merged.work_dir
    );
    Ok(merged)
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("manifest error:") || msg.starts_with("failed to read manifest") {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("archive error:") {
        EXIT_ARCHIVE_ERROR
    } else {
        EXIT_FAILURE
    }
}
