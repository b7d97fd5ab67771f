// catref CLI - vendor catalog reconciliation against an inventory snapshot

mod exit_codes;
mod review;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use catref_engine::{load_inventory_rows, load_vendor_rows, EngineConfig, MemoryInventory};
use exit_codes::{
    EXIT_INVALID_CONFIG, EXIT_REJECTED, EXIT_REVIEW_QUEUED, EXIT_RUNTIME, EXIT_SUCCESS,
};

#[derive(Parser)]
#[command(name = "catref")]
#[command(about = "Cross-reference a vendor price book against an inventory snapshot")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  catref run pricebook.toml
  catref run pricebook.toml --json
  catref run pricebook.toml --output result.json --review-dir review/")]
    Run {
        /// Path to the .toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary only
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Directory for per-reason review queue files
        #[arg(long)]
        review_dir: Option<PathBuf>,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  catref validate pricebook.toml")]
    Validate {
        /// Path to the .toml config file
        config: PathBuf,
    },
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
}

fn cli_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into() }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json, output, review_dir } => {
            cmd_run(&config, json, output, review_dir)
        }
        Commands::Validate { config } => cmd_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::from(e.code)
        }
    }
}

fn load_config(config_path: &Path) -> Result<EngineConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot read config: {e}")))?;
    EngineConfig::from_toml(&config_str).map_err(|e| cli_err(EXIT_INVALID_CONFIG, e.to_string()))
}

fn cmd_run(
    config_path: &Path,
    json_output: bool,
    output_file: Option<PathBuf>,
    review_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;

    // Resolve data files relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let inventory_path = base_dir.join(&config.inventory.file);
    let inventory_csv = std::fs::read_to_string(&inventory_path).map_err(|e| {
        cli_err(EXIT_RUNTIME, format!("cannot read {}: {e}", inventory_path.display()))
    })?;
    let snapshot = load_inventory_rows(&inventory_csv, &config.inventory)
        .map_err(|e| cli_err(EXIT_RUNTIME, e.to_string()))?;
    let mut store = MemoryInventory::new(snapshot);

    let vendor_path = base_dir.join(&config.vendor.file);
    let vendor_csv = std::fs::read_to_string(&vendor_path).map_err(|e| {
        cli_err(EXIT_RUNTIME, format!("cannot read {}: {e}", vendor_path.display()))
    })?;
    let vendor_rows = load_vendor_rows(&vendor_csv, &config.vendor)
        .map_err(|e| cli_err(EXIT_RUNTIME, e.to_string()))?;

    let result = catref_engine::run(&config, &vendor_rows, &mut store);

    // Output
    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

    let output_file = output_file.or_else(|| {
        config.output.json.as_ref().map(|p| base_dir.join(p))
    });
    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    let review_dir = review_dir.or_else(|| {
        config.output.review_dir.as_ref().map(|p| base_dir.join(p))
    });
    if let Some(ref dir) = review_dir {
        let written = review::write_review_files(dir, &result.outcomes)
            .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot write review files: {e}")))?;
        if !written.is_empty() {
            eprintln!("review files: {} in {}", written.join(", "), dir.display());
        }
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "'{}': {} records — {} applied ({} unchanged), {} queued for review, {} rejected",
        result.meta.config_name, s.total_records, s.applied, s.unchanged, s.queued, s.rejected,
    );
    for (reason, count) in &s.reason_counts {
        eprintln!("  {reason}: {count}");
    }

    if s.rejected > 0 {
        return Err(cli_err(EXIT_REJECTED, "malformed vendor rows rejected"));
    }
    if s.queued > 0 {
        return Err(cli_err(EXIT_REVIEW_QUEUED, "records queued for review"));
    }

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    eprintln!(
        "valid: '{}' with {} alt-SKU slot(s), anomaly ratio {}",
        config.name,
        config.inventory.columns.alt_skus.len(),
        config.policy.anomaly_ratio,
    );
    Ok(())
}
