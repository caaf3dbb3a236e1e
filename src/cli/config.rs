use std::path::PathBuf;

use clap::Args;

use crate::calling::config::{PresetCatalog, ScanConfig};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct ConfigArgs {
    /// Named preset to apply on top of the defaults
    #[arg(long)]
    pub preset: Option<String>,

    /// JSON configuration file applied after the preset
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List the embedded presets instead
    #[arg(long)]
    pub list_presets: bool,
}

/// Execute config subcommand
///
/// # Errors
///
/// Returns an error if the preset is unknown or the configuration is invalid.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ConfigArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    if args.list_presets {
        let catalog = PresetCatalog::load_embedded()?;
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&catalog.presets)?);
            }
            OutputFormat::Tsv => {
                println!("name\tdescription");
                for preset in &catalog.presets {
                    println!("{}\t{}", preset.name, preset.description);
                }
            }
            OutputFormat::Text => {
                println!("Presets (version {}):", catalog.version);
                for preset in &catalog.presets {
                    println!("  {:<12} {}", preset.name, preset.description);
                }
            }
        }
        return Ok(());
    }

    let config = ScanConfig::layered(args.preset.as_deref(), args.config.as_deref())?;
    // JSON is the only meaningful rendering of a configuration
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
