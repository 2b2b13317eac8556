//! `irr override`: runs the full pipeline and writes the generated
//! overlay values file.

use anstream::print;
use camino::Utf8PathBuf;
use clap::Args;
use irr_core::cancel::CancellationToken;
use irr_core::controller::{self, GeneratorOptions};
use irr_core::errors::GeneratorError;
use irr_core::path_strategy::PrefixSourceRegistry;
use irr_core::rules::RuleRegistry;

use super::{load_chart, load_mapping, require_exists};

#[derive(Args)]
pub struct OverrideArgs {
    /// Path to the chart directory.
    chart_path: Utf8PathBuf,

    /// The registry images are rewritten to point at, used whenever
    /// neither the mapping file nor its `defaultTarget` apply.
    #[arg(long)]
    target_registry: String,

    #[arg(long)]
    mapping_file: Option<Utf8PathBuf>,

    /// Registries to rewrite. Derived from the mapping file when omitted.
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Registries to never rewrite.
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// Require a 100% success rate across every detected image site.
    #[arg(long)]
    strict: bool,

    /// Minimum success rate required when not running in `--strict` mode.
    #[arg(long, default_value_t = 0.0)]
    threshold: f64,

    /// Where to write the generated overlay. Defaults to stdout.
    #[arg(long)]
    output: Option<Utf8PathBuf>,

    /// Run the provider rules engine (e.g. the Bitnami security-bypass
    /// rule) over the generated overlay (§6, §4.8). On by default.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    rules_enabled: bool,
}

pub fn run(args: OverrideArgs) -> Result<(), GeneratorError> {
    require_exists(&args.chart_path)?;
    let mapping = load_mapping(&args.mapping_file)?;
    let (chart_metadata, values) = load_chart(&args.chart_path)?;

    let path_strategy = PrefixSourceRegistry;
    let rules = if args.rules_enabled {
        RuleRegistry::with_defaults()
    } else {
        RuleRegistry::new()
    };

    let options = GeneratorOptions {
        target_registry: args.target_registry,
        mapping,
        sources: args.sources,
        excludes: args.excludes,
        path_strategy: &path_strategy,
        rules: &rules,
        strict: args.strict,
        threshold: args.threshold,
        cancel: CancellationToken::new(),
    };

    let chart_name = args
        .chart_path
        .file_name()
        .unwrap_or("chart")
        .to_string();

    let overlay = controller::generate(
        args.chart_path.as_str(),
        &chart_name,
        &chart_metadata,
        &values,
        &options,
    )?;

    let rendered = serde_yaml::to_string(&overlay.values).map_err(|source| {
        GeneratorError::Loading(irr_core::errors::LoadingError::ValuesParse {
            path: "<generated overlay>".to_string(),
            source,
        })
    })?;

    match args.output {
        Some(path) => std::fs::write(&path, &rendered).map_err(|source| {
            GeneratorError::Loading(irr_core::errors::LoadingError::Io {
                path: path.to_string(),
                source,
            })
        })?,
        None => print!("{rendered}"),
    }

    tracing::info!(
        processed = overlay.processed_count,
        total = overlay.total_count,
        success_rate = overlay.success_rate,
        unsupported = overlay.unsupported.len(),
        "override generation complete"
    );

    Ok(())
}
