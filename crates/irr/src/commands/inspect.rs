//! `irr inspect`: reports every detected image pattern without writing
//! an overlay.

use anstream::print;
use camino::Utf8PathBuf;
use clap::Args;
use irr_core::errors::GeneratorError;
use irr_core::filter::FilterConfig;
use irr_core::model::{GlobalPattern, ImagePattern, Unsupported};
use irr_core::walker;
use serde::Serialize;

use super::{load_chart, load_mapping, require_exists};

#[derive(Args)]
pub struct InspectArgs {
    /// Path to the chart directory.
    chart_path: Utf8PathBuf,

    /// Registry mapping file; patterns are reported regardless, but
    /// source derivation (when `--source` is omitted) uses its entries.
    #[arg(long)]
    mapping_file: Option<Utf8PathBuf>,

    /// Registries to report on. Derived from the mapping file when omitted.
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Registries to always exclude from the report.
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// Instead of the inspection report, write an annotated registry
    /// mapping file template with one `mappings` entry per source
    /// registry detected in this chart (§6).
    #[arg(long)]
    generate_config_skeleton: bool,
}

#[derive(Serialize)]
struct InspectReport {
    chart_path: String,
    patterns: Vec<ImagePattern>,
    unsupported: Vec<Unsupported>,
    globals: Vec<GlobalPattern>,
}

pub fn run(args: InspectArgs) -> Result<(), GeneratorError> {
    require_exists(&args.chart_path)?;
    let mapping = load_mapping(&args.mapping_file)?;
    let (_metadata, values) = load_chart(&args.chart_path)?;

    let walk_result = walker::walk(&values, &irr_core::CancellationToken::new());

    if args.generate_config_skeleton {
        let registries = irr_core::filter::detected_registries(&walk_result.patterns);
        print!("{}", irr_helm::mapping_file::skeleton_yaml_for(&registries));
        return Ok(());
    }

    let filter_config = FilterConfig::new(args.sources, args.excludes, &mapping);
    let (eligible, mut unsupported) =
        irr_core::filter::filter(walk_result.patterns, &filter_config);
    unsupported.extend(walk_result.unsupported);

    let report = InspectReport {
        chart_path: args.chart_path.to_string(),
        patterns: eligible.into_iter().map(|e| e.pattern).collect(),
        unsupported,
        globals: walk_result.globals,
    };

    let rendered = serde_yaml::to_string(&report).map_err(|source| {
        GeneratorError::Loading(irr_core::errors::LoadingError::ValuesParse {
            path: "<inspect report>".to_string(),
            source,
        })
    })?;
    print!("{rendered}");

    Ok(())
}
