//! `irr validate`: renders the chart with a generated overlay through
//! `helm template`, retrying once with the Bitnami fallback override on
//! that provider's specific failure signature.

use camino::Utf8PathBuf;
use clap::Args;
use irr_core::errors::GeneratorError;

use super::require_exists;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the chart directory.
    chart_path: Utf8PathBuf,

    /// Values file(s) to pass to `helm template`, typically the overlay
    /// produced by `irr override`.
    #[arg(long = "values")]
    values_files: Vec<Utf8PathBuf>,
}

pub fn run(args: ValidateArgs) -> Result<(), GeneratorError> {
    require_exists(&args.chart_path)?;

    let values_files: Vec<&camino::Utf8Path> =
        args.values_files.iter().map(|p| p.as_path()).collect();

    let outcome = irr_helm::validate(&args.chart_path, &values_files)?;

    if outcome.bitnami_retry_applied {
        tracing::info!("validation succeeded after applying the Bitnami fallback override");
    } else {
        tracing::info!("validation succeeded");
    }

    Ok(())
}
