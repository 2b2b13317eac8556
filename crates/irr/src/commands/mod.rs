pub mod inspect;
pub mod override_cmd;
pub mod validate_cmd;

use camino::Utf8PathBuf;
use irr_core::errors::{GeneratorError, LoadingError};
use irr_core::model::MappingConfig;

/// Loads the registry mapping file at `path`, if given; an absent path
/// means "no mapping file", not an error.
pub fn load_mapping(path: &Option<Utf8PathBuf>) -> Result<MappingConfig, GeneratorError> {
    match path {
        Some(path) => Ok(irr_helm::load_mapping_file(path)
            .map_err(GeneratorError::Loading)?),
        None => Ok(MappingConfig::default()),
    }
}

pub fn load_chart(path: &Utf8PathBuf) -> Result<(irr_core::model::ChartMetadata, irr_values::Value), GeneratorError> {
    irr_helm::load_chart(path).map_err(GeneratorError::Loading)
}

/// Surfaces a chart-not-found/unreadable path as a [`LoadingError`]
/// before any of the pipeline gets a chance to run.
pub fn require_exists(path: &Utf8PathBuf) -> Result<(), GeneratorError> {
    if path.exists() {
        Ok(())
    } else {
        Err(GeneratorError::Loading(LoadingError::ChartNotFound {
            path: path.to_string(),
        }))
    }
}
