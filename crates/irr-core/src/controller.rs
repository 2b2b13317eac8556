//! Generator Controller (C9): orchestrates C1-C8 end to end and applies
//! the strict/threshold success-rate policy (§4.9, §8).

use irr_values::Value;

use crate::assembler;
use crate::cancel::CancellationToken;
use crate::errors::{
    GeneratorError, ImageProcessingError, ProcessingError, RuleApplicationError, ThresholdError,
    UnsupportedStructureError,
};
use crate::filter::{self, FilterConfig};
use crate::mapping;
use crate::model::{ChartMetadata, MappingConfig, OverrideFile, Unsupported, UnsupportedKind};
use crate::path_strategy::PathStrategy;
use crate::rules::{self, RuleRegistry};
use crate::walker;

/// Everything the controller needs beyond the chart's values tree and
/// metadata -- the knobs a CLI invocation (or a caller embedding the
/// engine) supplies.
pub struct GeneratorOptions<'a> {
    pub target_registry: String,
    pub mapping: MappingConfig,
    pub sources: Vec<String>,
    pub excludes: Vec<String>,
    pub path_strategy: &'a dyn PathStrategy,
    pub rules: &'a RuleRegistry,
    /// Any unsupported site or per-site processing error fails the run
    /// (§4.9 steps 3 and 6).
    pub strict: bool,
    /// Minimum success rate (0.0-100.0) required; `0.0` disables the
    /// check entirely regardless of `strict` (§4.9 step 7: "threshold > 0").
    pub threshold: f64,
    pub cancel: CancellationToken,
}

/// Runs the full pipeline over one chart's merged values tree and
/// produces the generated overlay.
pub fn generate(
    chart_path: &str,
    chart_name: &str,
    chart_meta: &ChartMetadata,
    values: &Value,
    options: &GeneratorOptions,
) -> Result<OverrideFile, GeneratorError> {
    // Step 2: run the walker, polling the cancellation token per
    // top-level key (§5).
    let walk_result = walker::walk(values, &options.cancel);
    if walk_result.canceled {
        return Err(GeneratorError::Canceled);
    }

    // Step 3: strict + any walker-level unsupported site (templates) is
    // fatal, reporting the first offender.
    if options.strict {
        if let Some(first) = walk_result.unsupported.first() {
            return Err(GeneratorError::UnsupportedStructure(
                UnsupportedStructureError {
                    path: first.path.render(),
                    detail: first.detail.clone(),
                },
            ));
        }
    }

    // Step 4: filter, then parse/resolve/path/assemble each eligible site,
    // aggregating errors without aborting the loop.
    let filter_config = FilterConfig::new(
        options.sources.clone(),
        options.excludes.clone(),
        &options.mapping,
    );
    let (eligible, filter_unsupported) = filter::filter(walk_result.patterns, &filter_config);
    let eligible_count = eligible.len();

    let mut site_errors = filter_unsupported;
    let mut root = Value::empty_map();
    let mut processed_count = 0usize;

    for site in eligible {
        if options.cancel.is_canceled() {
            return Err(GeneratorError::Canceled);
        }

        let resolved = match mapping::resolve(
            &options.mapping,
            &site.reference.registry,
            &options.target_registry,
        ) {
            Ok(resolved) => resolved,
            // §4.6: an unmapped registry under the mapping file's own
            // strict mode fails the whole run, not just this site.
            Err(unmapped) => return Err(GeneratorError::UnmappedRegistry(unmapped)),
        };

        let new_path = options.path_strategy.generate_path(&site.reference);

        match assembler::assemble(
            &mut root,
            &site.pattern.path,
            site.pattern.pattern_type,
            &site.reference,
            &resolved.target,
            &new_path,
        ) {
            Ok(()) => processed_count += 1,
            Err(set_path_error) => {
                site_errors.push(Unsupported {
                    path: site.pattern.path.clone(),
                    kind: UnsupportedKind::OverrideSetError,
                    detail: set_path_error.to_string(),
                });
            }
        }
    }

    // Step 5: success rate is relative to the eligible (post-filter) count.
    let success_rate = if eligible_count == 0 {
        100.0
    } else {
        (processed_count as f64 / eligible_count as f64) * 100.0
    };

    // Step 6: strict mode fails on any per-site error from the loop above.
    if options.strict && !site_errors.is_empty() {
        return Err(GeneratorError::Processing(ProcessingError(
            ImageProcessingError {
                sites: site_errors,
                total_eligible: eligible_count,
            },
        )));
    }

    // Step 7: threshold, only when explicitly set above zero.
    if options.threshold > 0.0 && success_rate < options.threshold {
        return Err(GeneratorError::Threshold(ThresholdError {
            achieved: success_rate,
            required: options.threshold,
            processed: processed_count,
            eligible: eligible_count,
        }));
    }

    // Step 8: apply provider rules.
    let (applied, _test_only) = rules::apply_rules(options.rules, chart_meta, &mut root)
        .map_err(|err| match err {
            rules::RuleError::Apply { source, .. } => {
                GeneratorError::RuleApplication(RuleApplicationError(source))
            }
        })?;
    let _ = applied;

    // Step 9.
    Ok(OverrideFile {
        chart_path: chart_path.to_string(),
        chart_name: chart_name.to_string(),
        values: root,
        unsupported: site_errors,
        processed_count,
        total_count: eligible_count,
        success_rate,
    })
}
