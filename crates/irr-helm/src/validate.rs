//! `validate` support: shells out to `helm template` to confirm a
//! generated overlay actually renders, retrying once with
//! `global.security.allowInsecureImages=true` when the failure matches
//! the Bitnami image-verification signature (§4.8).

use std::io::Write;
use std::process::Command;

use camino::Utf8Path;
use irr_core::errors::GeneratorError;
use irr_core::rules::bitnami::check_validation_failure;
use tracing::{info, warn};

/// The result of one `validate` invocation, including whether the
/// Bitnami fallback had to kick in.
#[derive(Debug)]
pub struct ValidateOutcome {
    pub helm_exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub bitnami_retry_applied: bool,
}

/// Runs `helm template <chart_path> -f <values_files...>`, retrying once
/// with the Bitnami fallback override if the first attempt fails with
/// that provider's specific signature.
pub fn validate(
    chart_path: &Utf8Path,
    values_files: &[&Utf8Path],
) -> Result<ValidateOutcome, GeneratorError> {
    let (exit_code, stdout, stderr) = run_helm_template(chart_path, values_files)?;

    if exit_code == 0 {
        return Ok(ValidateOutcome {
            helm_exit_code: exit_code,
            stdout,
            stderr,
            bitnami_retry_applied: false,
        });
    }

    if let Some(directive) = check_validation_failure(exit_code, &stderr) {
        info!(
            path = directive.set_path,
            "retrying helm template with Bitnami image-verification override"
        );

        let fallback_values = write_fallback_values_file(directive.set_path, directive.set_value)?;
        let mut files_with_fallback = values_files.to_vec();
        files_with_fallback.push(fallback_values.as_path());

        let (retry_exit_code, retry_stdout, retry_stderr) =
            run_helm_template(chart_path, &files_with_fallback)?;

        std::fs::remove_file(&fallback_values).ok();

        if retry_exit_code == 0 {
            return Ok(ValidateOutcome {
                helm_exit_code: retry_exit_code,
                stdout: retry_stdout,
                stderr: retry_stderr,
                bitnami_retry_applied: true,
            });
        }

        warn!("Bitnami fallback retry did not resolve the validation failure");
        return Err(GeneratorError::ValidationFailed {
            helm_exit_code: retry_exit_code,
            stderr: retry_stderr,
        });
    }

    Err(GeneratorError::ValidationFailed {
        helm_exit_code: exit_code,
        stderr,
    })
}

fn run_helm_template(
    chart_path: &Utf8Path,
    values_files: &[&Utf8Path],
) -> Result<(i32, String, String), GeneratorError> {
    let mut command = Command::new("helm");
    command.args(["template", chart_path.as_str()]);
    for values_file in values_files {
        command.args(["-f", values_file.as_str()]);
    }

    let output = command.output().map_err(|source| {
        GeneratorError::ValidationFailed {
            helm_exit_code: -1,
            stderr: format!("failed to spawn helm: {source}"),
        }
    })?;

    Ok((
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    ))
}

fn write_fallback_values_file(
    path: &str,
    value: bool,
) -> Result<camino::Utf8PathBuf, GeneratorError> {
    let segments: Vec<&str> = path.split('.').collect();
    let yaml = render_nested_yaml(&segments, value);

    let file_path = camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string())
        .join(format!("irr-bitnami-fallback-{}.yaml", std::process::id()));

    let mut file = std::fs::File::create(&file_path).map_err(|source| {
        GeneratorError::ValidationFailed {
            helm_exit_code: -1,
            stderr: format!("failed to write fallback values file: {source}"),
        }
    })?;
    file.write_all(yaml.as_bytes())
        .map_err(|source| GeneratorError::ValidationFailed {
            helm_exit_code: -1,
            stderr: format!("failed to write fallback values file: {source}"),
        })?;

    Ok(file_path)
}

fn render_nested_yaml(segments: &[&str], value: bool) -> String {
    match segments.split_first() {
        Some((head, rest)) if !rest.is_empty() => {
            let inner = render_nested_yaml(rest, value);
            let indented: String = inner
                .lines()
                .map(|line| format!("  {line}\n"))
                .collect();
            format!("{head}:\n{indented}")
        }
        Some((head, _)) => format!("{head}: {value}\n"),
        None => String::new(),
    }
}
