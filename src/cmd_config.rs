//! `check-config` command.

use std::io::Write;
use std::path::Path;

use mailmate_config::{Config, ConfigValidator, ValidationResult};

/// Validate `config` and print the report. Fails when any error was found.
pub(crate) fn handle_check_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config);
    let mut stdout = std::io::stdout().lock();
    write_report(&mut stdout, path, &result)?;

    if !result.is_valid() {
        anyhow::bail!("{} configuration error(s)", result.errors.len());
    }
    Ok(())
}

fn write_report(
    out: &mut impl Write,
    path: &Path,
    result: &ValidationResult,
) -> std::io::Result<()> {
    writeln!(out, "Configuration: {}", path.display())?;
    for error in &result.errors {
        writeln!(out, "  error   {}: {}", error.path, error.message)?;
    }
    for warning in &result.warnings {
        writeln!(out, "  warning {}: {}", warning.path, warning.message)?;
    }
    if result.is_valid() {
        writeln!(out, "OK ({} warning(s))", result.warnings.len())?;
    }
    Ok(())
}
