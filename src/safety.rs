//! Safety checks before writing output files.
//!
//! The similarity database is the one input that cannot be regenerated
//! cheaply, so no output path may point at it.

use anyhow::{bail, Result};
use std::path::Path;

/// Source patterns that must never be overwritten
const PROTECTED_PATTERNS: [&str; 3] = [".db", ".sqlite", ".sqlite3"];

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output must have the required extension (e.g., "json")
/// - Output cannot be the same as any of the provided source paths
/// - Output cannot look like a SQLite database
pub fn validate_output_path(
    output: &Path,
    required_extension: &str,
    source_paths: &[&Path],
) -> Result<()> {
    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");

    let extension = output.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !extension.eq_ignore_ascii_case(required_extension) {
        bail!(
            "Safety check failed: output file '{}' must have a .{} extension",
            output.display(),
            required_extension
        );
    }

    for source in source_paths {
        if output == *source {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    let lower = output_name.to_lowercase();
    for pattern in PROTECTED_PATTERNS {
        if lower.contains(pattern) {
            bail!(
                "Safety check failed: output '{}' matches database pattern '{}'",
                output.display(),
                pattern
            );
        }
    }

    Ok(())
}
