//! Writes the `.sage` entry into a Code Runner settings file

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jsonc_parser::ParseOptions;
use sagemath_lsp_core::runner::apply_to_settings;
use sagemath_lsp_core::ExecutionMode;
use serde_json::Value;

/// Update `path` in place. A missing file starts from an empty object.
///
/// The file may contain comments and trailing commas. It is written back as
/// plain JSON, so comments are not kept.
pub fn update_settings_file(path: &Path, mode: ExecutionMode) -> Result<Value> {
    let mut settings = if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        jsonc_parser::parse_to_serde_value(&text, &ParseOptions::default())
            .with_context(|| format!("{} is not valid JSON", path.display()))?
            .unwrap_or_else(|| Value::Object(Default::default()))
    } else {
        Value::Object(Default::default())
    };

    apply_to_settings(&mut settings, mode);

    let mut text = serde_json::to_string_pretty(&settings)?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(settings)
}
