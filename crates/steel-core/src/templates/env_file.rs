//! `.env` file editing for scaffolded projects

use anyhow::{Context, Result};
use std::path::Path;

pub const ENV_FILE: &str = ".env";
pub const ENV_EXAMPLE_FILE: &str = ".env.example";

/// Set `key` in the contents of a `.env` file.
///
/// An existing assignment is rewritten in place, or kept as is when
/// `value` is blank. A missing key is appended. Comments and blank lines
/// are never touched.
pub fn set_env_value(content: &str, key: &str, value: &str) -> String {
    let mut found = false;
    let mut lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return line.to_string();
            }
            let current_key = line.split('=').next().unwrap_or_default();
            if current_key != key {
                return line.to_string();
            }
            found = true;
            if value.trim().is_empty() {
                line.to_string()
            } else {
                format!("{}={}", key, encode_value(value))
            }
        })
        .collect();

    if !found {
        // Keep a trailing newline trailing
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
            lines.push(format!("{}={}", key, encode_value(value)));
            lines.push(String::new());
        } else {
            lines.push(format!("{}={}", key, encode_value(value)));
        }
    }

    lines.join("\n")
}

fn encode_value(value: &str) -> String {
    let quoted = if value.contains(' ') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    };
    quoted.replace('\\', "\\\\")
}

/// Update one variable in `<directory>/.env`, creating the file if needed
pub fn update_env_variable(directory: &Path, key: &str, value: &str) -> Result<()> {
    let env_path = directory.join(ENV_FILE);
    let content = if env_path.exists() {
        std::fs::read_to_string(&env_path)
            .with_context(|| format!("Failed to read {}", env_path.display()))?
    } else {
        String::new()
    };

    let content = if content.is_empty() {
        format!("{}={}\n", key, encode_value(value))
    } else {
        set_env_value(&content, key, value)
    };

    std::fs::write(&env_path, content)
        .with_context(|| format!("Failed to write {}", env_path.display()))
}

/// Move `.env.example` to `.env` if the example exists.
///
/// Returns whether an example file was found.
pub fn promote_env_example(directory: &Path) -> Result<bool> {
    let example = directory.join(ENV_EXAMPLE_FILE);
    if !example.exists() {
        return Ok(false);
    }
    let target = directory.join(ENV_FILE);
    std::fs::copy(&example, &target)
        .with_context(|| format!("Failed to copy {} to {}", example.display(), target.display()))?;
    std::fs::remove_file(&example)
        .with_context(|| format!("Failed to remove {}", example.display()))?;
    Ok(true)
}

/// Read a variable's raw value from `<directory>/.env`, if set and non-empty
pub fn read_env_value(directory: &Path, key: &str) -> Option<String> {
    let content = std::fs::read_to_string(directory.join(ENV_FILE)).ok()?;
    content.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key && !v.trim().is_empty()).then(|| v.trim().to_string())
    })
}
