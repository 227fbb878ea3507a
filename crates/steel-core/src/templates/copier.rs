//! Writing template files into a project directory

use crate::templates::fetcher::TemplateFiles;
use anyhow::{Context, Result};
use std::path::{Component, Path};
use tokio::fs;

/// Files renamed on the way out (npm strips dotfiles from published packages)
const RENAME_FILES: &[(&str, &str)] = &[("_gitignore", ".gitignore")];

/// State of a project directory before scaffolding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    Missing,
    Empty,
    /// Directory has this many entries
    NonEmpty(usize),
}

/// What to do with files already present in the project directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingFiles {
    /// Delete the directory before writing the template
    Remove,
    /// Write the template on top of what is there
    Ignore,
}

/// Inspect a directory. A directory holding only `.git` counts as empty.
pub fn directory_status(dir: &Path) -> DirectoryStatus {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return DirectoryStatus::Missing;
    };
    let names: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name())
        .collect();
    match names.as_slice() {
        [] => DirectoryStatus::Empty,
        [only] if only == ".git" => DirectoryStatus::Empty,
        _ => DirectoryStatus::NonEmpty(names.len()),
    }
}

/// Whether a template key names a file inside the project directory
fn is_contained(relative: &str) -> bool {
    !relative.is_empty()
        && Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn target_name(file_path: &str) -> String {
    let (parent, name) = match file_path.rsplit_once('/') {
        Some((parent, name)) => (Some(parent), name),
        None => (None, file_path),
    };
    let renamed = RENAME_FILES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name);
    match parent {
        Some(parent) => format!("{}/{}", parent, renamed),
        None => renamed.to_string(),
    }
}

/// Set the `name` field of a `package.json` document
fn rename_package(content: &[u8], project_name: &str) -> Result<Vec<u8>> {
    let mut pkg: serde_json::Value =
        serde_json::from_slice(content).context("Failed to parse template package.json")?;
    if let Some(obj) = pkg.as_object_mut() {
        obj.insert(
            "name".to_string(),
            serde_json::Value::String(project_name.to_string()),
        );
    }
    let mut out = serde_json::to_string_pretty(&pkg)?;
    out.push('\n');
    Ok(out.into_bytes())
}

/// Copy template files to the target directory.
///
/// Returns the paths written, relative to `target_dir`. Nothing is written
/// if any path would land outside `target_dir`.
pub async fn copy_template(
    files: &TemplateFiles,
    target_dir: &Path,
    existing: ExistingFiles,
) -> Result<Vec<String>> {
    if let Some(bad) = files.keys().find(|k| !is_contained(k)) {
        anyhow::bail!("Refusing to write template file outside the project: {}", bad);
    }

    if existing == ExistingFiles::Remove && target_dir.exists() {
        fs::remove_dir_all(target_dir)
            .await
            .with_context(|| format!("Failed to remove {}", target_dir.display()))?;
    }

    fs::create_dir_all(target_dir)
        .await
        .context("Failed to create target directory")?;

    let project_name = target_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "steel-project".to_string());

    let mut copied_files = Vec::new();

    for (file_path, content) in files {
        let relative = target_name(file_path);
        let target_path = target_dir.join(&relative);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = if relative == "package.json" {
            rename_package(content, &project_name)?
        } else {
            content.clone()
        };

        fs::write(&target_path, &content)
            .await
            .with_context(|| format!("Failed to write file: {}", target_path.display()))?;

        copied_files.push(relative);
    }

    Ok(copied_files)
}
