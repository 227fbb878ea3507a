//! Starter templates compiled into the binary

use crate::templates::fetcher::TemplateFiles;
use anyhow::Result;
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "../../templates/"]
#[exclude = "*.zip"]
#[exclude = "*.DS_Store"]
struct BundledTemplates;

/// Files of one bundled template, keyed by path relative to its directory
pub fn read_template(template_dir: &str) -> Result<TemplateFiles> {
    let prefix = format!("{}/", template_dir);
    let mut files = TemplateFiles::new();
    for path in BundledTemplates::iter() {
        let Some(relative) = path.strip_prefix(&prefix) else {
            continue;
        };
        if let Some(file) = BundledTemplates::get(&path) {
            files.insert(relative.to_string(), file.data.into_owned());
        }
    }
    if files.is_empty() {
        anyhow::bail!("No bundled template named '{}'", template_dir);
    }
    Ok(files)
}
