//! Template catalog, fetching, copying and `.env` handling
//!
//! This module provides:
//! - The built-in starter catalog
//! - The starters bundled into the binary
//! - Template fetching from the bundled set, a local directory or a zip mirror
//! - Template copying into a project directory
//! - `.env` editing for scaffolded projects

pub mod bundled;
pub mod catalog;
pub mod copier;
pub mod env_file;
pub mod fetcher;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

pub use catalog::{find_template, templates, EnvVar, Template};
pub use copier::{copy_template, directory_status, DirectoryStatus, ExistingFiles};
pub use fetcher::{TemplateFetcher, TemplateFiles, TemplateSource};

/// Build zip files for every catalog template found in a directory
pub fn build_zips(dir: &Path) -> Result<()> {
    if !dir.exists() {
        anyhow::bail!("Template directory not found: {}", dir.display());
    }

    println!("{}", "Building Steel template zips...".cyan().bold());
    println!();

    let mut built = 0;
    for template in templates() {
        let template_path = dir.join(&template.dir);
        if !template_path.exists() {
            eprintln!(
                "{} Template directory not found: {}",
                "Warning:".yellow(),
                template_path.display()
            );
            continue;
        }

        print!("  {} {}...", "->".blue(), template.dir);

        match fetcher::build_local_zip(dir, &template.dir) {
            Ok(zip_bytes) => {
                let zip_path = dir.join(format!("{}.zip", template.dir));
                std::fs::write(&zip_path, &zip_bytes)
                    .with_context(|| format!("Failed to write {}", zip_path.display()))?;
                println!(" {} ({} bytes)", "done".green(), zip_bytes.len());
                built += 1;
            }
            Err(e) => {
                println!(" {}", "failed".red());
                eprintln!("    Error: {}", e);
            }
        }
    }

    println!();
    println!(
        "{} {} template zip(s) in {}",
        "Built".green().bold(),
        built,
        dir.display()
    );

    Ok(())
}
