//! Template fetching from the bundled set, a local directory or a mirror
//!
//! The starters under `templates/` are compiled into the binary and used by
//! default. `--template-dir` reads `<template-dir>/<template>/` from disk
//! instead. Setting `STEEL_TEMPLATE_URL` fetches pre-built zips named
//! `<template>.zip` (as written by `steel build-zips`) from that base URL.

use crate::templates::bundled;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use url::Url;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Environment variable naming a base URL that serves template zips
pub const TEMPLATE_URL_ENV: &str = "STEEL_TEMPLATE_URL";

/// Relative path -> file contents
pub type TemplateFiles = BTreeMap<String, Vec<u8>>;

/// Where template files come from
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Starters compiled into the binary
    Bundled,
    Remote(Url),
    Local(PathBuf),
}

impl TemplateSource {
    /// Remote source from `STEEL_TEMPLATE_URL`, if it is set
    pub fn remote_from_env() -> Result<Option<Self>> {
        let url_str = match std::env::var(TEMPLATE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };
        let url =
            Url::parse(&url_str).with_context(|| format!("Invalid template URL: {}", url_str))?;
        Ok(Some(Self::Remote(url)))
    }

    /// Local directory if given, else a remote mirror if configured, else bundled
    pub fn resolve(template_dir: Option<&Path>) -> Result<Self> {
        if let Some(path) = template_dir {
            return Ok(Self::Local(path.to_path_buf()));
        }
        Ok(Self::remote_from_env()?.unwrap_or(Self::Bundled))
    }
}

/// Template fetcher - handles retrieving templates from remote or local sources
pub struct TemplateFetcher {
    source: TemplateSource,
    client: reqwest::Client,
    cache: HashMap<String, TemplateFiles>,
}

impl TemplateFetcher {
    pub fn new(source: TemplateSource, user_agent: &str) -> Self {
        Self {
            source,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            cache: HashMap::new(),
        }
    }

    /// Build a URL by appending a path segment, preserving query parameters
    fn build_url(base: &Url, path_segment: &str) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("URL cannot have path segments: {}", base))?
            .pop_if_empty()
            .push(path_segment);
        Ok(url)
    }

    /// Fetch all files of a template, keyed by path relative to the template root
    pub async fn fetch_files(&mut self, template_dir: &str) -> Result<TemplateFiles> {
        if let Some(files) = self.cache.get(template_dir) {
            return Ok(files.clone());
        }

        let files = match &self.source {
            TemplateSource::Remote(base_url) => {
                let zip_url = Self::build_url(base_url, &format!("{}.zip", template_dir))?;
                log::debug!("fetching template zip {}", zip_url);
                let response = self
                    .client
                    .get(zip_url.clone())
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch template zip: {}", template_dir))?;

                if !response.status().is_success() {
                    anyhow::bail!(
                        "Failed to fetch template '{}' zip from {}: HTTP {}",
                        template_dir,
                        zip_url,
                        response.status()
                    );
                }

                let bytes = response.bytes().await?;
                extract_zip(&bytes, template_dir)?
            }
            TemplateSource::Local(root) => read_local_template(root, template_dir)?,
            TemplateSource::Bundled => bundled::read_template(template_dir)?,
        };

        self.cache.insert(template_dir.to_string(), files.clone());
        Ok(files)
    }
}

/// Read every file below `<root>/<template_dir>`
fn read_local_template(root: &Path, template_dir: &str) -> Result<TemplateFiles> {
    let template_path = root.join(template_dir);
    if !template_path.is_dir() {
        anyhow::bail!("Template directory not found: {}", template_path.display());
    }

    let mut files = TemplateFiles::new();
    for entry in WalkDir::new(&template_path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", template_path.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&template_path)
            .context("Template file outside template directory")?;
        let key = path_key(relative);
        let content = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        files.insert(key, content);
    }

    if files.is_empty() {
        anyhow::bail!("Template '{}' has no files", template_dir);
    }
    Ok(files)
}

/// Extract a template zip whose entries are prefixed with `<template_dir>/`.
///
/// Entries whose names would resolve outside the extraction root are rejected.
fn extract_zip(zip_bytes: &[u8], template_dir: &str) -> Result<TemplateFiles> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))
        .with_context(|| format!("Failed to read zip archive for template '{}'", template_dir))?;

    let mut files = TemplateFiles::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let Some(enclosed) = file.enclosed_name() else {
            anyhow::bail!(
                "Template '{}' contains an unsafe path: {}",
                template_dir,
                file.name()
            );
        };
        let relative = enclosed
            .strip_prefix(template_dir)
            .unwrap_or(enclosed.as_path());
        let key = path_key(relative);
        if key.is_empty() {
            continue;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        files.insert(key, contents);
    }

    Ok(files)
}

/// `/`-separated key for a relative path
fn path_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Pack `<root>/<template_dir>` into a zip in the layout [`TemplateFetcher`] expects
pub fn build_local_zip(root: &Path, template_dir: &str) -> Result<Vec<u8>> {
    let files = read_local_template(root, template_dir)?;

    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (path, content) in &files {
            zip.start_file(format!("{}/{}", template_dir, path), options)?;
            zip.write_all(content)?;
        }
        zip.finish()?;
    }

    Ok(zip_buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_template(root: &Path) {
        let dir = root.join("demo-starter");
        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(dir.join("index.ts"), "console.log('hi');").unwrap();
        std::fs::write(dir.join("src/util.ts"), "export {};").unwrap();
    }

    #[test]
    fn test_build_url_appends_segment() {
        let base = Url::parse("https://example.com/templates/?v=2").unwrap();
        let url = TemplateFetcher::build_url(&base, "demo.zip").unwrap();
        assert_eq!(url.as_str(), "https://example.com/templates/demo.zip?v=2");
    }

    #[test]
    fn test_zip_roundtrip_keeps_relative_paths() {
        let root = tempfile::tempdir().unwrap();
        write_template(root.path());

        let zip = build_local_zip(root.path(), "demo-starter").unwrap();
        let files = extract_zip(&zip, "demo-starter").unwrap();
        assert_eq!(
            files.keys().cloned().collect::<Vec<_>>(),
            vec!["index.ts", "src/util.ts"]
        );
    }

    #[test]
    fn test_zip_entries_cannot_escape() {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            zip.start_file("demo-starter/../../escaped.txt", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"gotcha").unwrap();
            zip.finish().unwrap();
        }

        let err = extract_zip(&buffer, "demo-starter").unwrap_err();
        assert!(err.to_string().contains("unsafe path"));
    }

    #[tokio::test]
    async fn test_fetch_local_files() {
        let root = tempfile::tempdir().unwrap();
        write_template(root.path());

        let mut fetcher =
            TemplateFetcher::new(TemplateSource::Local(root.path().to_path_buf()), "steel-test");
        let files = fetcher.fetch_files("demo-starter").await.unwrap();
        assert_eq!(files.get("index.ts").unwrap(), b"console.log('hi');");
        assert!(fetcher.fetch_files("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_bundled_is_the_default_source() {
        let source = TemplateSource::resolve(None).unwrap();
        if std::env::var(TEMPLATE_URL_ENV).is_err() {
            assert!(matches!(source, TemplateSource::Bundled));
        }

        let mut fetcher = TemplateFetcher::new(TemplateSource::Bundled, "steel-test");
        let files = fetcher.fetch_files("steel-puppeteer-starter").await.unwrap();
        assert!(files.contains_key("package.json"));
        assert!(files.contains_key(".env.example"));
    }
}
