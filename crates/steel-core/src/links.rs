//! Fixed pages opened in the browser by `steel docs`, `star` and `support`

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Docs,
    Star,
    Support,
}

impl Link {
    pub fn url(&self) -> &'static str {
        match self {
            Link::Docs => "https://docs.steel.dev/overview/intro-to-steel",
            Link::Star => "https://github.com/steel-dev/steel-browser",
            Link::Support => "https://discord.com/invite/steel-dev",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Link::Docs => "Steel documentation",
            Link::Star => "Steel Browser on GitHub",
            Link::Support => "Steel Discord",
        }
    }

    /// Open the page with the system's default handler
    pub fn open(&self) -> Result<()> {
        log::debug!("opening {}", self.url());
        open::that(self.url()).with_context(|| format!("Failed to open {}", self.url()))
    }
}
