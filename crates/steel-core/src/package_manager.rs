//! Package managers offered by the wizard

use crate::templates::catalog::Template;
use std::fmt;

/// Supported package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
    Bun,
    Pip,
    Poetry,
    Uv,
}

/// Candidates for JavaScript and TypeScript templates
pub const NODE_PACKAGE_MANAGERS: &[PackageManager] = &[
    PackageManager::Npm,
    PackageManager::Yarn,
    PackageManager::Pnpm,
    PackageManager::Bun,
];

/// Candidates for Python templates
pub const PYTHON_PACKAGE_MANAGERS: &[PackageManager] = &[
    PackageManager::Pip,
    PackageManager::Poetry,
    PackageManager::Uv,
];

impl PackageManager {
    pub fn id(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
            PackageManager::Pip => "pip",
            PackageManager::Poetry => "poetry",
            PackageManager::Uv => "uv",
        }
    }

    /// Shell commands that install a freshly scaffolded project's dependencies
    pub fn install_commands(&self) -> Vec<String> {
        match self {
            PackageManager::Npm
            | PackageManager::Yarn
            | PackageManager::Pnpm
            | PackageManager::Bun => vec![format!("{} install", self.id())],
            PackageManager::Pip => vec![
                "python3 -m venv .venv".to_string(),
                ".venv/bin/pip install -r requirements.txt".to_string(),
            ],
            PackageManager::Poetry => vec!["poetry install".to_string()],
            PackageManager::Uv => vec![
                "uv venv".to_string(),
                "uv pip install -r requirements.txt".to_string(),
            ],
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Package managers to offer for a template.
///
/// Python templates are recognised by a case-sensitive `Python` in their label.
pub fn candidates_for(template: Option<&Template>) -> &'static [PackageManager] {
    match template {
        Some(t) if t.label.contains("Python") => PYTHON_PACKAGE_MANAGERS,
        _ => NODE_PACKAGE_MANAGERS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::catalog::find_template;

    #[test]
    fn test_python_label_narrows_candidates() {
        let template = find_template("playwright-py").unwrap();
        assert!(template.label.contains("Python"));
        assert_eq!(
            candidates_for(Some(template)),
            &[PackageManager::Pip, PackageManager::Poetry, PackageManager::Uv]
        );
    }

    #[test]
    fn test_other_templates_get_node_candidates() {
        let template = find_template("playwright").unwrap();
        assert_eq!(candidates_for(Some(template)), NODE_PACKAGE_MANAGERS);
        assert_eq!(candidates_for(None), NODE_PACKAGE_MANAGERS);
    }

    #[test]
    fn test_label_match_is_case_sensitive() {
        let mut template = find_template("playwright").unwrap().clone();
        template.label = "Playwright + python".to_string();
        assert_eq!(candidates_for(Some(&template)), NODE_PACKAGE_MANAGERS);
    }

    #[test]
    fn test_install_commands() {
        assert_eq!(PackageManager::Bun.install_commands(), vec!["bun install"]);
        assert_eq!(PackageManager::Uv.install_commands().len(), 2);
    }
}
