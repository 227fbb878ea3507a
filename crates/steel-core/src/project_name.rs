//! Project name normalization

/// Name used by flows that fall back when neither input nor argument is given
pub const FALLBACK_PROJECT_NAME: &str = "steel-starter";

/// Turn arbitrary user input into a filesystem-safe project name.
///
/// The result only contains `[a-z0-9-]`, never starts or ends with `-`
/// and never contains `--`. Input without any usable character yields an
/// empty string.
pub fn to_valid_project_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for c in raw.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !name.is_empty() {
                name.push('-');
            }
            pending_dash = false;
            name.push(c);
        } else {
            pending_dash = true;
        }
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_normalized(name: &str) {
        assert!(
            name.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
            "unexpected character in {name:?}"
        );
        assert!(!name.starts_with('-') && !name.ends_with('-'), "{name:?}");
        assert!(!name.contains("--"), "{name:?}");
    }

    #[test]
    fn test_spaces_and_case() {
        assert_eq!(to_valid_project_name("My Steel App"), "my-steel-app");
        assert_eq!(to_valid_project_name("  Trimmed  "), "trimmed");
    }

    #[test]
    fn test_punctuation_collapses() {
        let name = to_valid_project_name("__hello!!  world??__");
        assert_eq!(name, "hello-world");
        assert_normalized(&name);
    }

    #[test]
    fn test_mixed_inputs_are_normalized() {
        for raw in [
            "Steel Playwright Starter",
            ".hidden/dir",
            "a -- b",
            "Ünïcode Näme 2",
            "@scope/pkg",
            "---",
            "x.y_z~w",
        ] {
            assert_normalized(&to_valid_project_name(raw));
        }
    }

    #[test]
    fn test_nothing_usable_is_empty() {
        assert_eq!(to_valid_project_name("   "), "");
        assert_eq!(to_valid_project_name("!!!"), "");
    }
}
