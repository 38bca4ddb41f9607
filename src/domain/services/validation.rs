pub struct PackageValidator;

impl PackageValidator {
    /// Names end up as argv entries, so a leading `-` would be read as a flag.
    pub fn validate_package_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('-')
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+' | '@' | '/'))
    }

    /// Taps are `user/repo`, optionally with a third path segment in fully-qualified form.
    pub fn validate_tap_name(name: &str) -> bool {
        let segments: Vec<&str> = name.split('/').collect();
        (2..=3).contains(&segments.len())
            && segments.iter().all(|s| Self::validate_package_name(s) && !s.contains('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_versioned_and_qualified_names() {
        assert!(PackageValidator::validate_package_name("python@3.12"));
        assert!(PackageValidator::validate_package_name("homebrew/cask/firefox"));
        assert!(PackageValidator::validate_package_name("libc++"));
    }

    #[test]
    fn rejects_flag_like_and_spaced_names() {
        assert!(!PackageValidator::validate_package_name("--force"));
        assert!(!PackageValidator::validate_package_name("two words"));
        assert!(!PackageValidator::validate_package_name(""));
    }

    #[test]
    fn tap_needs_user_and_repo() {
        assert!(PackageValidator::validate_tap_name("foo/bar"));
        assert!(!PackageValidator::validate_tap_name("foobar"));
        assert!(!PackageValidator::validate_tap_name("foo/"));
    }
}
