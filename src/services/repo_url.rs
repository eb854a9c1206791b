use std::sync::OnceLock;

use regex::Regex;

fn repo_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https://([^/\s]+)/[^/\s]+/[^/\s]+/?$").expect("repository URL pattern is valid")
    })
}

/// Returns true iff `url` looks like `https://<host>/<owner>/<repo>` with an
/// optional trailing slash.
pub fn is_valid_repo_url(url: &str) -> bool {
    repo_url_regex().is_match(url)
}

/// Same as [`is_valid_repo_url`], additionally pinning the host.
pub fn is_valid_repo_url_for_host(url: &str, host: &str) -> bool {
    repo_url_regex()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map_or(false, |m| m.as_str().eq_ignore_ascii_case(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_owner_and_repo() {
        assert!(is_valid_repo_url("https://github.com/rust-lang/rust"));
        assert!(is_valid_repo_url("https://gitlab.example.org/team/project"));
    }

    #[test]
    fn accepts_trailing_slash() {
        assert!(is_valid_repo_url("https://github.com/rust-lang/rust/"));
    }

    #[test]
    fn rejects_everything_else() {
        for url in [
            "",
            "https://github.com",
            "https://github.com/",
            "https://github.com/rust-lang",
            "https://github.com/rust-lang/",
            "https://github.com/rust-lang/rust/tree/master",
            "https://github.com/rust-lang/rust//",
            "https://github.com//rust",
            "http://github.com/rust-lang/rust",
            "github.com/rust-lang/rust",
            " https://github.com/rust-lang/rust",
            "https://github.com/rust lang/rust",
        ] {
            assert!(!is_valid_repo_url(url), "{url:?} should be rejected");
        }
    }

    #[test]
    fn host_pinning() {
        assert!(is_valid_repo_url_for_host("https://github.com/a/b", "github.com"));
        assert!(is_valid_repo_url_for_host("https://GitHub.com/a/b/", "github.com"));
        assert!(!is_valid_repo_url_for_host("https://gitlab.com/a/b", "github.com"));
        assert!(!is_valid_repo_url_for_host("https://github.com/a/b/c", "github.com"));
    }
}
