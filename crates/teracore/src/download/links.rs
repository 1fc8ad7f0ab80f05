//! Share-link extraction from free-form message text.
//!
//! A link is `http(s)://[www.]<host>/s/<id>` where `<host>` is one of the
//! configured share hosts and `<id>` is made of ASCII letters, digits, `-`
//! and `_`. Anything after the id (query, trailing punctuation) is not part
//! of the match.

use regex::Regex;

use crate::core::config;

/// Compiled matcher for share links on a fixed set of hosts.
#[derive(Debug, Clone)]
pub struct LinkMatcher {
    pattern: Regex,
}

impl LinkMatcher {
    /// Builds a matcher for the given hosts (`www.` prefixes are optional in input).
    pub fn new<S: AsRef<str>>(hosts: &[S]) -> Result<Self, regex::Error> {
        let alternatives = hosts
            .iter()
            .map(|host| regex::escape(host.as_ref().trim().trim_start_matches("www.")))
            .filter(|host| !host.is_empty())
            .collect::<Vec<_>>();

        if alternatives.is_empty() {
            return Err(regex::Error::Syntax("at least one link host is required".to_string()));
        }

        let pattern = Regex::new(&format!(
            r"https?://(?:www\.)?(?i:{})/s/[A-Za-z0-9_-]+",
            alternatives.join("|")
        ))?;
        Ok(Self { pattern })
    }

    /// Matcher for the hosts in `LINK_HOSTS`.
    pub fn from_config() -> Result<Self, regex::Error> {
        Self::new(config::LINK_HOSTS.as_slice())
    }

    /// Returns every link in `text`, in the order they appear.
    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.pattern.find_iter(text).map(|m| m.as_str().to_string()).collect()
    }
}

/// Extracts all share links from `text` in textual order.
pub fn extract_links(matcher: &LinkMatcher, text: &str) -> Vec<String> {
    matcher.find_all(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn matcher() -> LinkMatcher {
        LinkMatcher::new(&["example.com", "terabox.com"]).unwrap()
    }

    #[test]
    fn test_extracts_links_in_order() {
        let links = extract_links(
            &matcher(),
            "check this out https://example.com/s/Ab12_3 and https://example.com/s/Zz99",
        );
        assert_eq!(links, vec!["https://example.com/s/Ab12_3", "https://example.com/s/Zz99"]);
    }

    #[test]
    fn test_accepts_www_and_http() {
        let links = extract_links(&matcher(), "http://www.terabox.com/s/1a-B_c");
        assert_eq!(links, vec!["http://www.terabox.com/s/1a-B_c"]);
    }

    #[test]
    fn test_stops_at_non_id_characters() {
        let links = extract_links(&matcher(), "(https://terabox.com/s/abc?x=1), https://terabox.com/s/def.");
        assert_eq!(links, vec!["https://terabox.com/s/abc", "https://terabox.com/s/def"]);
    }

    #[test]
    fn test_rejects_other_hosts_and_paths() {
        let m = matcher();
        assert!(extract_links(&m, "https://evil.com/s/abc").is_empty());
        assert!(extract_links(&m, "https://terabox.com/x/abc").is_empty());
        assert!(extract_links(&m, "https://terabox.com/s/").is_empty());
        assert!(extract_links(&m, "ftp://terabox.com/s/abc").is_empty());
        assert!(m.find_all("no links here").is_empty());
    }

    #[test]
    fn test_host_is_case_insensitive() {
        let links = extract_links(&matcher(), "https://TeraBox.com/s/abc");
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_requires_a_host() {
        let hosts: [&str; 0] = [];
        assert!(LinkMatcher::new(&hosts).is_err());
    }
}
