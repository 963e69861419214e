//! Site identity and permalink rules used by exports.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMetadata {
    pub name: String,
    pub description: String,
    url: Url,
}

impl SiteMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url,
        }
    }

    /// Site url with exactly one trailing slash.
    pub fn base_url(&self) -> String {
        normalize_public_site_url(self.url.as_str())
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("localhost")
    }

    pub fn post_permalink(&self, url: &str) -> String {
        format!("{}post/{url}/", self.base_url())
    }

    pub fn page_permalink(&self, url: &str) -> String {
        format!("{}{url}/", self.base_url())
    }
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}
