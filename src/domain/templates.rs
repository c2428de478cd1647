use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Domain used when no template set is configured.
pub const DEFAULT_DOMAIN: &str = "cloudfront";
/// Format used when no template set is configured.
pub const DEFAULT_FORMAT: &str = "webp";
const DEFAULT_BASE_URL: &str = "https://d270zblqqzt1pj.cloudfront.net/media/dealerships/16/vehicles/410/d60c3553bac14b94912ae35602154e12.webp?width=";

/// Base URLs keyed by domain, then by format. A request URL is the base
/// followed by the decimal width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateSet {
    domains: BTreeMap<String, BTreeMap<String, String>>,
}

impl TemplateSet {
    #[must_use]
    pub const fn new(domains: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { domains }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    /// Adds or replaces the base URL for `domain`/`format`.
    pub fn insert(&mut self, domain: &str, format: &str, base: &str) {
        self.domains
            .entry(domain.to_owned())
            .or_default()
            .insert(format.to_owned(), base.to_owned());
    }

    /// Overlays every entry of `other` on top of this set.
    pub fn merge(&mut self, other: &TemplateSet) {
        for (domain, format, base) in other.entries() {
            self.insert(domain, format, base);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.values().all(BTreeMap::is_empty)
    }

    /// Number of (domain, format) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.values().map(BTreeMap::len).sum()
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    /// Every (domain, format, base) entry in domain then format order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.domains.iter().flat_map(|(domain, formats)| {
            formats
                .iter()
                .map(move |(format, base)| (domain.as_str(), format.as_str(), base.as_str()))
        })
    }

    /// Looks up the base URL for a domain/format pair.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDomain`] or [`ConfigError::UnknownFormat`]
    /// when the pair is not configured.
    pub fn base_url(&self, domain: &str, format: &str) -> Result<&str, ConfigError> {
        let formats = self
            .domains
            .get(domain)
            .ok_or_else(|| self.unknown_domain(domain))?;
        formats
            .get(format)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownFormat {
                domain: domain.to_owned(),
                format: format.to_owned(),
                known: join_known(formats.keys().map(String::as_str)),
            })
    }

    /// Narrows the set to the selected domain and/or format.
    ///
    /// # Errors
    ///
    /// Returns an error when a selector names something the set does not
    /// contain.
    pub fn select(&self, domain: Option<&str>, format: Option<&str>) -> Result<Self, ConfigError> {
        let mut selected = TemplateSet::empty();
        match (domain, format) {
            (Some(domain), Some(format)) => {
                let base = self.base_url(domain, format)?;
                selected.insert(domain, format, base);
            }
            (Some(domain), None) => {
                let formats = self
                    .domains
                    .get(domain)
                    .ok_or_else(|| self.unknown_domain(domain))?;
                for (format, base) in formats {
                    selected.insert(domain, format, base);
                }
            }
            (None, Some(format)) => {
                for (domain, entry_format, base) in self.entries() {
                    if entry_format == format {
                        selected.insert(domain, entry_format, base);
                    }
                }
                if selected.is_empty() {
                    return Err(ConfigError::FormatNotServed {
                        format: format.to_owned(),
                    });
                }
            }
            (None, None) => selected = self.clone(),
        }
        Ok(selected)
    }

    /// Checks that the set is non-empty and every base forms an absolute
    /// http(s) URL once a width is appended.
    ///
    /// # Errors
    ///
    /// Returns the first invalid template found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::NoTemplates);
        }
        for (domain, format, base) in self.entries() {
            let probe = format!("{}1", base);
            let parsed = Url::parse(&probe).map_err(|err| ConfigError::InvalidTemplate {
                domain: domain.to_owned(),
                format: format.to_owned(),
                base: base.to_owned(),
                source: err,
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedScheme {
                    domain: domain.to_owned(),
                    format: format.to_owned(),
                    scheme: parsed.scheme().to_owned(),
                });
            }
        }
        Ok(())
    }

    fn unknown_domain(&self, domain: &str) -> ConfigError {
        ConfigError::UnknownDomain {
            domain: domain.to_owned(),
            known: join_known(self.domains()),
        }
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        let mut set = TemplateSet::empty();
        set.insert(DEFAULT_DOMAIN, DEFAULT_FORMAT, DEFAULT_BASE_URL);
        set
    }
}

fn join_known<'item>(items: impl Iterator<Item = &'item str>) -> String {
    let known: Vec<&str> = items.collect();
    if known.is_empty() {
        "none".to_owned()
    } else {
        known.join(", ")
    }
}
