use crate::domain::{RequestSpec, TemplateSet, WidthRange};
use crate::error::ConfigError;

/// Upper bound on the specs a single run may expand to.
pub const MAX_REQUESTS: u64 = 1_000_000;

/// Concrete request URL for one width: the configured base with the width
/// appended.
///
/// # Errors
///
/// Returns `ConfigError::UnknownDomain` or `ConfigError::UnknownFormat` when
/// the template set has no base for the selector pair.
pub fn build_url(
    templates: &TemplateSet,
    domain: &str,
    format: &str,
    width: u32,
) -> Result<String, ConfigError> {
    let base = templates.base_url(domain, format)?;
    let mut url = String::with_capacity(base.len().saturating_add(10));
    url.push_str(base);
    url.push_str(&width.to_string());
    Ok(url)
}

/// Number of requests `templates` x `widths` expands to.
///
/// # Errors
///
/// Returns [`ConfigError::TooManyRequests`] above [`MAX_REQUESTS`].
pub fn planned_requests(templates: &TemplateSet, widths: WidthRange) -> Result<u64, ConfigError> {
    let requested = u64::try_from(templates.len())
        .unwrap_or(u64::MAX)
        .saturating_mul(widths.len());
    if requested > MAX_REQUESTS {
        return Err(ConfigError::TooManyRequests {
            requested,
            max: MAX_REQUESTS,
        });
    }
    Ok(requested)
}

/// Every (domain, format, width) combination in the template set, nested in
/// that order.
#[must_use]
pub fn expand_specs(templates: &TemplateSet, widths: WidthRange) -> Vec<RequestSpec> {
    let capacity = usize::try_from(
        widths
            .len()
            .saturating_mul(u64::try_from(templates.len()).unwrap_or(u64::MAX))
            .min(MAX_REQUESTS),
    )
    .unwrap_or(0);
    let mut specs = Vec::with_capacity(capacity);
    for (domain, format, _) in templates.entries() {
        for width in widths.iter() {
            specs.push(RequestSpec::new(domain, format, width));
        }
    }
    specs
}
