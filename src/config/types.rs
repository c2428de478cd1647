use std::time::Duration;

use serde::Deserialize;

use crate::args::{GroupBy, OutputFormat, StatusPolicy};
use crate::domain::TemplateSet;
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub domain: Option<String>,
    pub format: Option<String>,
    pub widths: Option<String>,
    #[serde(alias = "max_workers")]
    pub concurrency: Option<usize>,
    pub group_by: Option<GroupBy>,
    pub status_policy: Option<StatusPolicy>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub redirect: Option<u32>,
    pub disable_keepalive: Option<bool>,
    pub samples: Option<bool>,
    pub output: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub strict: Option<bool>,
    pub no_color: Option<bool>,
    /// Replaces the built-in template set when present.
    pub templates: Option<TemplateSet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
