use std::time::Duration;

use super::types::{PositiveUsize, TemplateArg};
use crate::config::parse_duration_value;
use crate::domain::WidthRange;
use crate::error::{AppError, AppResult, ValidationError};

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(super) fn parse_width_range(s: &str) -> AppResult<WidthRange> {
    s.parse::<WidthRange>().map_err(AppError::from)
}

pub(super) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s).map_err(AppError::from)
}

pub(crate) fn parse_template(s: &str) -> Result<TemplateArg, ValidationError> {
    let invalid = || ValidationError::InvalidTemplateArg {
        value: s.to_owned(),
    };
    let (key, base) = s.split_once('=').ok_or_else(invalid)?;
    let (domain, format) = key.split_once(':').ok_or_else(invalid)?;
    let domain = domain.trim();
    let format = format.trim();
    let base = base.trim();
    if domain.is_empty() || format.is_empty() || base.is_empty() {
        return Err(invalid());
    }
    Ok(TemplateArg {
        domain: domain.to_owned(),
        format: format.to_owned(),
        base: base.to_owned(),
    })
}
