use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{BenchArgs, PositiveUsize};
use crate::domain::{TemplateSet, WidthRange};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Values given explicitly on
/// the command line win over the file.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    args: &mut BenchArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "domain")
        && let Some(domain) = config.domain.clone()
    {
        args.domain = Some(domain);
    }

    if !is_cli(matches, "format")
        && let Some(format) = config.format.clone()
    {
        args.format = Some(format);
    }

    if !is_cli(matches, "widths")
        && let Some(widths) = config.widths.as_deref()
    {
        args.widths = widths
            .parse::<WidthRange>()
            .map_err(|err| AppError::config(ConfigError::InvalidWidths { source: err }))?;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = ensure_positive_usize(concurrency, "concurrency")?;
    }

    if !is_cli(matches, "group_by")
        && let Some(group_by) = config.group_by
    {
        args.group_by = group_by;
    }

    if !is_cli(matches, "status_policy")
        && let Some(policy) = config.status_policy
    {
        args.status_policy = policy;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = timeout.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidDuration {
                field: "timeout",
                source: err,
            })
        })?;
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = timeout.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidDuration {
                field: "connect_timeout",
                source: err,
            })
        })?;
    }

    if !is_cli(matches, "redirect_limit")
        && let Some(redirect) = config.redirect
    {
        args.redirect_limit = redirect;
    }

    if !is_cli(matches, "disable_keepalive")
        && let Some(value) = config.disable_keepalive
    {
        args.disable_keepalive = value;
    }

    if !is_cli(matches, "no_samples")
        && let Some(samples) = config.samples
    {
        args.no_samples = !samples;
    }

    if !is_cli(matches, "output")
        && let Some(output) = config.output.clone()
    {
        args.output = Some(output);
    }

    if !is_cli(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = Some(format);
    }

    if !is_cli(matches, "strict")
        && let Some(strict) = config.strict
    {
        args.strict = strict;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    if let Some(templates) = config.templates.as_ref() {
        args.template_set = templates.clone();
    }

    Ok(())
}

/// Builds the final template set: the config file's set (or the built-in
/// default when neither the file nor the CLI names any), overlaid with
/// `--template` entries.
pub fn resolve_templates(args: &mut BenchArgs, config: Option<&ConfigFile>) {
    let from_file = config.is_some_and(|config| config.templates.is_some());
    if !from_file && !args.templates.is_empty() {
        args.template_set = TemplateSet::empty();
    }
    for template in &args.templates {
        args.template_set
            .insert(&template.domain, &template.format, &template.base);
    }
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}
