use clap::Parser;
use std::time::Duration;

use crate::domain::{TemplateSet, WidthRange};

use super::parsers::{
    parse_duration_arg, parse_positive_usize, parse_template, parse_width_range,
};
use super::types::{GroupBy, OutputFormat, PositiveUsize, StatusPolicy, TemplateArg};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent HTTP latency and throughput benchmark for image CDN URLs across domains, formats, and widths."
)]
pub struct BenchArgs {
    /// Only benchmark this domain (default: every configured domain)
    #[arg(long, short = 'd')]
    pub domain: Option<String>,

    /// Only benchmark this format (default: every configured format)
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Widths to request, as 'start-end' (inclusive) or a single width
    #[arg(
        long,
        short = 'w',
        default_value = "801-999",
        value_parser = parse_width_range
    )]
    pub widths: WidthRange,

    /// Maximum number of requests in flight at once
    #[arg(
        long,
        short = 'c',
        alias = "max-workers",
        default_value_t = PositiveUsize::default(),
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// URL template as 'domain:format=base_url' (repeatable; width is appended)
    #[arg(long = "template", short = 'T', value_parser = parse_template)]
    pub templates: Vec<TemplateArg>,

    /// Group summaries by this dimension
    #[arg(long = "group-by", short = 'g', value_enum, default_value = "none")]
    pub group_by: GroupBy,

    /// How to treat non-2xx responses
    #[arg(long = "status-policy", value_enum, default_value = "record")]
    pub status_policy: StatusPolicy,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        default_value = "10s",
        value_parser = parse_duration_arg
    )]
    pub request_timeout: Duration,

    /// Timeout for establishing a new connection (supports ms/s/m/h)
    #[arg(
        long = "connect-timeout",
        default_value = "5s",
        value_parser = parse_duration_arg
    )]
    pub connect_timeout: Duration,

    /// Maximum redirects to follow (0 disables redirects)
    #[arg(long = "redirect", default_value = "10")]
    pub redirect_limit: u32,

    /// Open a new connection for every request
    #[arg(long = "disable-keepalive")]
    pub disable_keepalive: bool,

    /// Do not print a row per completed request
    #[arg(long = "no-samples")]
    pub no_samples: bool,

    /// Write the report to this file
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Report file format (inferred from the --output extension when omitted)
    #[arg(long = "output-format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Exit with an error if any request failed
    #[arg(long)]
    pub strict: bool,

    /// Path to config file (TOML or JSON)
    #[arg(long)]
    pub config: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by IMGBENCH_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Resolved template set (config file, then --template entries).
    #[arg(skip)]
    pub template_set: TemplateSet,
}
