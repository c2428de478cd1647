use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Expected a width range 'start-end' (e.g., 801-999) or a single width.")]
    WidthRangeFormat,
    #[error("Invalid width '{value}': {source}")]
    InvalidWidth {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Width must be > 0.")]
    WidthZero,
    #[error("Width range start must be <= end.")]
    WidthRangeStartAfterEnd,
    #[error("Invalid template '{value}'. Expected 'domain:format=base_url'.")]
    InvalidTemplateArg { value: String },
    #[error("`--output-format` requires `--output`.")]
    OutputFormatRequiresOutput,
    #[error("{failed} of {attempted} requests failed.")]
    RuntimeErrors { failed: u64, attempted: u64 },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
