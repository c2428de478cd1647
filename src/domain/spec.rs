use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One request to perform: a (domain, format, width) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestSpec {
    pub domain: String,
    pub format: String,
    pub width: u32,
}

impl RequestSpec {
    #[must_use]
    pub fn new(domain: &str, format: &str, width: u32) -> Self {
        Self {
            domain: domain.to_owned(),
            format: format.to_owned(),
            width,
        }
    }
}

impl fmt::Display for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.domain, self.format, self.width)
    }
}

/// Inclusive range of image widths, both ends > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WidthRange {
    start: u32,
    end: u32,
}

impl WidthRange {
    /// Builds a range from explicit bounds.
    ///
    /// # Errors
    ///
    /// Returns an error when either bound is zero or `start > end`.
    pub const fn new(start: u32, end: u32) -> Result<Self, ValidationError> {
        if start == 0 || end == 0 {
            return Err(ValidationError::WidthZero);
        }
        if start > end {
            return Err(ValidationError::WidthRangeStartAfterEnd);
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    #[must_use]
    pub const fn len(self) -> u64 {
        // start <= end is guaranteed by construction.
        (self.end as u64).saturating_sub(self.start as u64).saturating_add(1)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    #[must_use]
    pub const fn iter(self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl Default for WidthRange {
    fn default() -> Self {
        Self {
            start: 801,
            end: 999,
        }
    }
}

impl fmt::Display for WidthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl std::str::FromStr for WidthRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(ValidationError::WidthRangeFormat);
        }
        let (start_str, end_str) = value.split_once('-').unwrap_or((value, value));
        let start = parse_width(start_str)?;
        let end = parse_width(end_str)?;
        WidthRange::new(start, end)
    }
}

impl TryFrom<String> for WidthRange {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WidthRange> for String {
    fn from(value: WidthRange) -> Self {
        value.to_string()
    }
}

fn parse_width(value: &str) -> Result<u32, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::WidthRangeFormat);
    }
    trimmed
        .parse::<u32>()
        .map_err(|err| ValidationError::InvalidWidth {
            value: trimmed.to_owned(),
            source: err,
        })
}
