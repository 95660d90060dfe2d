//! Byte-count scaling
//!
//! A single base-1024 divisor table shared by every size report in the crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unit for reporting sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeUnit {
    #[default]
    #[serde(rename = "B")]
    Bytes,
    KB,
    MB,
    GB,
    TB,
}

impl SizeUnit {
    pub const ALL: [SizeUnit; 5] = [
        SizeUnit::Bytes,
        SizeUnit::KB,
        SizeUnit::MB,
        SizeUnit::GB,
        SizeUnit::TB,
    ];

    /// Power of 1024 for this unit
    pub const fn exponent(self) -> u32 {
        match self {
            SizeUnit::Bytes => 0,
            SizeUnit::KB => 1,
            SizeUnit::MB => 2,
            SizeUnit::GB => 3,
            SizeUnit::TB => 4,
        }
    }

    /// Number of bytes in one of this unit
    pub const fn divisor(self) -> u64 {
        1024u64.pow(self.exponent())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SizeUnit::Bytes => "B",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
            SizeUnit::TB => "TB",
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "B" | "bytes" => Ok(SizeUnit::Bytes),
            "KB" | "kB" => Ok(SizeUnit::KB),
            "MB" => Ok(SizeUnit::MB),
            "GB" => Ok(SizeUnit::GB),
            "TB" => Ok(SizeUnit::TB),
            other => Err(Error::InvalidUnit(other.to_string())),
        }
    }
}

/// Convert a byte count to `unit`
pub fn scale_bytes(count: u64, unit: SizeUnit) -> f64 {
    count as f64 / unit.divisor() as f64
}

/// Human-readable size, e.g. "2 KiB"
pub fn format_size(count: u64) -> String {
    humansize::format_size(count, humansize::BINARY)
}
