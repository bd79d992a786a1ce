use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::NULL_TOKEN;

/// A numeric catalog token, kept verbatim so unchanged records serialize byte-for-byte.
///
/// `NULL` is the unknown sentinel. A token that is neither `NULL` nor a finite number is
/// malformed: it is preserved on write but reads as unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Numeric {
    raw: String,
}

impl Numeric {
    pub fn null() -> Self {
        Self {
            raw: NULL_TOKEN.to_string(),
        }
    }

    /// Wrap a token read from a file or typed by a user. Blank input is `NULL`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::null()
        } else {
            Self {
                raw: trimmed.to_string(),
            }
        }
    }

    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self {
                raw: value.to_string(),
            }
        } else {
            Self::null()
        }
    }

    pub fn rounded(value: f64, decimals: u32) -> Self {
        Self::from_f64(round_to(value, decimals))
    }

    pub fn from_int(value: i64) -> Self {
        Self {
            raw: value.to_string(),
        }
    }

    /// Uncertainties must be finite and non-negative; anything else is unknown.
    pub fn uncertainty(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() && v >= 0.0 => Self::from_f64(v),
            _ => Self::null(),
        }
    }

    pub fn value(&self) -> Option<f64> {
        if self.is_null() {
            return None;
        }
        self.raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn is_null(&self) -> bool {
        self.raw == NULL_TOKEN
    }

    pub fn is_malformed(&self) -> bool {
        !self.is_null() && self.value().is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Default for Numeric {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A value with its uncertainty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Numeric,
    pub error: Numeric,
}

impl Measurement {
    pub fn new(value: Numeric, error: Numeric) -> Self {
        Self { value, error }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    /// Computed result rounded to `decimals`; the error goes through [`Numeric::uncertainty`].
    pub fn resolved(value: f64, error: f64, decimals: u32) -> Self {
        Self {
            value: Numeric::rounded(value, decimals),
            error: Numeric::uncertainty(Some(round_to(error, decimals))),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.value.value().is_none()
    }

    /// Both parts as numbers, if both are known.
    pub fn pair(&self) -> Option<(f64, f64)> {
        Some((self.value.value()?, self.error.value()?))
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
