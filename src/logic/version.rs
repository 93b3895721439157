//! Signature Database Versions
//!
//! The daemon reports raw version strings that may carry a trailing
//! age annotation ("25 days old (out of date)"). Only the leading
//! version survives normalization; anything unusable becomes the
//! unknown placeholder.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::UNKNOWN_VERSION;

use super::daemon::types::VersionInfo;

static AGE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*days\s*old.*").expect("age suffix pattern"));

/// Legacy placeholder some daemon builds emit for an unknown version
const LEGACY_UNKNOWN: &str = "未知";

/// Normalized signature database versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureVersions {
    pub daily: String,
    pub main: String,
    pub bytecode: String,
}

impl Default for SignatureVersions {
    fn default() -> Self {
        Self {
            daily: UNKNOWN_VERSION.to_string(),
            main: UNKNOWN_VERSION.to_string(),
            bytecode: UNKNOWN_VERSION.to_string(),
        }
    }
}

impl SignatureVersions {
    pub fn from_wire(info: &VersionInfo) -> Self {
        Self {
            daily: normalize(info.daily.as_deref()),
            main: normalize(info.main.as_deref()),
            bytecode: normalize(info.bytecode.as_deref()),
        }
    }

    pub fn is_known(&self) -> bool {
        self.daily != UNKNOWN_VERSION
            || self.main != UNKNOWN_VERSION
            || self.bytecode != UNKNOWN_VERSION
    }

    /// Headline label for the version badge ("Daily 25")
    pub fn daily_label(&self) -> String {
        if self.daily == UNKNOWN_VERSION {
            UNKNOWN_VERSION.to_string()
        } else {
            format!("Daily {}", self.daily)
        }
    }

    /// Secondary label ("Main 27108", or a dash when unknown)
    pub fn main_label(&self) -> String {
        if self.main == UNKNOWN_VERSION {
            "-".to_string()
        } else {
            format!("Main {}", self.main)
        }
    }
}

fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN_VERSION.to_string();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed == LEGACY_UNKNOWN
        || trimmed.eq_ignore_ascii_case(UNKNOWN_VERSION)
    {
        return UNKNOWN_VERSION.to_string();
    }
    let stripped = AGE_SUFFIX.replace(trimmed, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        UNKNOWN_VERSION.to_string()
    } else {
        stripped.to_string()
    }
}
