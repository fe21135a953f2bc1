//! Regex-catalog user-agent classification.
//!
//! `uasift` turns a free-text `User-Agent` header into three independent
//! classifications (browser family, operating system, device) by matching it
//! against ordered catalogs of regular expressions loaded from a ua-parser
//! style YAML document.
//!
//! ```
//! use uasift::{Engine, LookupMode, Options};
//!
//! let config = r#"
//! user_agent_parsers:
//!   - regex: '(Chrome)/(\d+)\.(\d+)'
//! os_parsers:
//!   - regex: '(Android) (\d+)'
//! device_parsers:
//!   - regex: '; (Pixel \d+)'
//!     brand_replacement: 'Google'
//! "#;
//!
//! let engine = Engine::new(config).unwrap();
//! let client = engine.parse("Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/124.0 Mobile");
//!
//! let ua = client.user_agent.unwrap();
//! assert_eq!(ua.family, "Chrome");
//! assert_eq!(ua.major.as_deref(), Some("124"));
//! assert_eq!(client.os.unwrap().family, "Android");
//! assert_eq!(client.device.unwrap().brand.as_deref(), Some("Google"));
//!
//! let os_only = Engine::with_options(config, Options::default().with_mode(LookupMode::OS)).unwrap();
//! assert!(os_only.parse("Android 14").user_agent.is_none());
//! ```
//!
//! Each catalog keeps per-pattern hit counters and re-sorts itself by
//! popularity once enough lookups resolved deep in the list (or not at all),
//! see [`Options::miss_threshold`].

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;

use serde::Serialize;
use std::fmt;

pub use api::{Engine, LookupTrace, Options, ParseDetails, ParseResultVerbose};
pub use engine::{CatalogStats, PatternSummary};
pub use error::{ConfigError, Result};

/// Family reported when no pattern of a catalog matched.
pub const OTHER: &str = "Other";

/// Smallest miss threshold an engine accepts; lower values are raised to it.
pub const MIN_MISS_THRESHOLD: u64 = 100_000;

/// Miss threshold used by [`Engine::new`].
pub const DEFAULT_MISS_THRESHOLD: u64 = 500_000;

/// Deepest catalog position (zero-based) a match may sit at without counting
/// as a miss.
pub const DEFAULT_ACCEPTABLE_INDEX: usize = 20;

bitflags::bitflags! {
    /// Selects which catalogs [`Engine::parse`] consults.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LookupMode: u8 {
        const OS         = 1 << 0;
        const USER_AGENT = 1 << 1;
        const DEVICE     = 1 << 2;
    }
}

/// One of the three classification domains, each backed by its own catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    UserAgent,
    Os,
    Device,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::UserAgent, Category::Os, Category::Device];

    /// Name of the configuration section holding this category's rules.
    pub fn section(self) -> &'static str {
        match self {
            Category::UserAgent => "user_agent_parsers",
            Category::Os => "os_parsers",
            Category::Device => "device_parsers",
        }
    }

    /// The mode flag that enables this category.
    pub fn mode(self) -> LookupMode {
        match self {
            Category::UserAgent => LookupMode::USER_AGENT,
            Category::Os => LookupMode::OS,
            Category::Device => LookupMode::DEVICE,
        }
    }

    /// Only device rules may carry a `regex_flag`.
    pub(crate) fn honors_regex_flag(self) -> bool {
        matches!(self, Category::Device)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

// --- Result records ----------------------------------------------------------

/// Browser (or other client software) classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAgent {
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// Operating system classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Os {
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_minor: Option<String>,
}

/// Device classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        UserAgent { family: OTHER.to_string(), major: None, minor: None, patch: None }
    }
}

impl Default for Os {
    fn default() -> Self {
        Os { family: OTHER.to_string(), major: None, minor: None, patch: None, patch_minor: None }
    }
}

impl Default for Device {
    fn default() -> Self {
        Device { family: OTHER.to_string(), brand: None, model: None }
    }
}

/// Writes `family` followed by the leading run of present version parts,
/// e.g. `Firefox 125.0`.
fn write_versioned(f: &mut fmt::Formatter<'_>, family: &str, parts: &[&Option<String>]) -> fmt::Result {
    f.write_str(family)?;
    let mut sep = " ";
    for part in parts {
        let Some(part) = part else { break };
        write!(f, "{sep}{part}")?;
        sep = ".";
    }
    Ok(())
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_versioned(f, &self.family, &[&self.major, &self.minor, &self.patch])
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_versioned(f, &self.family, &[&self.major, &self.minor, &self.patch, &self.patch_minor])
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.family)
    }
}

/// Classification of a single input line.
///
/// Only categories enabled by the engine's [`LookupMode`] are populated; the
/// others stay `None` rather than defaulting to [`OTHER`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Client {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<UserAgent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<Os>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_stops_at_first_missing_part() {
        let ua = UserAgent {
            family: "Firefox".into(),
            major: Some("125".into()),
            minor: None,
            patch: Some("3".into()),
        };
        assert_eq!(ua.to_string(), "Firefox 125");

        let os = Os {
            family: "Mac OS X".into(),
            major: Some("10".into()),
            minor: Some("15".into()),
            patch: Some("7".into()),
            patch_minor: None,
        };
        assert_eq!(os.to_string(), "Mac OS X 10.15.7");
        assert_eq!(Device::default().to_string(), "Other");
    }

    #[test]
    fn category_sections_and_modes() {
        assert_eq!(Category::Device.to_string(), "device_parsers");
        assert_eq!(Category::UserAgent.mode(), LookupMode::USER_AGENT);
        assert_eq!(LookupMode::all().bits(), 0b111);
        assert!(Category::ALL.iter().filter(|c| c.honors_regex_flag()).eq([&Category::Device]));
    }

    #[test]
    fn client_serializes_only_requested_categories() {
        let client = Client { os: Some(Os::default()), ..Client::default() };
        let json = serde_json::to_string(&client).unwrap();
        assert_eq!(json, r#"{"os":{"family":"Other"}}"#);
    }
}
