//! Compiled category patterns.
//!
//! A [`RuleSpec`] is one configuration entry: a regex source plus the
//! category-specific replacement templates. [`CompiledPattern`] pairs it with
//! the compiled `Regex` and a hit counter owned by its catalog.
//!
//! Field derivation, per category (`template | fallback group`):
//!
//! ```text
//! user agent  family ← family_replacement | $1   major ← v1 | $2
//!             minor  ← v2 | $3                   patch ← v3 | $4
//! os          family ← os_replacement | $1       major ← os_v1 | $2
//!             minor  ← os_v2 | $3                patch ← os_v3 | $4
//!             patch_minor ← os_v4 | $5
//! device      family ← device_replacement | $1   brand ← brand_replacement
//!             model  ← model_replacement | $1
//! ```
//!
//! A fallback group is only used when the regex has at least that many groups.

use super::template::derive_field;
use crate::{Category, Device, Os, UserAgent};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-category replacement templates and the record they render into.
pub(crate) trait Templates: fmt::Debug + Default + Send + Sync + 'static {
    type Record: Default + Clone + fmt::Debug + Send;

    const CATEGORY: Category;

    /// Store `value` under a normalized field name (see `loader::normalize_key`).
    /// Returns `false` for fields this category does not know.
    fn assign(&mut self, field: &str, value: String) -> bool;

    /// Build a record from a successful match, or `None` when the family comes
    /// out empty (the pattern then does not count as matching).
    fn render(&self, captures: &[&str]) -> Option<Self::Record>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UserAgentTemplates {
    pub family: Option<String>,
    pub v1: Option<String>,
    pub v2: Option<String>,
    pub v3: Option<String>,
}

impl Templates for UserAgentTemplates {
    type Record = UserAgent;

    const CATEGORY: Category = Category::UserAgent;

    fn assign(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            "familyreplacement" => &mut self.family,
            "v1replacement" => &mut self.v1,
            "v2replacement" => &mut self.v2,
            "v3replacement" => &mut self.v3,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    fn render(&self, captures: &[&str]) -> Option<UserAgent> {
        Some(UserAgent {
            family: derive_field(self.family.as_deref(), captures, Some(1))?,
            major: derive_field(self.v1.as_deref(), captures, Some(2)),
            minor: derive_field(self.v2.as_deref(), captures, Some(3)),
            patch: derive_field(self.v3.as_deref(), captures, Some(4)),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OsTemplates {
    pub os: Option<String>,
    pub v1: Option<String>,
    pub v2: Option<String>,
    pub v3: Option<String>,
    pub v4: Option<String>,
}

impl Templates for OsTemplates {
    type Record = Os;

    const CATEGORY: Category = Category::Os;

    fn assign(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            "osreplacement" => &mut self.os,
            "osv1replacement" => &mut self.v1,
            "osv2replacement" => &mut self.v2,
            "osv3replacement" => &mut self.v3,
            "osv4replacement" => &mut self.v4,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    fn render(&self, captures: &[&str]) -> Option<Os> {
        Some(Os {
            family: derive_field(self.os.as_deref(), captures, Some(1))?,
            major: derive_field(self.v1.as_deref(), captures, Some(2)),
            minor: derive_field(self.v2.as_deref(), captures, Some(3)),
            patch: derive_field(self.v3.as_deref(), captures, Some(4)),
            patch_minor: derive_field(self.v4.as_deref(), captures, Some(5)),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DeviceTemplates {
    pub device: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
}

impl Templates for DeviceTemplates {
    type Record = Device;

    const CATEGORY: Category = Category::Device;

    fn assign(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            "devicereplacement" => &mut self.device,
            "brandreplacement" => &mut self.brand,
            "modelreplacement" => &mut self.model,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    fn render(&self, captures: &[&str]) -> Option<Device> {
        Some(Device {
            family: derive_field(self.device.as_deref(), captures, Some(1))?,
            brand: derive_field(self.brand.as_deref(), captures, None),
            model: derive_field(self.model.as_deref(), captures, Some(1)),
        })
    }
}

/// One configuration entry, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RuleSpec<T> {
    pub regex: String,
    pub regex_flag: Option<String>,
    pub templates: T,
}

impl<T: Templates> RuleSpec<T> {
    /// Regex source as compiled: the `i` flag is folded in as an inline
    /// `(?i)` prefix for categories that honor it.
    pub fn effective_source(&self) -> Cow<'_, str> {
        let insensitive = T::CATEGORY.honors_regex_flag()
            && self.regex_flag.as_deref().is_some_and(|flag| flag.contains('i'));
        if insensitive { Cow::Owned(format!("(?i){}", self.regex)) } else { Cow::Borrowed(self.regex.as_str()) }
    }
}

/// A rule with its compiled regex and cumulative hit count.
#[derive(Debug)]
pub(crate) struct CompiledPattern<T> {
    spec: RuleSpec<T>,
    regex: Regex,
    matches: AtomicU64,
}

impl<T: Templates> CompiledPattern<T> {
    pub fn compile(spec: RuleSpec<T>) -> Result<Self, regex::Error> {
        let regex = Regex::new(&spec.effective_source())?;
        Ok(CompiledPattern { spec, regex, matches: AtomicU64::new(0) })
    }

    /// Try this pattern against `line`.
    ///
    /// Groups that did not take part in the match render as empty strings.
    pub fn apply(&self, line: &str) -> Option<T::Record> {
        let caps = self.regex.captures(line)?;
        let groups: Vec<&str> = caps.iter().map(|m| m.map_or("", |m| m.as_str())).collect();
        self.spec.templates.render(&groups)
    }

    pub fn source(&self) -> &str {
        &self.spec.regex
    }

    pub fn match_count(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    pub(crate) fn record_match(&self) {
        self.matches.fetch_add(1, Ordering::Relaxed);
    }
}
