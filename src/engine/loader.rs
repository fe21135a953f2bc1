//! Configuration loading.
//!
//! The document is ua-parser's `regexes.yaml` layout: three top-level
//! sequences (`user_agent_parsers`, `os_parsers`, `device_parsers`) of rule
//! mappings. Keys are matched after normalization (alphanumeric runs joined and
//! lowercased), so `family_replacement`, `FamilyReplacement` and
//! `family-replacement` all name the same field.
//!
//! The three catalogs share no state, so they are compiled on separate scoped
//! threads and joined before the engine is handed out. Sequential loading
//! produces the same catalogs.

use super::catalog::{Catalog, ReorderPolicy};
use super::pattern::{CompiledPattern, DeviceTemplates, OsTemplates, RuleSpec, Templates, UserAgentTemplates};
use crate::{ConfigError, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::thread;
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct RawDocument {
    user_agent_parsers: Vec<RawRule>,
    os_parsers: Vec<RawRule>,
    device_parsers: Vec<RawRule>,
}

type RawRule = BTreeMap<String, Value>;

/// The three catalogs of one engine.
#[derive(Debug)]
pub(crate) struct Catalogs {
    pub user_agent: Catalog<UserAgentTemplates>,
    pub os: Catalog<OsTemplates>,
    pub device: Catalog<DeviceTemplates>,
}

/// Parse `config` and compile every rule. Fails on the first invalid entry,
/// checking categories in user agent, os, device order.
pub(crate) fn load(config: &[u8], policy: ReorderPolicy, parallel: bool) -> Result<Catalogs> {
    let started = Instant::now();
    let doc: RawDocument = serde_yaml::from_slice(config)?;

    let (user_agent, os, device) = if parallel {
        thread::scope(|s| {
            let user_agent = s.spawn(|| build::<UserAgentTemplates>(&doc.user_agent_parsers, policy));
            let os = s.spawn(|| build::<OsTemplates>(&doc.os_parsers, policy));
            let device = build::<DeviceTemplates>(&doc.device_parsers, policy);
            (join(user_agent), join(os), device)
        })
    } else {
        (
            build::<UserAgentTemplates>(&doc.user_agent_parsers, policy),
            build::<OsTemplates>(&doc.os_parsers, policy),
            build::<DeviceTemplates>(&doc.device_parsers, policy),
        )
    };

    let catalogs = Catalogs { user_agent: user_agent?, os: os?, device: device? };
    tracing::info!(
        user_agent = catalogs.user_agent.len(),
        os = catalogs.os.len(),
        device = catalogs.device.len(),
        parallel,
        elapsed = ?started.elapsed(),
        "pattern catalogs loaded"
    );
    Ok(catalogs)
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

fn build<T: Templates>(rules: &[RawRule], policy: ReorderPolicy) -> Result<Catalog<T>> {
    let patterns = rules
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let spec = rule_spec::<T>(index, raw)?;
            CompiledPattern::compile(spec).map_err(|source| ConfigError::InvalidRegex {
                category: T::CATEGORY,
                index,
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(category = %T::CATEGORY, patterns = patterns.len(), "catalog compiled");
    Ok(Catalog::new(patterns, policy))
}

fn rule_spec<T: Templates>(index: usize, raw: &RawRule) -> Result<RuleSpec<T>> {
    let mut regex = None;
    let mut spec = RuleSpec::<T>::default();

    for (key, value) in raw {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return Err(ConfigError::InvalidValue { category: T::CATEGORY, index, field: key.clone() }),
        };

        let field = normalize_key(key);
        match field.as_str() {
            "regex" => regex = Some(text),
            "regexflag" if T::CATEGORY.honors_regex_flag() => spec.regex_flag = Some(text),
            // An empty template behaves like an absent one.
            _ if text.is_empty() => {}
            _ => {
                if !spec.templates.assign(&field, text) {
                    tracing::debug!(category = %T::CATEGORY, index, key = key.as_str(), "ignoring unknown rule field");
                }
            }
        }
    }

    spec.regex = regex.ok_or(ConfigError::MissingRegex { category: T::CATEGORY, index })?;
    Ok(spec)
}

/// `os_v1_replacement` -> `osv1replacement`.
pub(crate) fn normalize_key(key: &str) -> String {
    regex!(r"[0-9A-Za-z]+").find_iter(key).map(|m| m.as_str().to_ascii_lowercase()).collect()
}
