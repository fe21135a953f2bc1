use crate::engine::{self, Catalog, Catalogs, Lookup, ReorderPolicy, Templates};
use crate::{
    CatalogStats, Category, Client, ConfigError, DEFAULT_ACCEPTABLE_INDEX, DEFAULT_MISS_THRESHOLD, Device,
    LookupMode, MIN_MISS_THRESHOLD, Os, Result, UserAgent,
};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Engine tuning.
///
/// ```
/// use uasift::{LookupMode, Options};
///
/// let opts = Options::default()
///     .with_mode(LookupMode::USER_AGENT | LookupMode::OS)
///     .with_miss_threshold(250_000)
///     .with_acceptable_index(10);
/// assert_eq!(opts.mode, LookupMode::USER_AGENT | LookupMode::OS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Catalogs consulted by [`Engine::parse`].
    pub mode: LookupMode,
    /// Misses a catalog accumulates before it re-sorts itself by hit count.
    /// Values below [`MIN_MISS_THRESHOLD`] are raised to it.
    pub miss_threshold: u64,
    /// Deepest zero-based position a match may resolve at without counting as
    /// a miss.
    pub acceptable_index: usize,
    /// Compile the three catalogs on separate threads.
    pub parallel_load: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            mode: LookupMode::all(),
            miss_threshold: DEFAULT_MISS_THRESHOLD,
            acceptable_index: DEFAULT_ACCEPTABLE_INDEX,
            parallel_load: true,
        }
    }
}

impl Options {
    pub fn with_mode(mut self, mode: LookupMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_miss_threshold(mut self, miss_threshold: u64) -> Self {
        self.miss_threshold = miss_threshold;
        self
    }

    pub fn with_acceptable_index(mut self, acceptable_index: usize) -> Self {
        self.acceptable_index = acceptable_index;
        self
    }

    pub fn with_parallel_load(mut self, parallel_load: bool) -> Self {
        self.parallel_load = parallel_load;
        self
    }

    fn reorder_policy(&self) -> ReorderPolicy {
        ReorderPolicy {
            miss_threshold: self.miss_threshold.max(MIN_MISS_THRESHOLD),
            acceptable_index: self.acceptable_index,
        }
    }
}

/// How one catalog lookup resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupTrace {
    pub category: Category,
    /// Position of the winning pattern, `None` when the family fell back to
    /// [`OTHER`](crate::OTHER).
    pub matched_index: Option<usize>,
    /// Whether the lookup counted towards the catalog's reorder threshold.
    pub miss: bool,
    pub elapsed: Duration,
}

/// Additional details returned by [`Engine::parse_verbose`].
#[derive(Debug, Clone, Default)]
pub struct ParseDetails {
    pub total: Duration,
    /// One entry per enabled category, in user agent, os, device order.
    pub lookups: Vec<LookupTrace>,
    /// Catalogs that re-sorted themselves at the end of this call.
    pub reordered: Vec<Category>,
}

#[derive(Debug, Clone)]
pub struct ParseResultVerbose {
    pub client: Client,
    pub details: ParseDetails,
}

/// A loaded set of user agent, os and device catalogs.
///
/// `Engine` is `Send + Sync`; share it (for example behind an `Arc`) and call
/// [`parse`](Engine::parse) from any number of threads. Catalog order adapts
/// to the traffic seen by all callers.
#[derive(Debug)]
pub struct Engine {
    catalogs: Catalogs,
    mode: LookupMode,
}

impl Engine {
    /// Build an engine with every category enabled and default tuning.
    pub fn new(config: impl AsRef<[u8]>) -> Result<Self> {
        Self::with_options(config, Options::default())
    }

    /// Build an engine from configuration bytes and explicit tuning.
    pub fn with_options(config: impl AsRef<[u8]>, options: Options) -> Result<Self> {
        Self::build(config.as_ref(), options.mode, options.reorder_policy(), options.parallel_load)
    }

    /// Read a `regexes.yaml` file and build an engine from it.
    pub fn from_path(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let path = path.as_ref();
        let config = std::fs::read(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::with_options(config, options)
    }

    /// Unclamped constructor; lets tests use tiny miss thresholds.
    pub(crate) fn build(config: &[u8], mode: LookupMode, policy: ReorderPolicy, parallel: bool) -> Result<Self> {
        let catalogs = engine::load(config, policy, parallel)?;
        Ok(Engine { catalogs, mode })
    }

    pub fn mode(&self) -> LookupMode {
        self.mode
    }

    /// Classify `line` in every category enabled by the engine's mode.
    ///
    /// Categories outside the mode stay `None` on the returned [`Client`].
    pub fn parse(&self, line: &str) -> Client {
        self.run(line, None)
    }

    /// Like [`parse`](Engine::parse), also reporting where each lookup
    /// resolved and how long it took.
    pub fn parse_verbose(&self, line: &str) -> ParseResultVerbose {
        let started = Instant::now();
        let mut details = ParseDetails::default();
        let client = self.run(line, Some(&mut details));
        details.total = started.elapsed();
        ParseResultVerbose { client, details }
    }

    /// Classify only the user agent, regardless of mode.
    pub fn parse_user_agent(&self, line: &str) -> UserAgent {
        let record = self.catalogs.user_agent.lookup(line).record;
        self.catalogs.user_agent.reorder_if_due();
        record
    }

    /// Classify only the operating system, regardless of mode.
    pub fn parse_os(&self, line: &str) -> Os {
        let record = self.catalogs.os.lookup(line).record;
        self.catalogs.os.reorder_if_due();
        record
    }

    /// Classify only the device, regardless of mode.
    pub fn parse_device(&self, line: &str) -> Device {
        let record = self.catalogs.device.lookup(line).record;
        self.catalogs.device.reorder_if_due();
        record
    }

    /// Per-category counters, with the first `top` patterns of each catalog
    /// in current order.
    pub fn stats(&self, top: usize) -> Vec<CatalogStats> {
        vec![self.catalogs.user_agent.stats(top), self.catalogs.os.stats(top), self.catalogs.device.stats(top)]
    }

    fn run(&self, line: &str, mut details: Option<&mut ParseDetails>) -> Client {
        let mut client = Client::default();

        if self.mode.contains(LookupMode::USER_AGENT) {
            client.user_agent = Some(traced(&self.catalogs.user_agent, line, details.as_deref_mut()));
        }
        if self.mode.contains(LookupMode::OS) {
            client.os = Some(traced(&self.catalogs.os, line, details.as_deref_mut()));
        }
        if self.mode.contains(LookupMode::DEVICE) {
            client.device = Some(traced(&self.catalogs.device, line, details.as_deref_mut()));
        }

        // Reorder checks only after every lookup of this call.
        let reordered = [
            self.mode.contains(LookupMode::USER_AGENT) && self.catalogs.user_agent.reorder_if_due(),
            self.mode.contains(LookupMode::OS) && self.catalogs.os.reorder_if_due(),
            self.mode.contains(LookupMode::DEVICE) && self.catalogs.device.reorder_if_due(),
        ];
        if let Some(details) = details {
            details.reordered =
                Category::ALL.into_iter().zip(reordered).filter(|(_, done)| *done).map(|(c, _)| c).collect();
        }

        client
    }
}

fn traced<T: Templates>(catalog: &Catalog<T>, line: &str, details: Option<&mut ParseDetails>) -> T::Record {
    let started = details.is_some().then(Instant::now);
    let Lookup { record, index, miss } = catalog.lookup(line);
    if let (Some(details), Some(started)) = (details, started) {
        details.lookups.push(LookupTrace { category: T::CATEGORY, matched_index: index, miss, elapsed: started.elapsed() });
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OTHER;

    const CONFIG: &str = "
user_agent_parsers:
  - regex: 'Chrome'
    family_replacement: 'Chrome'
  - regex: '.*'
    family_replacement: 'Other'
os_parsers:
  - regex: '(Windows) NT (\\d+)\\.(\\d+)'
device_parsers:
  - regex: '(Pixel) (\\d+)'
    device_replacement: '$1 $2'
    brand_replacement: 'Google'
";

    #[test]
    fn catch_all_rule_resolves_unknown_lines() {
        let engine = Engine::with_options(CONFIG, Options::default().with_mode(LookupMode::USER_AGENT)).unwrap();

        let chrome = engine.parse("Mozilla Chrome/99");
        assert_eq!(chrome.user_agent.unwrap().family, "Chrome");
        assert!(chrome.os.is_none());
        assert!(chrome.device.is_none());

        let bot = engine.parse("unknown-bot").user_agent.unwrap();
        assert_eq!(bot.family, OTHER);
        assert_eq!(bot.major, None);
    }

    #[test]
    fn os_only_mode_leaves_other_categories_unset() {
        let engine = Engine::with_options(CONFIG, Options::default().with_mode(LookupMode::OS)).unwrap();
        for line in ["Mozilla Chrome/99 (Windows NT 10.0; Pixel 8)", "", "unknown-bot"] {
            let client = engine.parse(line);
            assert!(client.user_agent.is_none());
            assert!(client.device.is_none());
            assert!(client.os.is_some());
        }
        let os = engine.parse("Windows NT 10.0").os.unwrap();
        assert_eq!((os.family.as_str(), os.major.as_deref(), os.minor.as_deref()), ("Windows", Some("10"), Some("0")));
    }

    #[test]
    fn empty_mode_populates_nothing() {
        let engine = Engine::with_options(CONFIG, Options::default().with_mode(LookupMode::empty())).unwrap();
        assert_eq!(engine.parse("Chrome Pixel 8"), Client::default());
        assert!(engine.stats(0).iter().all(|s| s.matches == 0 && s.misses == 0));
    }

    #[test]
    fn single_category_queries_ignore_mode() {
        let engine = Engine::with_options(CONFIG, Options::default().with_mode(LookupMode::OS)).unwrap();
        let device = engine.parse_device("Android; Pixel 8 Build");
        assert_eq!(device.family, "Pixel 8");
        assert_eq!(device.brand.as_deref(), Some("Google"));
        assert_eq!(device.model.as_deref(), Some("Pixel"));
        assert_eq!(engine.parse_user_agent("Chrome").family, "Chrome");
        assert_eq!(engine.parse_os("Linux").family, OTHER);
    }

    #[test]
    fn verbose_parse_reports_each_enabled_lookup() {
        let engine = Engine::new(CONFIG).unwrap();
        let res = engine.parse_verbose("curl/8.4");
        let found: Vec<_> = res.details.lookups.iter().map(|t| (t.category, t.matched_index, t.miss)).collect();
        assert_eq!(
            found,
            vec![(Category::UserAgent, Some(1), false), (Category::Os, None, true), (Category::Device, None, true)]
        );
        assert!(res.details.reordered.is_empty());
        assert!(res.details.lookups.iter().all(|t| t.elapsed <= res.details.total));
        assert_eq!(res.client.user_agent.unwrap().family, OTHER);
    }

    #[test]
    fn threshold_floor_is_enforced() {
        let low = Options::default().with_miss_threshold(5).reorder_policy();
        let floor = Options::default().with_miss_threshold(MIN_MISS_THRESHOLD).reorder_policy();
        assert_eq!(low, floor);
        assert_eq!(Options::default().with_miss_threshold(MIN_MISS_THRESHOLD + 1).reorder_policy().miss_threshold, MIN_MISS_THRESHOLD + 1);
        assert_eq!(Options::default().reorder_policy().miss_threshold, DEFAULT_MISS_THRESHOLD);
    }

    #[test]
    fn from_path_reports_io_errors() {
        let err = Engine::from_path("/nonexistent/regexes.yaml", Options::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/regexes.yaml"));
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
