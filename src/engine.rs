//! Matching engine.
//!
//! The engine is split into focused submodules under `src/engine/`; the public
//! entry point wrapping them is [`crate::Engine`] in `api.rs`.
//!
//! ## How the parts work together
//!
//! ```text
//! YAML bytes ── loader::load ──┬── Catalog<UserAgentTemplates>   (one thread each,
//!               (loader.rs)    ├── Catalog<OsTemplates>           joined before
//!                              └── Catalog<DeviceTemplates>       use)
//!                                          │
//! line ── Engine::parse ── for each enabled catalog:
//!                            Catalog::lookup          (catalog.rs)
//!                              - scan patterns in current order
//!                              - CompiledPattern::apply (pattern.rs)
//!                                  - regex captures
//!                                  - template::substitute per field
//!                              - first non-empty family wins
//!                              - count hit / miss
//!                          then Catalog::reorder_if_due
//!                                          │
//!                                          v
//!                                       Client
//! ```
//!
//! ## Responsibilities by module
//!
//! - `template.rs`: `$N` capture substitution.
//! - `pattern.rs`: per-category templates, record rendering and the compiled
//!   pattern with its hit counter.
//! - `catalog.rs`: ordered pattern list, miss accounting and the adaptive
//!   reorder.
//! - `loader.rs`: YAML document to three catalogs.
//! - `metrics.rs`: catalog statistics snapshots.
//!
//! ## Debugging
//!
//! Reorders and load timings are reported through `tracing` at `debug` level;
//! individual misses at `trace`.

#[path = "engine/catalog.rs"]
mod catalog;
#[path = "engine/loader.rs"]
mod loader;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/pattern.rs"]
mod pattern;
#[path = "engine/template.rs"]
mod template;


pub(crate) use catalog::{Catalog, Lookup, ReorderPolicy};
pub(crate) use loader::{Catalogs, load};
pub use metrics::{CatalogStats, PatternSummary};
pub(crate) use pattern::Templates;
