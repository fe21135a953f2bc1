use divan::AllocProfiler;
use once_cell::sync::Lazy;
use uasift::{Engine, LookupMode, Options};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

const RULES: &str = include_str!("../data/regexes.yaml");

static ENGINE: Lazy<Engine> = Lazy::new(|| Engine::new(RULES).expect("sample rules load"));

static UA_ONLY: Lazy<Engine> = Lazy::new(|| {
    Engine::with_options(RULES, Options::default().with_mode(LookupMode::USER_AGENT)).expect("sample rules load")
});

fn main() {
    // Run registered benchmarks.
    divan::main();
}

#[divan::bench(args = [
    "curl/8.4.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.67",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
])]
fn parse_all(ua: &str) {
    let _ = ENGINE.parse(ua);
}

#[divan::bench(args = [
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.82 Mobile Safari/537.36",
    "Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1; Trident/4.0)",
])]
fn parse_user_agent_only(ua: &str) {
    let _ = UA_ONLY.parse(ua);
}

#[divan::bench]
fn load_catalogs() -> Engine {
    Engine::new(RULES).expect("sample rules load")
}
