mod report;

use serde::Serialize;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uasift::{Client, Engine, LookupMode, Options};

const STATS_TOP: usize = 5;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    init_logging(config.verbose);

    let engine = match Engine::from_path(&config.rules, config.options) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let palette = report::Palette::new(config.color);
    let mut run = Run::default();

    if config.inputs.is_empty() {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => run.classify(&engine, &line, &config, &palette),
                Err(err) => {
                    eprintln!("error: failed to read stdin: {err}");
                    std::process::exit(1);
                }
            }
        }
    } else {
        for input in &config.inputs {
            run.classify(&engine, input, &config, &palette);
        }
    }

    if config.stats {
        report::print_summary(run.processed, run.elapsed, &engine.stats(STATS_TOP), &palette);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "uasift=debug" } else { "uasift=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[derive(Default)]
struct Run {
    processed: usize,
    elapsed: Duration,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    input: &'a str,
    #[serde(flatten)]
    client: &'a Client,
}

impl Run {
    fn classify(&mut self, engine: &Engine, line: &str, config: &CliConfig, palette: &report::Palette) {
        let started = Instant::now();
        let client = engine.parse(line);
        self.elapsed += started.elapsed();
        self.processed += 1;

        if config.json {
            match serde_json::to_string(&JsonLine { input: line, client: &client }) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("error: failed to encode result: {err}"),
            }
        } else {
            report::print_client(line, &client, palette);
        }
    }
}

struct CliConfig {
    rules: PathBuf,
    options: Options,
    inputs: Vec<String>,
    json: bool,
    stats: bool,
    color: bool,
    verbose: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut rules: Option<PathBuf> = None;
    let mut options = Options::default();
    let mut inputs = Vec::new();
    let mut json = false;
    let mut stats = false;
    let mut color = io::stdout().is_terminal();
    let mut verbose = false;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            inline.clone().or_else(|| args.next()).ok_or_else(|| format!("error: {name} expects a value"))
        };

        match flag.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("uasift {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "-c" | "--config" => rules = Some(PathBuf::from(value("--config")?)),
            "-m" | "--mode" => options.mode = parse_mode(&value("--mode")?)?,
            "--threshold" => options.miss_threshold = parse_number(&value("--threshold")?, "--threshold")?,
            "--acceptable-index" => {
                options.acceptable_index = parse_number(&value("--acceptable-index")?, "--acceptable-index")?
            }
            "--json" => json = true,
            "--stats" => stats = true,
            "--color" => color = true,
            "--no-color" => color = false,
            "-v" | "--verbose" => verbose = true,
            "--" => {
                inputs.extend(args.by_ref());
                break;
            }
            _ if arg.starts_with('-') => return Err(format!("error: unknown option '{arg}'")),
            _ => inputs.push(arg),
        }
    }

    let rules = rules.ok_or_else(|| format!("error: --config is required\n\n{}", help_text()))?;
    Ok(CliConfig { rules, options, inputs, json, stats, color, verbose })
}

fn parse_mode(value: &str) -> Result<LookupMode, String> {
    let mut mode = LookupMode::empty();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        mode |= match part {
            "ua" | "user-agent" | "user_agent" => LookupMode::USER_AGENT,
            "os" => LookupMode::OS,
            "device" => LookupMode::DEVICE,
            "all" => LookupMode::all(),
            "none" => LookupMode::empty(),
            _ => return Err(format!("error: invalid --mode '{part}' (expected ua, os, device, all or none)")),
        };
    }
    Ok(mode)
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("error: invalid {flag} '{value}' (expected a non-negative integer)"))
}

fn help_text() -> String {
    format!(
        "uasift {version}

Classify user agent strings with a ua-parser style regexes.yaml.

Usage:
  uasift --config <regexes.yaml> [OPTIONS] [--] [<user-agent>...]

Without user agent arguments, one user agent per line is read from stdin.

Options:
  -c, --config <path>         Rule file (user_agent_parsers, os_parsers,
                              device_parsers).
  -m, --mode <list>           Comma separated categories: ua, os, device, all,
                              none. Default: all
      --threshold <n>         Misses before a catalog re-sorts itself.
                              Default: {threshold} (minimum {min_threshold})
      --acceptable-index <n>  Deepest catalog position not counted as a miss.
                              Default: {acceptable}
      --json                  Print one JSON object per input.
      --stats                 Print timing and catalog statistics at the end.
      --color                 Force ANSI color output.
      --no-color              Disable ANSI color output.
  -v, --verbose               Debug logging (overridden by RUST_LOG).
  -h, --help                  Show this help message.
  -V, --version               Print version information.

Exit codes:
  0  Success.
  1  Configuration or input error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        threshold = uasift::DEFAULT_MISS_THRESHOLD,
        min_threshold = uasift::MIN_MISS_THRESHOLD,
        acceptable = uasift::DEFAULT_ACCEPTABLE_INDEX,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_combine() {
        assert_eq!(parse_mode("ua,os").unwrap(), LookupMode::USER_AGENT | LookupMode::OS);
        assert_eq!(parse_mode(" device ").unwrap(), LookupMode::DEVICE);
        assert_eq!(parse_mode("all").unwrap(), LookupMode::all());
        assert_eq!(parse_mode("none").unwrap(), LookupMode::empty());
        assert!(parse_mode("browser").is_err());
    }

    #[test]
    fn numbers_are_validated() {
        assert_eq!(parse_number::<u64>("250000", "--threshold").unwrap(), 250_000);
        assert!(parse_number::<usize>("-1", "--acceptable-index").is_err());
    }
}
