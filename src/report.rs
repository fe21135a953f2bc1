use std::time::Duration;
use uasift::{CatalogStats, Client};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
        if self.enabled { format!("{}{}{}", color, s.as_ref(), ansi::RESET) } else { s.as_ref().to_string() }
    }

    fn bold(&self, s: impl AsRef<str>) -> String {
        if self.enabled { format!("{}{}{}", ansi::BOLD, s.as_ref(), ansi::RESET) } else { s.as_ref().to_string() }
    }

    fn dim(&self, s: impl AsRef<str>) -> String {
        if self.enabled { format!("{}{}{}", ansi::DIM, s.as_ref(), ansi::RESET) } else { s.as_ref().to_string() }
    }
}

/// One block per input: the raw line, then one row per requested category.
pub fn print_client(input: &str, client: &Client, palette: &Palette) {
    println!("{}", palette.bold(palette.paint(input, ansi::CYAN)));

    if let Some(ua) = &client.user_agent {
        println!("  {} {}", palette.dim("agent: "), palette.paint(ua.to_string(), ansi::GREEN));
    }
    if let Some(os) = &client.os {
        println!("  {} {}", palette.dim("os:    "), palette.paint(os.to_string(), ansi::GREEN));
    }
    if let Some(device) = &client.device {
        let mut row = palette.paint(device.to_string(), ansi::GREEN);
        if let Some(brand) = &device.brand {
            row.push_str(&format!(" {} {}", palette.dim("│ brand:"), palette.paint(brand, ansi::BLUE)));
        }
        if let Some(model) = &device.model {
            row.push_str(&format!(" {} {}", palette.dim("│ model:"), palette.paint(model, ansi::BLUE)));
        }
        println!("  {} {}", palette.dim("device:"), row);
    }
}

pub fn print_summary(processed: usize, elapsed: Duration, stats: &[CatalogStats], palette: &Palette) {
    println!("\n{}", palette.paint("━━━ Summary ━━━", ansi::GRAY));
    let per_line = if processed > 0 { elapsed / processed as u32 } else { Duration::ZERO };
    println!(
        "  Lines: {}  │  Total: {}  │  Per line: {}",
        palette.paint(processed.to_string(), ansi::BLUE),
        palette.paint(format!("{elapsed:?}"), ansi::GREEN),
        palette.dim(format!("{per_line:?}")),
    );

    println!("\n{}", palette.paint("━━━ Catalogs ━━━", ansi::GRAY));
    for catalog in stats {
        println!(
            "  {} {} patterns  {} {}  {} {}  {} {}",
            palette.bold(palette.paint(catalog.category.section(), ansi::CYAN)),
            catalog.patterns,
            palette.dim("matches:"),
            palette.paint(catalog.matches.to_string(), ansi::YELLOW),
            palette.dim("misses:"),
            palette.paint(catalog.misses.to_string(), ansi::YELLOW),
            palette.dim("reorders:"),
            palette.paint(catalog.reorders.to_string(), ansi::YELLOW),
        );
        for (idx, pattern) in catalog.head.iter().enumerate() {
            println!(
                "    {} {} {}",
                palette.paint(format!("[{idx}]"), ansi::GRAY),
                palette.paint(format!("{:>8}", pattern.matches), ansi::GREEN),
                palette.dim(truncate(&pattern.regex, 72)),
            );
        }
    }
    println!();
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { s.to_string() } else { format!("{}…", s.chars().take(max).collect::<String>()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_palette_leaves_text_alone() {
        let palette = Palette::new(false);
        assert_eq!(palette.paint("x", ansi::GREEN), "x");
        assert_eq!(Palette::new(true).bold("x"), "\x1b[1mx\x1b[0m");
    }

    #[test]
    fn long_regexes_are_truncated() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}
