//! Status lines printed to the user
//!
//! Every line carries the `openschema <level>` prefix so output stays recognizable when
//! interleaved with other tools. Diagnostics go through `tracing` instead.

use crate::constants::BRAND;

pub fn notice(msg: impl AsRef<str>) {
    println!("{BRAND} notice {}", msg.as_ref());
}

pub fn warn(msg: impl AsRef<str>) {
    println!("{BRAND} warn {}", msg.as_ref());
}

pub fn error(msg: impl AsRef<str>) {
    eprintln!("{BRAND} error {}", msg.as_ref());
}

pub fn success(msg: impl AsRef<str>) {
    println!("✅ {}", msg.as_ref());
}

/// Human readable size using decimal units
pub fn format_byte_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["kB", "MB", "GB", "TB"];
    if bytes < 1000 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Elide the middle of `text` so that it fits in `width` columns
pub fn truncate_middle(text: &str, width: usize) -> String {
    const MARKER: &str = "[...]";
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= width || width <= MARKER.len() + 2 {
        return text.to_string();
    }
    let keep = width - MARKER.len();
    let head = keep / 2;
    let tail = keep - head;
    let mut out: String = chars[..head].iter().collect();
    out.push_str(MARKER);
    out.extend(&chars[chars.len() - tail..]);
    out
}

/// Width of the terminal, from `COLUMNS` when the shell exports it
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(100)
}
