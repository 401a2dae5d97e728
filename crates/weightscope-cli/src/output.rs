//! Output rendering shared by the commands.
//!
//! Results go to stdout; logs go to stderr through `tracing`.

use console::style;
use serde::Serialize;
use std::io::Write;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Emit a result. JSON mode serializes `value` to stdout; text mode calls
/// `text_fn` to render it.
pub fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text_fn: impl FnOnce(&T),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
        OutputFormat::Text => text_fn(value),
    }
    Ok(())
}

/// Bold section heading; plain when stdout is not a terminal.
pub fn heading(text: &str) {
    println!("{}", style(text).bold());
}

/// Render a count with thousands separators.
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_flag() {
        assert_eq!(OutputFormat::from_json_flag(true), OutputFormat::Json);
        assert_eq!(OutputFormat::from_json_flag(false), OutputFormat::Text);
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_emit_json() {
        let value = serde_json::json!({"key": "value"});
        assert!(emit(OutputFormat::Json, &value, |_| {}).is_ok());
    }

    #[test]
    fn test_emit_text_calls_renderer() {
        let mut called = false;
        emit(OutputFormat::Text, &1u32, |_| called = true).unwrap();
        assert!(called);
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }
}
