//! Human and JSON rendering of command results
//!
//! Results go to stdout, diagnostics to stderr. In JSON mode stdout carries
//! exactly one document per command.

use serde::Serialize;

use super::OutputConfig;

/// Human-readable binary size ("2 KiB")
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Status marker printed in front of a message
#[derive(Debug, Clone, Copy)]
enum Marker {
    Done,
    Failed,
    Caution,
}

impl Marker {
    const fn symbol(self) -> &'static str {
        match self {
            Marker::Done => "✓",
            Marker::Failed => "✗",
            Marker::Caution => "⚠",
        }
    }

    const fn ansi(self) -> &'static str {
        match self {
            Marker::Done => "32",
            Marker::Failed => "31",
            Marker::Caution => "33",
        }
    }
}

/// Writes command output according to the global output flags
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// ANSI colors are used unless disabled or in JSON mode
    pub fn colors_enabled(&self) -> bool {
        !(self.config.no_color || self.config.json)
    }

    fn marked(&self, marker: Marker, message: &str) -> String {
        if self.colors_enabled() {
            format!("\x1b[{}m{}\x1b[0m {message}", marker.ansi(), marker.symbol())
        } else {
            format!("{} {message}", marker.symbol())
        }
    }

    /// Confirmation of a completed operation; silent in quiet and JSON mode
    pub fn success(&self, message: &str) {
        if !(self.config.quiet || self.config.json) {
            println!("{}", self.marked(Marker::Done, message));
        }
    }

    /// Failure report, printed even in quiet mode
    ///
    /// JSON mode wraps the message in `{"error": ...}` on stderr.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let document = serde_json::json!({ "error": message });
            eprintln!("{document}");
        } else {
            eprintln!("{}", self.marked(Marker::Failed, message));
        }
    }

    pub fn warning(&self, message: &str) {
        if !(self.config.quiet || self.config.json) {
            eprintln!("{}", self.marked(Marker::Caution, message));
        }
    }

    /// Pretty-printed JSON document on stdout
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(document) => println!("{document}"),
            Err(e) => eprintln!("Cannot render output as JSON: {e}"),
        }
    }

    /// Plain result line, suppressed by `--quiet`
    pub fn println(&self, message: &str) {
        if !self.config.quiet {
            println!("{message}");
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter(config: OutputConfig) -> Formatter {
        Formatter::new(config)
    }

    #[test]
    fn test_default_is_human_with_colors() {
        let formatter = Formatter::default();
        assert!(!formatter.is_json());
        assert!(formatter.colors_enabled());
        assert_eq!(formatter.marked(Marker::Done, "ok"), "\x1b[32m✓\x1b[0m ok");
    }

    #[test]
    fn test_json_mode_disables_colors() {
        let formatter = formatter(OutputConfig {
            json: true,
            ..Default::default()
        });
        assert!(formatter.is_json());
        assert!(!formatter.colors_enabled());
    }

    #[test]
    fn test_plain_markers_without_color() {
        let formatter = formatter(OutputConfig {
            no_color: true,
            ..Default::default()
        });
        assert!(!formatter.colors_enabled());
        assert_eq!(formatter.marked(Marker::Failed, "gone"), "✗ gone");
        assert_eq!(formatter.marked(Marker::Caution, "hmm"), "⚠ hmm");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(2048), "2 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3 MiB");
    }
}
