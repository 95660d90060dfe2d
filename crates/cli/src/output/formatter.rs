//! Human-readable and JSON output
//!
//! Data goes to stdout; status, warnings and errors go to stderr so that
//! `--json` output stays machine-readable.

use console::{StyledObject, style};
use serde::Serialize;

use super::OutputConfig;
use crate::exit_code::ExitCode;

/// Writes command output according to [`OutputConfig`]
///
/// In JSON mode only [`Formatter::json`] and errors produce output.
#[derive(Debug, Clone, Default)]
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

    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Pretty-printed JSON on stdout
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    fn mark(&self, symbol: StyledObject<&'static str>) -> String {
        if self.colors_enabled() {
            symbol.to_string()
        } else {
            symbol.force_styling(false).to_string()
        }
    }

    /// Human mode only; silenced by `--quiet`
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{} {message}", self.mark(style("✓").green()));
    }

    /// Always printed, as a JSON object in JSON mode
    pub fn error(&self, message: &str) {
        if self.config.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("{} {message}", self.mark(style("✗").red()));
        }
    }

    /// Print `err` and return its exit code
    pub fn fail(&self, err: &hbp_core::Error) -> ExitCode {
        tracing::debug!(error = ?err, "Command failed");
        self.error(&err.to_string());
        ExitCode::from(err)
    }

    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        eprintln!("{} {message}", self.mark(style("⚠").yellow()));
    }

    /// A line of data; silenced by `--quiet`
    pub fn println(&self, message: &str) {
        if !self.config.quiet {
            println!("{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_rules() {
        assert!(Formatter::default().colors_enabled());

        let json = Formatter::new(OutputConfig {
            json: true,
            ..Default::default()
        });
        assert!(json.is_json());
        assert!(!json.colors_enabled());

        let plain = Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        });
        assert!(!plain.colors_enabled());
        assert_eq!(plain.mark(style("✓").green()), "✓");
    }

    #[test]
    fn test_fail_maps_exit_code() {
        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        let code = formatter.fail(&hbp_core::Error::NotFound("demo/a.txt".into()));
        assert_eq!(code, ExitCode::NotFound);
    }
}
