//! Compaction configuration
//!
//! The only knob that affects results is which policy runs. The trace flag
//! turns on the per-move block map dump emitted at `trace` level.
//!
//! ```toml
//! policy = "fragment"
//! trace = true
//! ```

use crate::error::{DiskError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::filter::{Directive, EnvFilter};

/// Log target of the per-move block map dump
pub const TRACE_TARGET: &str = "diskpack::trace";

/// Which compactor to run over a disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompactionPolicy {
    /// Block-by-block two-pointer move; files may end up split
    Fragment,
    /// Whole-file relocation into the leftmost free run that fits
    Defragment,
}

impl fmt::Display for CompactionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompactionPolicy::Fragment => f.write_str("fragment"),
            CompactionPolicy::Defragment => f.write_str("defragment"),
        }
    }
}

impl FromStr for CompactionPolicy {
    type Err = DiskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fragment" | "compact" => Ok(CompactionPolicy::Fragment),
            "defragment" | "defrag" => Ok(CompactionPolicy::Defragment),
            _ => Err(DiskError::Config(format!(
                "Invalid compaction policy '{}'. Valid options: fragment, defragment",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompactionConfig {
    pub policy: CompactionPolicy,

    /// Emit the rendered block map after every move
    pub trace: bool,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        CompactionConfig {
            policy: CompactionPolicy::Defragment,
            trace: false,
        }
    }
}

impl CompactionConfig {
    pub fn new(policy: CompactionPolicy) -> Self {
        CompactionConfig {
            policy,
            ..Default::default()
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DiskError::Config(e.to_string()))
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded compaction config from {:?}", path.as_ref());
        Self::from_toml_str(&contents)
    }

    /// Extend a log filter so the block map dump passes when `trace` is set
    pub fn apply_log_filter(&self, filter: EnvFilter) -> Result<EnvFilter> {
        if !self.trace {
            return Ok(filter);
        }
        let directive: Directive = format!("{}=trace", TRACE_TARGET)
            .parse()
            .map_err(|e| DiskError::Config(format!("invalid trace directive: {}", e)))?;
        Ok(filter.add_directive(directive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompactionConfig::default();
        assert_eq!(config.policy, CompactionPolicy::Defragment);
        assert!(!config.trace);
    }

    #[test]
    fn test_parse_policy_aliases() {
        assert_eq!(
            "Fragment".parse::<CompactionPolicy>().unwrap(),
            CompactionPolicy::Fragment
        );
        assert_eq!(
            "compact".parse::<CompactionPolicy>().unwrap(),
            CompactionPolicy::Fragment
        );
        assert_eq!(
            "DEFRAG".parse::<CompactionPolicy>().unwrap(),
            CompactionPolicy::Defragment
        );
        assert!(matches!(
            "shuffle".parse::<CompactionPolicy>(),
            Err(DiskError::Config(_))
        ));
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [CompactionPolicy::Fragment, CompactionPolicy::Defragment] {
            assert_eq!(policy.to_string().parse::<CompactionPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_from_toml() {
        let source = "policy = \"fragment\"\ntrace = true\n";
        let config = CompactionConfig::from_toml_str(source).unwrap();
        assert_eq!(config.policy, CompactionPolicy::Fragment);
        assert!(config.trace);

        let partial = CompactionConfig::from_toml_str("trace = true").unwrap();
        assert_eq!(partial.policy, CompactionPolicy::Defragment);
    }

    #[test]
    fn test_trace_flag_extends_log_filter() {
        let quiet = CompactionConfig::default()
            .apply_log_filter(EnvFilter::new("warn"))
            .unwrap();
        assert!(!quiet.to_string().contains(TRACE_TARGET));

        let traced = CompactionConfig::default()
            .with_trace(true)
            .apply_log_filter(EnvFilter::new("warn"))
            .unwrap();
        assert!(traced.to_string().contains("diskpack::trace=trace"));
    }

    #[test]
    fn test_from_toml_rejects_unknown() {
        assert!(CompactionConfig::from_toml_str("policy = \"shuffle\"").is_err());
        assert!(CompactionConfig::from_toml_str("threads = 4").is_err());
    }
}
