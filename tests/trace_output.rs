//! Block map dump driven by the config trace flag

use diskpack::{compact_with, BlockStore, CompactionConfig, CompactionPolicy};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Log sink shared with the subscriber
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Compact "12345" under a WARN base filter extended by the config
fn run_logged(config: &CompactionConfig) -> String {
    let log = CapturedLog::default();
    let sink = log.clone();
    let filter = config.apply_log_filter(EnvFilter::new("warn")).unwrap();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut store = BlockStore::build("12345").unwrap();
        compact_with(&mut store, config).unwrap();
    });

    let bytes = log.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_config_trace_flag_emits_block_maps() {
    let config = CompactionConfig::from_toml_str("policy = \"fragment\"\ntrace = true").unwrap();
    let output = run_logged(&config);

    assert!(output.contains("0..111....22222"), "missing initial map: {}", output);
    assert!(output.contains("02.111....2222."), "missing first move: {}", output);
    assert!(output.contains("022111222......"), "missing final map: {}", output);
}

#[test]
fn test_block_maps_silent_without_trace_flag() {
    let config = CompactionConfig::new(CompactionPolicy::Fragment);
    let output = run_logged(&config);
    assert!(!output.contains("0..111....22222"), "unexpected dump: {}", output);
}
