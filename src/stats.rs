use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Counters for traffic seen by the proxy.
#[derive(Debug, Default)]
pub struct Stats {
    /// Total commands decoded
    total_commands: AtomicU64,
    /// Total replies decoded
    total_replies: AtomicU64,
    /// Error replies among them
    error_replies: AtomicU64,
    /// Connections closed on a protocol error
    protocol_errors: AtomicU64,
    /// Per-command counts
    command_counts: RwLock<HashMap<String, u64>>,
}

impl Stats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Increment the count for a command name. Empty commands count as `""`.
    pub fn record_command(&self, name: &[u8]) {
        let new_total = self.total_commands.fetch_add(1, Ordering::Relaxed) + 1;

        let name = String::from_utf8_lossy(name).to_uppercase();
        if let Ok(mut counts) = self.command_counts.write() {
            *counts.entry(name).or_insert(0) += 1;
        }

        // Log every 100 commands
        if new_total % 100 == 0 {
            info!("Commands processed: {}", new_total);
        }
    }

    pub fn record_reply(&self, is_error: bool) {
        self.total_replies.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.error_replies.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total command count.
    pub fn total(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }

    /// Get a snapshot of per-command counts.
    pub fn command_counts(&self) -> HashMap<String, u64> {
        self.command_counts
            .read()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }

    /// Print a summary of stats to stderr (ensures visibility on shutdown).
    pub fn print_summary(&self) {
        let counts = self.command_counts();

        eprintln!("\n=== Traffic Statistics ===");
        eprintln!("Total commands: {}", self.total());
        eprintln!(
            "Total replies: {} ({} errors)",
            self.total_replies.load(Ordering::Relaxed),
            self.error_replies.load(Ordering::Relaxed)
        );
        eprintln!(
            "Protocol errors: {}",
            self.protocol_errors.load(Ordering::Relaxed)
        );

        if !counts.is_empty() {
            eprintln!("\nPer-command breakdown:");
            let mut sorted: Vec<_> = counts.into_iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(&a.1)); // Sort by count descending

            for (cmd, count) in sorted {
                eprintln!("  {}: {}", cmd, count);
            }
        }
        eprintln!("==========================\n");
    }
}
