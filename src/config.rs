//! Runtime configuration for the auto-solo runner.

use std::path::PathBuf;
use std::time::Duration;

use crate::store::detect_identity;

/// Bounded-wait budgets and fixed delays for the duel protocol and the
/// recovery ladder. Every bounded wait checks the stop signal once per
/// increment.
#[derive(Debug, Clone)]
pub struct Timings {
    /// Bounded wait for the duel engine to become active after initiation.
    pub wait_active: Duration,
    /// Poll increment for both activity waits.
    pub activity_poll: Duration,
    /// Fixed delay letting life totals initialize before the instant win.
    pub duel_settle: Duration,
    pub instant_win_attempts: u32,
    pub instant_win_delay: Duration,
    /// Bounded loop advancing the end-of-duel message.
    pub advance_timeout: Duration,
    pub advance_interval: Duration,
    /// Bounded wait for the duel engine to go inactive again.
    pub wait_inactive: Duration,
    /// Fixed delay letting result screens auto-dismiss.
    pub results_settle: Duration,
    pub post_clean_delay: Duration,
    /// Pause after a successful skip call.
    pub skip_settle: Duration,
    /// Pause after dismissing dialogs during recovery.
    pub dialog_settle: Duration,
    pub gate_entry_delay: Duration,
    pub between_chapters: Duration,
    /// Wait for the game process to come back after a forced reboot.
    pub reboot_wait: Duration,
    pub reattach_attempts: u32,
    pub reattach_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            wait_active: Duration::from_secs(15),
            activity_poll: Duration::from_millis(500),
            duel_settle: Duration::from_secs(2),
            instant_win_attempts: 10,
            instant_win_delay: Duration::from_millis(500),
            advance_timeout: Duration::from_secs(30),
            advance_interval: Duration::from_millis(300),
            wait_inactive: Duration::from_secs(60),
            results_settle: Duration::from_secs(5),
            post_clean_delay: Duration::from_secs(1),
            skip_settle: Duration::from_millis(300),
            dialog_settle: Duration::from_millis(500),
            gate_entry_delay: Duration::from_secs(1),
            between_chapters: Duration::from_secs(1),
            reboot_wait: Duration::from_secs(30),
            reattach_attempts: 5,
            reattach_delay: Duration::from_secs(5),
        }
    }
}

/// Runner configuration: paths, identity, speed, and failure thresholds.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the session database.
    pub data_dir: PathBuf,
    /// Static ordered chapter list (JSON).
    pub chapters_file: PathBuf,
    /// Explicit identity; when `None` it is detected from `local_data_dir`.
    pub identity: Option<String>,
    /// Root scanned for per-user folders when detecting the identity.
    pub local_data_dir: Option<PathBuf>,
    /// Engine speed multiplier applied for the duration of a run.
    pub time_scale: f64,
    /// Consecutive-failure circuit breaker threshold.
    pub max_consecutive_failures: u32,
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("autosolo");
        Self {
            chapters_file: data_dir.join("solo_chapters.json"),
            data_dir,
            identity: None,
            local_data_dir: None,
            time_scale: 10.0,
            max_consecutive_failures: 10,
            timings: Timings::default(),
        }
    }
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("sessions.db")
    }

    /// Resolve the progress-ledger identity: explicit override, else detected
    /// from the game's per-user data folder, else `"default"`.
    pub fn resolve_identity(&self) -> String {
        if let Some(identity) = &self.identity {
            return identity.clone();
        }
        let dir = self
            .local_data_dir
            .clone()
            .unwrap_or_else(default_local_data_dir);
        detect_identity(&dir)
    }
}

/// Default location of the game's per-user local-data folders.
pub fn default_local_data_dir() -> PathBuf {
    let program_files = std::env::var_os("ProgramFiles(x86)")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"));
    program_files
        .join("Steam")
        .join("steamapps")
        .join("common")
        .join("Yu-Gi-Oh!  Master Duel")
        .join("LocalData")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_expected_budgets() {
        let timings = Timings::default();
        assert_eq!(timings.wait_active, Duration::from_secs(15));
        assert_eq!(timings.wait_inactive, Duration::from_secs(60));
        assert_eq!(timings.instant_win_attempts, 10);
        assert_eq!(timings.reattach_attempts, 5);

        let config = Config::default();
        assert_eq!(config.max_consecutive_failures, 10);
        assert_eq!(config.time_scale, 10.0);
    }

    #[test]
    fn explicit_identity_wins() {
        let config = Config {
            identity: Some("alpha".into()),
            ..Config::default()
        };
        assert_eq!(config.resolve_identity(), "alpha");
    }

    #[test]
    fn identity_detected_from_local_data_dir() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("1c48200c")).unwrap();
        let config = Config {
            local_data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        assert_eq!(config.resolve_identity(), "1c48200c");
    }

    #[test]
    fn db_path_is_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/autosolo"),
            ..Config::default()
        };
        assert_eq!(config.db_path(), PathBuf::from("/tmp/autosolo/sessions.db"));
    }
}
