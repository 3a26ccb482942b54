// Utility functions

use chrono::Local;
use std::sync::{Mutex, MutexGuard};

/// Count the characters of a text with spaces and newlines removed.
///
/// This is the length definition used everywhere a character budget appears:
/// prompt length targets, validation deviations and the run cost estimate all
/// go through this function so they agree with each other.
///
/// # Example
/// ```ignore
/// use ghostpen_lib::utils::stripped_char_count;
///
/// assert_eq!(stripped_char_count("a b\nc"), 3);
/// ```
pub fn stripped_char_count(text: &str) -> usize {
    text.chars().filter(|c| *c != ' ' && *c != '\n').count()
}

/// Timestamp used to stamp run-scoped output directories, e.g. `20250807_143012`.
pub fn run_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Safely acquire a mutex lock, recovering from poisoning by returning the guard.
/// This is useful when you want to continue even if a previous thread panicked.
/// The mutex state may be inconsistent, so use with caution.
pub fn lock_mutex_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Mutex was poisoned, recovering: {}", poisoned);
            poisoned.into_inner()
        }
    }
}

/// Extension trait for Result that provides convenient error context methods.
/// Converts any error to a String with a descriptive message prefix.
///
/// # Example
/// ```ignore
/// use ghostpen_lib::utils::ResultExt;
///
/// let file = std::fs::read_to_string("config.json")
///     .with_context("Failed to read config file")?;
/// ```
pub trait ResultExt<T> {
    /// Converts the error to a String with context message.
    fn with_context(self, msg: &str) -> Result<T, String>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn with_context(self, msg: &str) -> Result<T, String> {
        self.map_err(|e| format!("{}: {}", msg, e))
    }
}
