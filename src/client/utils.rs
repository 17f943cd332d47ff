//! Utility functions for the streaming client.
//!
//! This module provides helper functions for:
//! - Status code classification
//! - Retry delays with exponential backoff

use std::time::Duration;

/// Check if status code indicates access denied
pub fn is_access_denied_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

/// Exponential backoff delay calculation
///
/// Doubles `base_ms` per attempt; the exponent is capped at 10.
pub fn exponential_backoff(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2_u64.pow(attempt.min(10)));
    Duration::from_millis(delay_ms)
}
