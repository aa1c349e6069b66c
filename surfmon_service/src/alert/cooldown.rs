/// Check cooldown gating for the scheduler.
///
/// The forecast source only updates a few times a day and does not appreciate
/// being hammered, so whoever triggers checks (a cron job, a refresh button)
/// should wait out a cooldown between them. The core keeps no record of when
/// it last ran; the caller owns that state and passes it in.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally, so tests stay deterministic.

use chrono::{DateTime, Utc};

/// Default wait between checks, in minutes.
pub const DEFAULT_COOLDOWN_MINUTES: u64 = 30;

// ---------------------------------------------------------------------------
// Cooldown check
// ---------------------------------------------------------------------------

/// Whole minutes left before another check is allowed, rounded up.
///
/// Returns 0 when there has been no previous check, when the cooldown has
/// elapsed, or when `last_check` lies in the future (clock skew should not
/// lock the scheduler out).
pub fn cooldown_remaining_at(
    last_check: Option<DateTime<Utc>>,
    cooldown_minutes: u64,
    now: DateTime<Utc>,
) -> u64 {
    let Some(last) = last_check else {
        return 0;
    };
    let elapsed_secs = (now - last).num_seconds();
    if elapsed_secs < 0 {
        return 0;
    }
    let cooldown_secs = cooldown_minutes.saturating_mul(60);
    let remaining_secs = cooldown_secs.saturating_sub(elapsed_secs as u64);
    remaining_secs.div_ceil(60)
}

/// Returns `true` if a new check may run at `now`.
///
/// A check is due once the elapsed time is greater than or equal to the
/// cooldown:
///   elapsed >= cooldown  →  due
///   elapsed <  cooldown  →  not due
pub fn check_due_at(
    last_check: Option<DateTime<Utc>>,
    cooldown_minutes: u64,
    now: DateTime<Utc>,
) -> bool {
    cooldown_remaining_at(last_check, cooldown_minutes, now) == 0
}

/// Convenience wrapper that uses the real current time.
/// Use `check_due_at` in tests to keep them deterministic.
pub fn check_due(last_check: Option<DateTime<Utc>>, cooldown_minutes: u64) -> bool {
    check_due_at(last_check, cooldown_minutes, Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
