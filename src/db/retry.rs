use rand::Rng;

/// Reconnect policy for a database handle.
///
/// The default mirrors the long-standing deployment behavior: probe, sleep a
/// flat five seconds, probe again, forever. A handle configured this way
/// never reports a connection failure to its caller; it blocks until the
/// database comes back. Setting `max_attempts` bounds the loop so an
/// unreachable database surfaces an error instead.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_seconds: u64,
    pub max_seconds: u64,
    pub jitter_pct: f64,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_seconds: 5,
            max_seconds: 5,
            jitter_pct: 0.0,
            max_attempts: None,
        }
    }
}

/// Delay before reconnect attempt `attempt_no` (1-based): exponential from
/// `base_seconds`, capped at `max_seconds`, with optional +/- jitter.
pub fn next_delay_seconds(attempt_no: u32, cfg: &RetryPolicy, rng: &mut impl Rng) -> u64 {
    let exp = attempt_no.saturating_sub(1).min(16);
    let pow2 = 1_u64.checked_shl(exp).unwrap_or(u64::MAX);

    let mut delay = cfg.base_seconds.saturating_mul(pow2);
    if delay > cfg.max_seconds {
        delay = cfg.max_seconds;
    }

    let jitter_range = (delay as f64) * cfg.jitter_pct;
    if jitter_range > 0.0 {
        let jitter = rng.gen_range(-jitter_range..=jitter_range);
        delay = (delay as f64 + jitter).round().max(0.0) as u64;
    }

    delay.min(cfg.max_seconds)
}
