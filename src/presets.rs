//! Rate-limit presets for the two places an estimate form is throttled.
//!
//! Nothing here is mandatory; callers can always build their own
//! [`RateLimitConfig`].
//!
//! - [`recalculation`]: live recomputation while a visitor types.
//! - [`submission`]: sending the estimate form (e.g. a "email me this" action).

use crate::rate_limit::RateLimitConfig;

const RECALCULATION_WINDOW_MS: u64 = 1_000;
const RECALCULATION_MAX_REQUESTS: u32 = 20;

const SUBMISSION_WINDOW_MS: u64 = 60_000;
const SUBMISSION_MAX_REQUESTS: u32 = 3;

/// 20 recomputations per second per key.
pub fn recalculation() -> RateLimitConfig {
    RateLimitConfig::fixed(RECALCULATION_WINDOW_MS, RECALCULATION_MAX_REQUESTS)
}

/// 3 submissions per minute per key.
pub fn submission() -> RateLimitConfig {
    RateLimitConfig::fixed(SUBMISSION_WINDOW_MS, SUBMISSION_MAX_REQUESTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_pass_validation() {
        for preset in [recalculation(), submission()] {
            assert_eq!(RateLimitConfig::new(preset.window_ms(), preset.max_requests()), Ok(preset));
        }
    }

    #[test]
    fn presets_carry_documented_limits() {
        let recalc = recalculation();
        assert_eq!((recalc.window_ms(), recalc.max_requests()), (1_000, 20));
        let submit = submission();
        assert_eq!((submit.window_ms(), submit.max_requests()), (60_000, 3));
    }
}
