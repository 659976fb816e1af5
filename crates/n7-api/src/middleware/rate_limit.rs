//! Per-IP rate limits, keyed on the client address (`X-Forwarded-For`,
//! `X-Real-IP`, `Forwarded`, then the peer address).

/// Sign-in, sign-up and token refresh
pub const AUTH_RATE_PER_SECOND: u64 = 5;
pub const AUTH_BURST_SIZE: u32 = 10;

/// Everything else
pub const GENERAL_RATE_PER_SECOND: u64 = 10;
pub const GENERAL_BURST_SIZE: u32 = 20;

/// Build a `tower_governor` layer allowing `$per_second` requests per second
/// with a burst of `$burst_size`.
///
/// Governor takes the replenish interval of a single token, hence the
/// conversion to milliseconds. Each expansion owns its own limiter, so route
/// groups are limited independently.
#[macro_export]
macro_rules! make_rate_limit_layer {
    ($per_second:expr, $burst_size:expr) => {
        ::tower_governor::GovernorLayer::new(
            ::tower_governor::governor::GovernorConfigBuilder::default()
                .per_millisecond(1000 / $per_second)
                .burst_size($burst_size)
                .key_extractor(::tower_governor::key_extractor::SmartIpKeyExtractor)
                .use_headers()
                .finish()
                .expect("rate limit period and burst size must be non-zero"),
        )
    };
}
