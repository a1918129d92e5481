use crate::TtlMs;
use tracing::warn;

pub struct Config {
    pub page_ttl: TtlMs,
    pub flush_on_start: bool,
}

impl Config {
    const DEFAULT_PAGE_TTL_MS: u64 = 10_000;

    pub fn from_env() -> Self {
        let page_ttl = std::env::var("LEDGER_PAGE_TTL_MS")
            .unwrap_or_else(|_| Self::DEFAULT_PAGE_TTL_MS.to_string())
            .parse::<u64>()
            .map(TtlMs)
            .unwrap_or_else(|_| {
                warn!(
                    "LEDGER_PAGE_TTL_MS is not a valid integer, defaulting to {}ms",
                    Self::DEFAULT_PAGE_TTL_MS
                );
                TtlMs(Self::DEFAULT_PAGE_TTL_MS)
            });
        let flush_on_start = std::env::var("LEDGER_FLUSH_ON_START")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);
        Self {
            page_ttl,
            flush_on_start,
        }
    }
}
