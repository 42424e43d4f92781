//! TrustNet Metrics Module
//! ========================
//!
//! Delivery counters accumulated during a run and the reliability ratios
//! derived from them once the run completes:
//! - **Ping reliability**: pings received / pings sent
//! - **Pong reliability**: pongs received / pings received
//! - **Overall reliability**: 1 - drops / (pings sent + pings received)
//!
//! A ratio with a zero denominator is undefined and reported as `None`.

use crate::routing::DropReason;
use serde::{Deserialize, Serialize};

// =============================================================================
// COUNTERS
// =============================================================================

/// Drops broken down by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropBreakdown {
    pub greed: u64,
    pub no_route: u64,
    pub disconnected: u64,
    pub hop_limit: u64,
}

impl DropBreakdown {
    /// Count for one reason.
    pub fn get(&self, reason: DropReason) -> u64 {
        match reason {
            DropReason::Greed => self.greed,
            DropReason::NoRoute => self.no_route,
            DropReason::Disconnected => self.disconnected,
            DropReason::HopLimit => self.hop_limit,
        }
    }

    fn slot(&mut self, reason: DropReason) -> &mut u64 {
        match reason {
            DropReason::Greed => &mut self.greed,
            DropReason::NoRoute => &mut self.no_route,
            DropReason::Disconnected => &mut self.disconnected,
            DropReason::HopLimit => &mut self.hop_limit,
        }
    }

    /// Sum over every reason.
    pub fn total(&self) -> u64 {
        self.greed + self.no_route + self.disconnected + self.hop_limit
    }
}

/// Run-wide delivery counters. Every field only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounters {
    /// Pings produced
    pub pings_sent: u64,

    /// Pings that reached their destination
    pub pings_received: u64,

    /// Pongs that made it back to the ping's origin
    pub pongs_received: u64,

    /// Packets (pings or pongs) that never arrived
    pub dropped: u64,

    /// Drops by reason; sums to `dropped`
    pub drops_by_reason: DropBreakdown,
}

impl DeliveryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ping_sent(&mut self) {
        self.pings_sent += 1;
    }

    pub fn record_ping_received(&mut self) {
        self.pings_received += 1;
    }

    pub fn record_pong_received(&mut self) {
        self.pongs_received += 1;
    }

    pub fn record_drop(&mut self, reason: DropReason) {
        self.dropped += 1;
        *self.drops_by_reason.slot(reason) += 1;
    }

    /// Packets put on the network: every ping plus every pong sent in reply.
    pub fn packets_sent(&self) -> u64 {
        self.pings_sent + self.pings_received
    }

    /// Derived reliability ratios.
    pub fn reliability(&self) -> Reliability {
        Reliability::from_counters(self)
    }
}

// =============================================================================
// RELIABILITY
// =============================================================================

/// Reliability ratios in `[0, 1]`; `None` where the denominator is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reliability {
    pub ping: Option<f64>,
    pub pong: Option<f64>,
    pub overall: Option<f64>,
}

impl Reliability {
    pub fn from_counters(counters: &DeliveryCounters) -> Self {
        Self {
            ping: ratio(counters.pings_received, counters.pings_sent),
            pong: ratio(counters.pongs_received, counters.pings_received),
            overall: ratio(counters.dropped, counters.packets_sent()).map(|r| 1.0 - r),
        }
    }
}

/// `num / den`, or `None` when `den` is zero.
pub fn ratio(num: u64, den: u64) -> Option<f64> {
    (den != 0).then(|| num as f64 / den as f64)
}

/// Renders a ratio as a percentage with three decimals, or `n/a`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}%", v * 100.0),
        None => "n/a".to_string(),
    }
}
