//! Health and risk heuristics.
//!
//! Both scores are weighted blends of three signals normalized into [0, 1]: activity
//! (transaction counters), net worth, and DeFi exposure. Results are percentages rounded
//! to one decimal.

/// Activity score at which the activity signal saturates.
pub const ACTIVITY_SATURATION: f64 = 100.0;
/// Net worth (USD) at which the net-worth signal saturates.
pub const NETWORTH_SATURATION_USD: f64 = 10_000.0;
/// DeFi exposure (USD) at which the DeFi signal saturates.
pub const DEFI_SATURATION_USD: f64 = 5_000.0;

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Round to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSignals {
    pub activity: f64,
    pub networth: f64,
    pub defi: f64,
}

impl NormalizedSignals {
    pub fn from_raw(activity_score: u64, total_networth_usd: f64, total_defi_usd: f64) -> Self {
        Self {
            activity: clamp01(activity_score as f64 / ACTIVITY_SATURATION),
            networth: clamp01(total_networth_usd / NETWORTH_SATURATION_USD),
            defi: clamp01(total_defi_usd / DEFI_SATURATION_USD),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SignalWeights {
    pub activity: f64,
    pub networth: f64,
    pub defi: f64,
}

impl SignalWeights {
    pub const HEALTH: Self = Self {
        activity: 0.4,
        networth: 0.4,
        defi: 0.2,
    };

    pub const RISK: Self = Self {
        activity: 0.3,
        networth: 0.5,
        defi: 0.2,
    };
}

/// 0..=100, higher is healthier. Rewards activity, holdings, and DeFi engagement.
pub fn wallet_health_score(signals: NormalizedSignals) -> f64 {
    let w = SignalWeights::HEALTH;
    let raw = w.activity * signals.activity + w.networth * signals.networth + w.defi * signals.defi;
    round1(100.0 * raw).clamp(0.0, 100.0)
}

/// 0..=100, higher is riskier. Each missing signal contributes its full weight.
pub fn risk_score(signals: NormalizedSignals) -> f64 {
    let w = SignalWeights::RISK;
    let raw = w.networth * (1.0 - signals.networth)
        + w.activity * (1.0 - signals.activity)
        + w.defi * (1.0 - signals.defi);
    round1(100.0 * raw).clamp(0.0, 100.0)
}
