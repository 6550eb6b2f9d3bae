use serde::{Serialize, Serializer};
use std::fmt;

use crate::persona_classification::PersonaTag;
use crate::wallet_features::WalletFeatures;

pub const YIELD_MIN_HEALTH: f64 = 70.0;
pub const STAKING_MAX_RISK: f64 = 50.0;
pub const DIVERSIFY_MIN_TOKENS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    YieldFarming,
    Staking,
    NftDrops,
    Layer2Diversification,
    StarterDapps,
}

impl Recommendation {
    pub fn text(&self) -> &'static str {
        match self {
            Self::YieldFarming => "Explore DeFi yield farming protocols",
            Self::Staking => "Consider long-term staking opportunities",
            Self::NftDrops => "Check out exclusive NFT drops on OpenSea",
            Self::Layer2Diversification => "Diversify portfolio with Layer 2 tokens",
            Self::StarterDapps => "Start exploring popular dApps like Uniswap and Aave",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text())
    }
}

/// Suggested next steps, in fixed rule order. Always returns at least one entry.
pub fn generate_recommendations(
    features: &WalletFeatures,
    tags: &[PersonaTag],
) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if features.wallet_health_score > YIELD_MIN_HEALTH {
        recs.push(Recommendation::YieldFarming);
    }
    if features.risk_score < STAKING_MAX_RISK {
        recs.push(Recommendation::Staking);
    }
    if tags.contains(&PersonaTag::NftWhale) {
        recs.push(Recommendation::NftDrops);
    }
    if features.token_count > DIVERSIFY_MIN_TOKENS {
        recs.push(Recommendation::Layer2Diversification);
    }
    if recs.is_empty() {
        recs.push(Recommendation::StarterDapps);
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet_features::tests::blank_features;

    #[test]
    fn test_fallback_when_nothing_fires() {
        let mut f = blank_features("0xr");
        f.wallet_health_score = 70.0;
        f.risk_score = 50.0;
        f.token_count = 20;
        let recs = generate_recommendations(&f, &[PersonaTag::RetailUser]);
        assert_eq!(recs, vec![Recommendation::StarterDapps]);
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let mut f = blank_features("0xr");
        f.wallet_health_score = 90.0;
        f.risk_score = 10.0;
        f.token_count = 30;
        let recs = generate_recommendations(&f, &[PersonaTag::Whale, PersonaTag::NftWhale]);
        assert_eq!(
            recs,
            vec![
                Recommendation::YieldFarming,
                Recommendation::Staking,
                Recommendation::NftDrops,
                Recommendation::Layer2Diversification,
            ]
        );
    }

    #[test]
    fn test_nft_collector_does_not_get_drops() {
        let f = blank_features("0xr");
        let recs = generate_recommendations(&f, &[PersonaTag::NftCollector]);
        assert!(!recs.contains(&Recommendation::NftDrops));
    }

    #[test]
    fn test_serializes_as_text() {
        let json = serde_json::to_string(&[Recommendation::Staking]).unwrap();
        assert_eq!(json, r#"["Consider long-term staking opportunities"]"#);
    }
}
