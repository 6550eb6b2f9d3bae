use serde::Serialize;
use std::fmt;

use crate::wallet_features::WalletFeatures;

pub const WHALE_MIN_NETWORTH_USD: f64 = 1_000_000.0;
pub const LARGE_HOLDER_MIN_NETWORTH_USD: f64 = 100_000.0;
pub const TOKEN_DIVERSIFIED_MIN_RATIO: f64 = 0.7;
pub const TOKEN_EXPLORER_MIN_TOKENS: u32 = 25;
pub const NFT_WHALE_MIN_COLLECTIONS: u64 = 20;
pub const NFT_COLLECTOR_MIN_NFTS: u64 = 10;
pub const NFT_TRADER_MIN_TRANSFERS: u64 = 200;
pub const DEFI_POWER_USER_MIN_PROTOCOLS: u32 = 5;
pub const DEFI_WHALE_MIN_USD: f64 = 100_000.0;
pub const POWER_USER_MIN_TRANSACTIONS: u64 = 100_000;
pub const HIGH_VOLUME_MIN_TOKEN_TRANSFERS: u64 = 100_000;

/// Descriptive label for wallet behavior. A wallet carries one or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaTag {
    Whale,
    LargeHolder,
    TokenDiversified,
    TokenExplorer,
    NftWhale,
    NftCollector,
    NftTrader,
    DefiPowerUser,
    DefiWhale,
    PowerUser,
    HighVolumeTrader,
    RetailUser,
}

impl PersonaTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whale => "whale",
            Self::LargeHolder => "large_holder",
            Self::TokenDiversified => "token_diversified",
            Self::TokenExplorer => "token_explorer",
            Self::NftWhale => "nft_whale",
            Self::NftCollector => "nft_collector",
            Self::NftTrader => "nft_trader",
            Self::DefiPowerUser => "defi_power_user",
            Self::DefiWhale => "defi_whale",
            Self::PowerUser => "power_user",
            Self::HighVolumeTrader => "high_volume_trader",
            Self::RetailUser => "retail_user",
        }
    }
}

impl fmt::Display for PersonaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the classification table.
pub struct TagRule {
    pub tag: PersonaTag,
    pub applies: fn(&WalletFeatures) -> bool,
}

pub fn is_whale(f: &WalletFeatures) -> bool {
    f.total_networth > WHALE_MIN_NETWORTH_USD
}

/// Mutually exclusive with `whale`.
pub fn is_large_holder(f: &WalletFeatures) -> bool {
    !is_whale(f) && f.total_networth > LARGE_HOLDER_MIN_NETWORTH_USD
}

pub fn is_token_diversified(f: &WalletFeatures) -> bool {
    f.token_ratio > TOKEN_DIVERSIFIED_MIN_RATIO
}

pub fn is_token_explorer(f: &WalletFeatures) -> bool {
    f.token_count > TOKEN_EXPLORER_MIN_TOKENS
}

pub fn is_nft_whale(f: &WalletFeatures) -> bool {
    f.unique_nft_collections > NFT_WHALE_MIN_COLLECTIONS
}

/// Mutually exclusive with `nft_whale`.
pub fn is_nft_collector(f: &WalletFeatures) -> bool {
    !is_nft_whale(f) && f.nft_count > NFT_COLLECTOR_MIN_NFTS
}

pub fn is_nft_trader(f: &WalletFeatures) -> bool {
    f.nft_transfers_total > NFT_TRADER_MIN_TRANSFERS
}

pub fn is_defi_power_user(f: &WalletFeatures) -> bool {
    f.defi_protocols > DEFI_POWER_USER_MIN_PROTOCOLS
}

pub fn is_defi_whale(f: &WalletFeatures) -> bool {
    f.total_defi_usd > DEFI_WHALE_MIN_USD
}

pub fn is_power_user(f: &WalletFeatures) -> bool {
    f.transactions_total > POWER_USER_MIN_TRANSACTIONS
}

pub fn is_high_volume_trader(f: &WalletFeatures) -> bool {
    f.token_transfers_total > HIGH_VOLUME_MIN_TOKEN_TRANSFERS
}

/// Evaluated top to bottom; emission order follows table order.
pub const TAG_RULES: &[TagRule] = &[
    TagRule { tag: PersonaTag::Whale, applies: is_whale },
    TagRule { tag: PersonaTag::LargeHolder, applies: is_large_holder },
    TagRule { tag: PersonaTag::TokenDiversified, applies: is_token_diversified },
    TagRule { tag: PersonaTag::TokenExplorer, applies: is_token_explorer },
    TagRule { tag: PersonaTag::NftWhale, applies: is_nft_whale },
    TagRule { tag: PersonaTag::NftCollector, applies: is_nft_collector },
    TagRule { tag: PersonaTag::NftTrader, applies: is_nft_trader },
    TagRule { tag: PersonaTag::DefiPowerUser, applies: is_defi_power_user },
    TagRule { tag: PersonaTag::DefiWhale, applies: is_defi_whale },
    TagRule { tag: PersonaTag::PowerUser, applies: is_power_user },
    TagRule { tag: PersonaTag::HighVolumeTrader, applies: is_high_volume_trader },
];

/// Assign persona tags. Never empty: falls back to `retail_user`.
pub fn classify_wallet(features: &WalletFeatures) -> Vec<PersonaTag> {
    let mut tags: Vec<PersonaTag> = TAG_RULES
        .iter()
        .filter(|rule| (rule.applies)(features))
        .map(|rule| rule.tag)
        .collect();
    if tags.is_empty() {
        tags.push(PersonaTag::RetailUser);
    }
    tags
}
