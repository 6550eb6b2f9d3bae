use common::types::RecordSnapshot;
use serde::Serialize;
use std::collections::HashSet;

use crate::wallet_scoring::{risk_score, wallet_health_score, NormalizedSignals};

pub const UNKNOWN_CHAIN: &str = "unknown";
pub const HANDLE_PREFIX: &str = "CryptoWolf";
pub const TOP_TOKENS_LIMIT: usize = 3;

/// Flat per-wallet features. Every field has a zero/empty default when its source
/// category is missing, so nothing downstream deals with absent values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletFeatures {
    pub address: String,

    pub total_networth: f64,
    pub native_balance: f64,
    pub token_balance_usd: f64,
    pub chain: String,
    /// token_balance_usd / max(total_networth, 1), clamped to [0, 1].
    pub token_ratio: f64,

    pub transactions_total: u64,
    pub nft_transfers_total: u64,
    pub token_transfers_total: u64,
    pub nft_count: u64,
    pub nft_collections: u64,

    pub token_count: u32,
    pub top_tokens: Vec<String>,
    pub defi_protocols: u32,
    pub total_defi_usd: f64,
    /// Taken from the stats table: collection detail rows are not wallet-keyed locally.
    pub unique_nft_collections: u64,

    pub activity_score: u64,
    pub wallet_health_score: f64,
    pub risk_score: f64,

    pub social_handle: String,
}

/// Display handle: fixed prefix plus the first 6 and last 4 characters of the address.
pub fn generate_social_handle(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let prefix: String = chars.iter().take(6).collect();
    let suffix: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{HANDLE_PREFIX}_{prefix}_{suffix}")
}

/// Top symbols by descending USD value. `sort_by` is stable, so ties keep row order;
/// rows without a value sort last.
pub fn top_tokens_by_value<'a, I>(rows: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, Option<f64>)>,
{
    let mut rows: Vec<(&str, f64)> = rows
        .into_iter()
        .map(|(symbol, usd)| (symbol, usd.unwrap_or(f64::NEG_INFINITY)))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    rows.into_iter()
        .take(limit)
        .map(|(symbol, _)| symbol.to_string())
        .collect()
}

fn count_distinct<'a>(values: impl Iterator<Item = &'a str>) -> u32 {
    let distinct: HashSet<&str> = values.collect();
    u32::try_from(distinct.len()).unwrap_or(u32::MAX)
}

/// Join the five record categories for one wallet into a feature vector.
///
/// Pure over `records`; a wallet with no rows at all yields an all-zero vector.
pub fn extract_wallet_features(address: &str, records: &RecordSnapshot) -> WalletFeatures {
    let (total_networth, native_balance, token_balance_usd, chain) =
        match records.networth_for(address) {
            Some(row) => (
                row.total_networth_usd.unwrap_or(0.0),
                row.native_balance.unwrap_or(0.0),
                row.token_balance_usd.unwrap_or(0.0),
                row.chain.clone().unwrap_or_else(|| UNKNOWN_CHAIN.to_string()),
            ),
            None => (0.0, 0.0, 0.0, UNKNOWN_CHAIN.to_string()),
        };
    let token_ratio = (token_balance_usd / total_networth.max(1.0)).clamp(0.0, 1.0);

    let stats = records.stats_for(address);
    let counter = |pick: fn(&common::types::StatsRow) -> Option<u64>| {
        stats.and_then(pick).unwrap_or(0)
    };
    let transactions_total = counter(|s| s.transactions_total);
    let nft_transfers_total = counter(|s| s.nft_transfers_total);
    let token_transfers_total = counter(|s| s.token_transfers_total);
    let nft_count = counter(|s| s.nfts);
    let nft_collections = counter(|s| s.collections);

    let symbols: Vec<(&str, Option<f64>)> = records
        .tokens_for(address)
        .filter_map(|t| Some((t.token_symbol.as_deref()?, t.usd_value)))
        .collect();
    let token_count = count_distinct(symbols.iter().map(|(s, _)| *s));
    let top_tokens = top_tokens_by_value(symbols.iter().copied(), TOP_TOKENS_LIMIT);

    let defi_protocols = count_distinct(
        records
            .defi_for(address)
            .filter_map(|d| d.protocol_name.as_deref()),
    );
    let total_defi_usd: f64 = records
        .defi_for(address)
        .map(|d| d.usd_value.unwrap_or(0.0))
        .sum();

    let activity_score = transactions_total
        .saturating_add(nft_transfers_total)
        .saturating_add(token_transfers_total);
    let signals = NormalizedSignals::from_raw(activity_score, total_networth, total_defi_usd);

    WalletFeatures {
        address: address.to_string(),
        total_networth,
        native_balance,
        token_balance_usd,
        chain,
        token_ratio,
        transactions_total,
        nft_transfers_total,
        token_transfers_total,
        nft_count,
        nft_collections,
        token_count,
        top_tokens,
        defi_protocols,
        total_defi_usd,
        unique_nft_collections: nft_collections,
        activity_score,
        wallet_health_score: wallet_health_score(signals),
        risk_score: risk_score(signals),
        social_handle: generate_social_handle(address),
    }
}
