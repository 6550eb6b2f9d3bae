//! Raw per-wallet records, as loaded from the local CSV tables or the data provider.
//!
//! Every numeric cell is optional: absent or unparseable values stay `None` here and are
//! zero-filled by feature extraction.

use serde::{Deserialize, Serialize};

/// Parse a numeric cell that may be blank, `nan`, or carry thousands separators.
pub fn parse_lenient_f64(raw: Option<&str>) -> Option<f64> {
    let cleaned: String = raw?
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Counters arrive as "12", "12.0" or garbage. Negative values are treated as absent.
pub fn parse_lenient_u64(raw: Option<&str>) -> Option<u64> {
    parse_lenient_f64(raw)
        .filter(|v| *v >= 0.0)
        .map(|v| v.trunc() as u64)
}

pub fn parse_lenient_bool(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// One chain's slice of a wallet's net worth. `total_networth_usd` repeats on every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetWorthRow {
    pub wallet: String,
    pub chain: Option<String>,
    pub native_balance: Option<f64>,
    pub native_balance_usd: Option<f64>,
    pub token_balance_usd: Option<f64>,
    pub chain_networth_usd: Option<f64>,
    pub total_networth_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsRow {
    pub wallet: String,
    pub nfts: Option<u64>,
    pub collections: Option<u64>,
    pub transactions_total: Option<u64>,
    pub nft_transfers_total: Option<u64>,
    pub token_transfers_total: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenBalanceRow {
    pub wallet: String,
    pub token_symbol: Option<String>,
    pub usd_value: Option<f64>,
    pub name: Option<String>,
    pub token_address: Option<String>,
    /// Balance in token units.
    pub balance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefiPositionRow {
    pub wallet: String,
    pub protocol_name: Option<String>,
    pub usd_value: Option<f64>,
}

/// Collection metadata. The local table has no wallet column, so `wallet` is only
/// populated for rows that came from the data provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NftCollectionRow {
    pub wallet: Option<String>,
    pub token_address: Option<String>,
    pub contract_type: Option<String>,
    pub name: Option<String>,
    pub verified_collection: Option<bool>,
    pub count: Option<u64>,
}

/// The five record tables, either the whole local store or a single fetched wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSnapshot {
    pub networth: Vec<NetWorthRow>,
    pub tokens: Vec<TokenBalanceRow>,
    pub defi: Vec<DefiPositionRow>,
    pub nfts: Vec<NftCollectionRow>,
    pub stats: Vec<StatsRow>,
}

impl RecordSnapshot {
    /// A wallet is present iff it owns at least one net-worth row.
    pub fn contains_wallet(&self, address: &str) -> bool {
        self.networth.iter().any(|r| r.wallet == address)
    }

    /// First net-worth row for the wallet, in table order.
    pub fn networth_for(&self, address: &str) -> Option<&NetWorthRow> {
        self.networth.iter().find(|r| r.wallet == address)
    }

    pub fn stats_for(&self, address: &str) -> Option<&StatsRow> {
        self.stats.iter().find(|r| r.wallet == address)
    }

    pub fn tokens_for<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a TokenBalanceRow> {
        self.tokens.iter().filter(move |r| r.wallet == address)
    }

    pub fn defi_for<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a DefiPositionRow> {
        self.defi.iter().filter(move |r| r.wallet == address)
    }

    /// Number of distinct wallets with net-worth data.
    pub fn wallet_count(&self) -> usize {
        let mut wallets: Vec<&str> = self.networth.iter().map(|r| r.wallet.as_str()).collect();
        wallets.sort_unstable();
        wallets.dedup();
        wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networth.is_empty()
            && self.tokens.is_empty()
            && self.defi.is_empty()
            && self.nfts.is_empty()
            && self.stats.is_empty()
    }
}

// --- Data provider payloads ---

/// The provider encodes most numbers as decimal strings, some as JSON numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumOrString {
    Num(f64),
    Str(String),
}

impl NumOrString {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(v) => Some(*v).filter(|v| v.is_finite()),
            Self::Str(s) => parse_lenient_f64(Some(s)),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_f64().filter(|v| *v >= 0.0).map(|v| v.trunc() as u64)
    }
}

pub(crate) fn opt_f64(v: Option<&NumOrString>) -> Option<f64> {
    v.and_then(NumOrString::as_f64)
}

pub(crate) fn opt_u64(v: Option<&NumOrString>) -> Option<u64> {
    v.and_then(NumOrString::as_u64)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTokenBalances {
    #[serde(default)]
    pub result: Vec<ApiTokenBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTokenBalance {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub token_address: Option<String>,
    pub balance_formatted: Option<String>,
    pub usd_value: Option<NumOrString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiNetWorth {
    pub total_networth_usd: Option<NumOrString>,
    #[serde(default)]
    pub chains: Vec<ApiChainNetWorth>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChainNetWorth {
    pub chain: Option<String>,
    pub native_balance_formatted: Option<NumOrString>,
    pub native_balance_usd: Option<NumOrString>,
    pub token_balance_usd: Option<NumOrString>,
    pub networth_usd: Option<NumOrString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCounter {
    pub total: Option<NumOrString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiWalletStats {
    pub nfts: Option<NumOrString>,
    pub collections: Option<NumOrString>,
    pub transactions: Option<ApiCounter>,
    pub nft_transfers: Option<ApiCounter>,
    pub token_transfers: Option<ApiCounter>,
}

/// `result` is usually a list but has been observed as a single object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(v) => v,
            Self::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiNftCollections {
    pub result: Option<OneOrMany<ApiNftCollection>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiNftCollection {
    pub token_address: Option<String>,
    pub contract_type: Option<String>,
    pub name: Option<String>,
    pub verified_collection: Option<bool>,
    pub count: Option<NumOrString>,
}
