//! Request and response bodies for the JSON API. No profiling logic here.

use common::types::RecordSnapshot;
use profiler::persona_classification::PersonaTag;
use profiler::recommendations::Recommendation;
use profiler::wallet_features::WalletFeatures;
use serde::{Deserialize, Serialize};

fn default_detailed() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct WalletRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default = "default_detailed")]
    pub detailed: bool,
}

#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub data_loaded: bool,
    pub wallets_indexed: usize,
    pub narrator: &'static str,
    /// True when a generator model backs the narrative.
    pub model_loaded: bool,
    pub uptime_secs: u64,
}

/// Summary block of the analyze response.
#[derive(Debug, Serialize)]
pub struct AnalyzeStats {
    pub total_networth: f64,
    pub native_balance: f64,
    pub token_balance_usd: f64,
    pub chain: String,
    pub wallet_health_score: f64,
    pub risk_score: f64,
    pub activity_score: u64,
}

impl From<&WalletFeatures> for AnalyzeStats {
    fn from(f: &WalletFeatures) -> Self {
        Self {
            total_networth: f.total_networth,
            native_balance: f.native_balance,
            token_balance_usd: f.token_balance_usd,
            chain: f.chain.clone(),
            wallet_health_score: f.wallet_health_score,
            risk_score: f.risk_score,
            activity_score: f.activity_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub wallet_address: String,
    pub persona: String,
    pub classifications: Vec<PersonaTag>,
    pub recommendations: Vec<Recommendation>,
    pub stats: AnalyzeStats,
}

/// Full stats block. `nft_collections` carries the distinct-collection count;
/// `token_ratio` and `social_handle` ride along with the base keys.
#[derive(Debug, Serialize)]
pub struct DetailedStats {
    pub total_networth: f64,
    pub native_balance: f64,
    pub token_balance_usd: f64,
    pub chain: String,
    pub token_count: u32,
    pub top_tokens: Vec<String>,
    pub defi_protocols: u32,
    pub total_defi_usd: f64,
    pub nft_count: u64,
    pub nft_collections: u64,
    pub transactions_total: u64,
    pub wallet_health_score: f64,
    pub risk_score: f64,
    pub activity_score: u64,
    pub token_ratio: f64,
    pub social_handle: String,
}

impl From<&WalletFeatures> for DetailedStats {
    fn from(f: &WalletFeatures) -> Self {
        Self {
            total_networth: f.total_networth,
            native_balance: f.native_balance,
            token_balance_usd: f.token_balance_usd,
            chain: f.chain.clone(),
            token_count: f.token_count,
            top_tokens: f.top_tokens.clone(),
            defi_protocols: f.defi_protocols,
            total_defi_usd: f.total_defi_usd,
            nft_count: f.nft_count,
            nft_collections: f.unique_nft_collections,
            transactions_total: f.transactions_total,
            wallet_health_score: f.wallet_health_score,
            risk_score: f.risk_score,
            activity_score: f.activity_score,
            token_ratio: f.token_ratio,
            social_handle: f.social_handle.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub wallet_address: String,
    pub stats: DetailedStats,
    pub classifications: Vec<PersonaTag>,
}

#[derive(Debug, Serialize)]
pub struct FetchStats {
    pub total_networth: f64,
    pub native_balance: f64,
    pub token_balance_usd: f64,
    pub chain: String,
}

#[derive(Debug, Serialize)]
pub struct FetchedToken {
    pub symbol: String,
    pub name: Option<String>,
    pub token_address: Option<String>,
    pub balance: Option<f64>,
    pub usd_value: f64,
}

impl FetchedToken {
    pub fn from_snapshot(snapshot: &RecordSnapshot, address: &str) -> Vec<Self> {
        snapshot
            .tokens_for(address)
            .map(|t| Self {
                symbol: t.token_symbol.clone().unwrap_or_default(),
                name: t.name.clone(),
                token_address: t.token_address.clone(),
                balance: t.balance,
                usd_value: t.usd_value.unwrap_or(0.0),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub wallet_address: String,
    pub stats: FetchStats,
    pub tokens: Vec<FetchedToken>,
    pub classifications: Vec<PersonaTag>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}
