//! CSV-backed local record store.
//!
//! Five tables live side by side in one directory. A missing file is an empty table;
//! rows that fail to parse are skipped with a warning.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::types::{
    parse_lenient_bool, parse_lenient_f64, parse_lenient_u64, DefiPositionRow, NetWorthRow,
    NftCollectionRow, RecordSnapshot, StatsRow, TokenBalanceRow,
};

pub const NETWORTH_FILE: &str = "wallet_networth_all_chains.csv";
pub const TOKENS_FILE: &str = "token_balances.csv";
pub const DEFI_FILE: &str = "defi_positions.csv";
pub const NFTS_FILE: &str = "nft_collections_cleaned.csv";
pub const STATS_FILE: &str = "wallet_stats.csv";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvNetWorth {
    wallet: Option<String>,
    chain: Option<String>,
    native_balance: Option<String>,
    native_balance_usd: Option<String>,
    token_balance_usd: Option<String>,
    chain_networth_usd: Option<String>,
    total_networth_usd: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvToken {
    wallet: Option<String>,
    token_symbol: Option<String>,
    usd_value: Option<String>,
    name: Option<String>,
    token_address: Option<String>,
    balance: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvDefi {
    wallet: Option<String>,
    protocol_name: Option<String>,
    usd_value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvNft {
    token_address: Option<String>,
    contract_type: Option<String>,
    name: Option<String>,
    verified_collection: Option<String>,
    count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvStats {
    wallet: Option<String>,
    nfts: Option<String>,
    collections: Option<String>,
    transactions_total: Option<String>,
    nft_transfers_total: Option<String>,
    token_transfers_total: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub struct CsvRecordStore {
    dir: PathBuf,
}

impl CsvRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read all five tables into memory.
    pub fn load(&self) -> Result<RecordSnapshot> {
        let networth = self
            .read_table::<CsvNetWorth>(NETWORTH_FILE)?
            .into_iter()
            .filter_map(|r| {
                Some(NetWorthRow {
                    wallet: non_blank(r.wallet)?,
                    chain: non_blank(r.chain),
                    native_balance: parse_lenient_f64(r.native_balance.as_deref()),
                    native_balance_usd: parse_lenient_f64(r.native_balance_usd.as_deref()),
                    token_balance_usd: parse_lenient_f64(r.token_balance_usd.as_deref()),
                    chain_networth_usd: parse_lenient_f64(r.chain_networth_usd.as_deref()),
                    total_networth_usd: parse_lenient_f64(r.total_networth_usd.as_deref()),
                })
            })
            .collect();

        let tokens = self
            .read_table::<CsvToken>(TOKENS_FILE)?
            .into_iter()
            .filter_map(|r| {
                Some(TokenBalanceRow {
                    wallet: non_blank(r.wallet)?,
                    token_symbol: non_blank(r.token_symbol),
                    usd_value: parse_lenient_f64(r.usd_value.as_deref()),
                    name: non_blank(r.name),
                    token_address: non_blank(r.token_address),
                    balance: parse_lenient_f64(r.balance.as_deref()),
                })
            })
            .collect();

        let defi = self
            .read_table::<CsvDefi>(DEFI_FILE)?
            .into_iter()
            .filter_map(|r| {
                Some(DefiPositionRow {
                    wallet: non_blank(r.wallet)?,
                    protocol_name: non_blank(r.protocol_name),
                    usd_value: parse_lenient_f64(r.usd_value.as_deref()),
                })
            })
            .collect();

        let nfts = self
            .read_table::<CsvNft>(NFTS_FILE)?
            .into_iter()
            .map(|r| NftCollectionRow {
                wallet: None,
                token_address: non_blank(r.token_address),
                contract_type: non_blank(r.contract_type),
                name: non_blank(r.name),
                verified_collection: parse_lenient_bool(r.verified_collection.as_deref()),
                count: parse_lenient_u64(r.count.as_deref()),
            })
            .collect();

        let stats = self
            .read_table::<CsvStats>(STATS_FILE)?
            .into_iter()
            .filter_map(|r| {
                Some(StatsRow {
                    wallet: non_blank(r.wallet)?,
                    nfts: parse_lenient_u64(r.nfts.as_deref()),
                    collections: parse_lenient_u64(r.collections.as_deref()),
                    transactions_total: parse_lenient_u64(r.transactions_total.as_deref()),
                    nft_transfers_total: parse_lenient_u64(r.nft_transfers_total.as_deref()),
                    token_transfers_total: parse_lenient_u64(r.token_transfers_total.as_deref()),
                })
            })
            .collect();

        let snapshot = RecordSnapshot {
            networth,
            tokens,
            defi,
            nfts,
            stats,
        };
        tracing::info!(
            dir = %self.dir.display(),
            networth_rows = snapshot.networth.len(),
            token_rows = snapshot.tokens.len(),
            defi_rows = snapshot.defi.len(),
            nft_rows = snapshot.nfts.len(),
            stats_rows = snapshot.stats.len(),
            wallets = snapshot.wallet_count(),
            "local record store loaded"
        );
        Ok(snapshot)
    }

    fn read_table<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            tracing::warn!(path = %path.display(), "table missing, treating as empty");
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .with_context(|| format!("open {}", path.display()))?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in reader.deserialize::<T>() {
            match record {
                Ok(row) => rows.push(row),
                Err(e) => {
                    skipped += 1;
                    tracing::debug!(path = %path.display(), error = %e, "skipping malformed row");
                }
            }
        }
        if skipped > 0 {
            tracing::warn!(path = %path.display(), skipped, "skipped malformed rows");
        }
        Ok(rows)
    }
}
