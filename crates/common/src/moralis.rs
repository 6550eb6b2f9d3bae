use crate::config;
use crate::types::{
    opt_f64, opt_u64, parse_lenient_f64, ApiNetWorth, ApiNftCollections, ApiTokenBalances,
    ApiWalletStats, NetWorthRow, NftCollectionRow, OneOrMany, RecordSnapshot, StatsRow,
    TokenBalanceRow,
};
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the Moralis Web3 Data API. Only the four per-wallet queries the profiler needs.
pub struct MoralisClient {
    http: reqwest::Client,
    api_url: String,
    chain: String,
    api_key: Option<String>,
}

impl MoralisClient {
    pub fn new(
        api_url: &str,
        chain: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build moralis http client")?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            chain: chain.to_string(),
            api_key,
        })
    }

    pub fn from_config(cfg: &config::Moralis) -> Result<Self> {
        Self::new(
            &cfg.api_url,
            &cfg.chain,
            cfg.api_key(),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_url).context("moralis api_url must be absolute")?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("moralis api_url cannot be a base"))?
            .extend(segments);
        Ok(url)
    }

    pub fn tokens_url(&self, address: &str) -> Result<Url> {
        let mut url = self.endpoint(&["wallets", address, "tokens"])?;
        url.query_pairs_mut().append_pair("chain", &self.chain);
        Ok(url)
    }

    pub fn networth_url(&self, address: &str) -> Result<Url> {
        let mut url = self.endpoint(&["wallets", address, "net-worth"])?;
        url.query_pairs_mut()
            .append_pair("exclude_spam", "true")
            .append_pair("exclude_unverified_contracts", "true")
            .append_pair("max_token_inactivity", "1")
            .append_pair("min_pair_side_liquidity_usd", "1000");
        Ok(url)
    }

    pub fn stats_url(&self, address: &str) -> Result<Url> {
        let mut url = self.endpoint(&["wallets", address, "stats"])?;
        url.query_pairs_mut().append_pair("chain", &self.chain);
        Ok(url)
    }

    pub fn nft_collections_url(&self, address: &str) -> Result<Url> {
        let mut url = self.endpoint(&[address, "nft", "collections"])?;
        url.query_pairs_mut().append_pair("chain", &self.chain);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let Some(key) = &self.api_key else {
            return Err(anyhow!("moralis api key not configured"));
        };
        let resp = self
            .http
            .get(url.clone())
            .header("X-API-Key", key)
            .header("accept", "application/json")
            .send()
            .await
            .with_context(|| format!("GET {}", url.path()))?
            .error_for_status()?;
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).with_context(|| format!("decode {}", url.path()))
    }

    pub async fn fetch_token_balances(&self, address: &str) -> Result<ApiTokenBalances> {
        self.get_json(self.tokens_url(address)?).await
    }

    pub async fn fetch_net_worth(&self, address: &str) -> Result<ApiNetWorth> {
        self.get_json(self.networth_url(address)?).await
    }

    pub async fn fetch_wallet_stats(&self, address: &str) -> Result<ApiWalletStats> {
        self.get_json(self.stats_url(address)?).await
    }

    pub async fn fetch_nft_collections(&self, address: &str) -> Result<ApiNftCollections> {
        self.get_json(self.nft_collections_url(address)?).await
    }

    /// Run all four queries; any single failure fails the whole fetch.
    pub async fn fetch_wallet_snapshot(&self, address: &str) -> Result<RecordSnapshot> {
        let (tokens, networth, stats, nfts) = tokio::try_join!(
            self.fetch_token_balances(address),
            self.fetch_net_worth(address),
            self.fetch_wallet_stats(address),
            self.fetch_nft_collections(address),
        )?;
        Ok(snapshot_from_api(
            address,
            &self.chain,
            tokens,
            networth,
            &stats,
            nfts,
        ))
    }
}

/// Flatten the provider payloads into a one-wallet snapshot. DeFi positions are not
/// fetched remotely, so that table stays empty.
pub fn snapshot_from_api(
    address: &str,
    chain: &str,
    tokens: ApiTokenBalances,
    networth: ApiNetWorth,
    stats: &ApiWalletStats,
    nfts: ApiNftCollections,
) -> RecordSnapshot {
    let total = opt_f64(networth.total_networth_usd.as_ref());

    let mut networth_rows: Vec<NetWorthRow> = networth
        .chains
        .into_iter()
        .map(|c| NetWorthRow {
            wallet: address.to_string(),
            chain: c.chain,
            native_balance: opt_f64(c.native_balance_formatted.as_ref()),
            native_balance_usd: opt_f64(c.native_balance_usd.as_ref()),
            token_balance_usd: opt_f64(c.token_balance_usd.as_ref()),
            chain_networth_usd: opt_f64(c.networth_usd.as_ref()),
            total_networth_usd: total,
        })
        .collect();
    if networth_rows.is_empty() {
        networth_rows.push(NetWorthRow {
            wallet: address.to_string(),
            chain: Some(chain.to_string()),
            total_networth_usd: total,
            ..Default::default()
        });
    }

    let token_rows = tokens
        .result
        .into_iter()
        .map(|t| TokenBalanceRow {
            wallet: address.to_string(),
            token_symbol: t.symbol.filter(|s| !s.trim().is_empty()),
            usd_value: opt_f64(t.usd_value.as_ref()),
            name: t.name,
            token_address: t.token_address,
            balance: parse_lenient_f64(t.balance_formatted.as_deref()),
        })
        .collect();

    let counter = |c: Option<&crate::types::ApiCounter>| opt_u64(c.and_then(|c| c.total.as_ref()));
    let stats_row = StatsRow {
        wallet: address.to_string(),
        nfts: opt_u64(stats.nfts.as_ref()),
        collections: opt_u64(stats.collections.as_ref()),
        transactions_total: counter(stats.transactions.as_ref()),
        nft_transfers_total: counter(stats.nft_transfers.as_ref()),
        token_transfers_total: counter(stats.token_transfers.as_ref()),
    };

    let nft_rows = nfts
        .result
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(|n| NftCollectionRow {
            wallet: Some(address.to_string()),
            token_address: n.token_address,
            contract_type: n.contract_type,
            name: n.name,
            verified_collection: n.verified_collection,
            count: opt_u64(n.count.as_ref()),
        })
        .collect();

    RecordSnapshot {
        networth: networth_rows,
        tokens: token_rows,
        defi: Vec::new(),
        nfts: nft_rows,
        stats: vec![stats_row],
    }
}
