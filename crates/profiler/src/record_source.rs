//! Record store adapter: serve a wallet from the local snapshot, else make exactly one
//! remote fetch. Remote failures are logged and reported as "no data".

use anyhow::Result;
use common::moralis::MoralisClient;
use common::types::RecordSnapshot;
use std::borrow::Cow;
use std::time::Instant;

pub trait RemoteRecordSource {
    /// Fetch a one-wallet snapshot. Any sub-query failure fails the whole fetch.
    fn fetch_wallet(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<RecordSnapshot>> + Send;
}

impl RemoteRecordSource for MoralisClient {
    async fn fetch_wallet(&self, address: &str) -> Result<RecordSnapshot> {
        let start = Instant::now();
        let res = self.fetch_wallet_snapshot(address).await;
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        crate::metrics::record_remote_fetch(res.is_ok(), ms);
        res
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrigin {
    Local,
    Remote,
}

impl RecordOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

#[derive(Debug)]
pub struct ResolvedRecords<'a> {
    pub origin: RecordOrigin,
    pub records: Cow<'a, RecordSnapshot>,
}

/// Returns `None` when the wallet is neither local nor fetchable.
pub async fn resolve_records<'a, R: RemoteRecordSource>(
    local: &'a RecordSnapshot,
    remote: &R,
    address: &str,
) -> Option<ResolvedRecords<'a>> {
    if local.contains_wallet(address) {
        return Some(ResolvedRecords {
            origin: RecordOrigin::Local,
            records: Cow::Borrowed(local),
        });
    }

    tracing::info!(wallet = %address, "wallet not in local store, fetching remotely");
    match remote.fetch_wallet(address).await {
        Ok(snapshot) if snapshot.contains_wallet(address) => Some(ResolvedRecords {
            origin: RecordOrigin::Remote,
            records: Cow::Owned(snapshot),
        }),
        Ok(_) => {
            tracing::warn!(wallet = %address, "remote fetch returned no usable rows");
            None
        }
        Err(e) => {
            tracing::warn!(wallet = %address, error = %format!("{e:#}"), "remote fetch failed");
            None
        }
    }
}
