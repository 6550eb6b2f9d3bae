//! Process-wide profiling context: the local record snapshot, the remote source and the
//! narrative generator, built once at startup and shared read-only.

use anyhow::Context as _;
use common::config::Config;
use common::moralis::MoralisClient;
use common::store::CsvRecordStore;
use common::types::RecordSnapshot;

use crate::error::{ProfileError, Result};
use crate::narrative::{Narrator, TemplateNarrator};
use crate::profile::FeatureRecord;
use crate::record_source::{resolve_records, RemoteRecordSource};
use crate::wallet_features::extract_wallet_features;

pub struct ProfilerContext<R = MoralisClient> {
    snapshot: RecordSnapshot,
    remote: R,
    narrator: Narrator,
}

impl ProfilerContext<MoralisClient> {
    /// Load the CSV tables and build the remote client and narrator from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = CsvRecordStore::new(&config.data.dir);
        let snapshot = store
            .load()
            .with_context(|| format!("load records from {}", config.data.dir))?;
        let remote = MoralisClient::from_config(&config.moralis)?;
        if !remote.has_api_key() {
            tracing::warn!(
                env = %config.moralis.api_key_env,
                "moralis api key not set, remote fallback disabled"
            );
        }
        let narrator = Narrator::from_config(&config.narrative)?;
        tracing::info!(
            wallets = snapshot.wallet_count(),
            narrator = narrator.kind(),
            "profiler context ready"
        );
        Ok(Self::new(snapshot, remote, narrator))
    }
}

/// Trimmed address, or `InvalidAddress` when blank.
pub fn normalize_address(address: &str) -> Result<&str> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::InvalidAddress);
    }
    Ok(trimmed)
}

impl<R: RemoteRecordSource> ProfilerContext<R> {
    pub fn new(snapshot: RecordSnapshot, remote: R, narrator: Narrator) -> Self {
        Self {
            snapshot,
            remote,
            narrator,
        }
    }

    pub fn snapshot(&self) -> &RecordSnapshot {
        &self.snapshot
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    /// Resolve records (local first, else one remote fetch), extract features, classify
    /// and recommend. The narrative is not attached.
    pub async fn profile(&self, address: &str) -> Result<FeatureRecord> {
        let address = normalize_address(address)?;
        let Some(resolved) = resolve_records(&self.snapshot, &self.remote, address).await else {
            crate::metrics::record_not_found();
            return Err(ProfileError::NotFound {
                address: address.to_string(),
            });
        };

        let features = extract_wallet_features(address, &resolved.records);
        let record = FeatureRecord::new(features);
        crate::metrics::record_profiled(resolved.origin, &record.classifications);
        tracing::info!(
            wallet = %address,
            source = resolved.origin.as_str(),
            tags = ?record.classifications,
            health = record.features.wallet_health_score,
            risk = record.features.risk_score,
            "wallet profiled"
        );
        Ok(record)
    }

    /// Run the configured generator. A generator failure falls back to the template
    /// narrative so the computed record is never lost.
    pub async fn narrate(&self, record: &FeatureRecord, detailed: bool) -> String {
        match self.narrator.generate(record, detailed).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    wallet = %record.address(),
                    error = %format!("{e:#}"),
                    "narrative generation failed, using template"
                );
                crate::metrics::record_narrative_fallback();
                TemplateNarrator.generate(record, detailed)
            }
        }
    }

    /// Profile and attach the narrative in one step.
    pub async fn profile_with_narrative(
        &self,
        address: &str,
        detailed: bool,
    ) -> Result<FeatureRecord> {
        let record = self.profile(address).await?;
        let narrative = self.narrate(&record, detailed).await;
        Ok(record.with_narrative(narrative))
    }

    /// Remote fetch only; the local snapshot is not consulted.
    pub async fn fetch_remote(&self, address: &str) -> Result<RecordSnapshot> {
        let address = normalize_address(address)?;
        self.remote
            .fetch_wallet(address)
            .await
            .map_err(|e| ProfileError::Upstream {
                address: address.to_string(),
                reason: format!("{e:#}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona_classification::PersonaTag;
    use crate::record_source::tests::{one_wallet, StubRemote};
    use std::sync::atomic::Ordering;

    fn context(local: RecordSnapshot, remote: StubRemote) -> ProfilerContext<StubRemote> {
        ProfilerContext::new(local, remote, Narrator::Template(TemplateNarrator))
    }

    #[tokio::test]
    async fn test_profile_local_wallet() {
        let ctx = context(one_wallet("0xwhale", 1_200_000.0), StubRemote::default());
        let record = ctx.profile("  0xwhale ").await.unwrap();
        assert_eq!(record.address(), "0xwhale");
        assert!(record.has_tag(PersonaTag::Whale));
        assert_eq!(ctx.remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_profile_blank_address() {
        let ctx = context(RecordSnapshot::default(), StubRemote::default());
        assert!(matches!(
            ctx.profile("   ").await,
            Err(ProfileError::InvalidAddress)
        ));
        assert_eq!(ctx.remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_profile_not_found_after_one_fetch() {
        let ctx = context(RecordSnapshot::default(), StubRemote::default());
        let err = ctx.profile("0xnobody").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no data found for wallet 0xnobody");
        assert_eq!(ctx.remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_profile_remote_fallback() {
        let remote = StubRemote {
            snapshot: Some(one_wallet("0xremote", 150_000.0)),
            ..Default::default()
        };
        let ctx = context(RecordSnapshot::default(), remote);
        let record = ctx.profile("0xremote").await.unwrap();
        assert_eq!(record.classifications, vec![PersonaTag::LargeHolder]);
        assert_eq!(ctx.remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_profile_with_narrative() {
        let ctx = context(one_wallet("0xabcdef0123", 10.0), StubRemote::default());
        let record = ctx.profile_with_narrative("0xabcdef0123", true).await.unwrap();
        let text = record.persona_profile.unwrap();
        assert!(text.contains("## 1. Crypto Identity"));
        assert!(text.contains("retail user"));
    }

    #[tokio::test]
    async fn test_narrate_falls_back_on_chat_failure() {
        let cfg = common::config::Narrative {
            backend: common::config::NarrativeBackend::Chat,
            endpoint: "http://127.0.0.1:9/v1".to_string(),
            model: "test".to_string(),
            api_key_env: "PROFILER_TEST_UNSET_KEY".to_string(),
            max_tokens_detailed: 800,
            max_tokens_brief: 300,
            temperature: 0.7,
            top_p: 0.9,
        };
        let ctx = ProfilerContext::new(
            one_wallet("0xabcdef0123", 10.0),
            StubRemote::default(),
            Narrator::from_config(&cfg).unwrap(),
        );
        let record = ctx.profile("0xabcdef0123").await.unwrap();
        let text = ctx.narrate(&record, false).await;
        assert_eq!(text, TemplateNarrator.generate(&record, false));
    }

    #[tokio::test]
    async fn test_fetch_remote_upstream_error() {
        let ctx = context(one_wallet("0xlocal", 1.0), StubRemote::default());
        let err = ctx.fetch_remote("0xlocal").await.unwrap_err();
        assert!(matches!(err, ProfileError::Upstream { .. }));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_remote_returns_snapshot() {
        let remote = StubRemote {
            snapshot: Some(one_wallet("0xremote", 5.0)),
            ..Default::default()
        };
        let ctx = context(RecordSnapshot::default(), remote);
        let snapshot = ctx.fetch_remote("0xremote").await.unwrap();
        assert!(snapshot.contains_wallet("0xremote"));
    }
}
