//! Narrative persona text.
//!
//! `Template` is deterministic and always available. `Chat` sends a prompt built from the
//! feature record to an OpenAI-compatible chat-completions endpoint.

use anyhow::{anyhow, Context, Result};
use common::config::{self, NarrativeBackend};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

use crate::format::{group_thousands, short_address, usd};
use crate::persona_classification::PersonaTag;
use crate::profile::FeatureRecord;

pub enum Narrator {
    Template(TemplateNarrator),
    Chat(ChatNarrator),
}

impl Narrator {
    pub fn from_config(cfg: &config::Narrative) -> Result<Self> {
        Ok(match cfg.backend {
            NarrativeBackend::Template => Self::Template(TemplateNarrator),
            NarrativeBackend::Chat => Self::Chat(ChatNarrator::from_config(cfg)?),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Template(_) => NarrativeBackend::Template.as_str(),
            Self::Chat(_) => NarrativeBackend::Chat.as_str(),
        }
    }

    /// Whether a generator model sits behind this narrator.
    pub fn uses_model(&self) -> bool {
        matches!(self, Self::Chat(_))
    }

    pub async fn generate(&self, record: &FeatureRecord, detailed: bool) -> Result<String> {
        match self {
            Self::Template(t) => Ok(t.generate(record, detailed)),
            Self::Chat(c) => c.generate(record, detailed).await,
        }
    }
}

// --- Template ---

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

fn crypto_identity(record: &FeatureRecord) -> String {
    let mut parts = Vec::new();
    if record.has_tag(PersonaTag::Whale) {
        parts.push("whale");
    } else if record.has_tag(PersonaTag::LargeHolder) {
        parts.push("large holder");
    } else {
        parts.push("retail user");
    }
    if record.has_tag(PersonaTag::TokenExplorer) {
        parts.push("token explorer");
    }
    if record.has_tag(PersonaTag::NftWhale) {
        parts.push("NFT whale");
    } else if record.has_tag(PersonaTag::NftCollector) {
        parts.push("NFT collector");
    }
    if record.has_tag(PersonaTag::DefiPowerUser) {
        parts.push("DeFi power user");
    }
    parts.join(", ")
}

fn trading_style(activity_score: u64) -> &'static str {
    if activity_score > 500 {
        "an active trader with frequent transactions and portfolio adjustments"
    } else if activity_score > 100 {
        "a moderately active investor balancing exploration and holding"
    } else {
        "a long-term investor with a low trading frequency"
    }
}

fn risk_profile(risk_score: f64) -> &'static str {
    if risk_score < 30.0 {
        "low risk tolerance, preferring stable and secure investments"
    } else if risk_score < 70.0 {
        "moderate risk appetite, open to some experimental opportunities"
    } else {
        "high risk tolerance, often engaging in speculative or high-volatility assets"
    }
}

impl TemplateNarrator {
    pub fn generate(&self, record: &FeatureRecord, detailed: bool) -> String {
        if detailed {
            Self::detailed(record)
        } else {
            Self::brief(record)
        }
    }

    fn detailed(record: &FeatureRecord) -> String {
        let f = &record.features;
        let handle = &f.social_handle;
        let mut md = String::new();
        let _ = writeln!(md, "# Persona Profile: {handle}\n");
        let _ = writeln!(md, "## 1. Crypto Identity");
        let _ = writeln!(
            md,
            "This persona is identified as a **{}**, with a net worth of approximately **{}**. \
             They hold **{}** tokens and are involved in **{}** unique NFT collections.\n",
            crypto_identity(record),
            usd(f.total_networth),
            f.token_count,
            f.unique_nft_collections,
        );
        let _ = writeln!(md, "## 2. Trading Style");
        let _ = writeln!(
            md,
            "{handle} is {}, showing consistent engagement in the crypto markets.\n",
            trading_style(f.activity_score)
        );
        let _ = writeln!(md, "## 3. Risk Profile");
        let _ = writeln!(
            md,
            "Their risk profile indicates a **{}**, with a risk score of {} out of 100.\n",
            risk_profile(f.risk_score),
            f.risk_score
        );
        let _ = writeln!(md, "## 4. Blockchain Preferences");
        let _ = writeln!(
            md,
            "Primarily active on the {} blockchain, leveraging its ecosystem for opportunities.\n",
            f.chain
        );
        let _ = writeln!(md, "## 5. Personalized Recommendations");
        let _ = writeln!(
            md,
            "Based on their profile, the following recommendations may suit their interests \
             and investment style:\n"
        );
        for rec in &record.recommendations {
            let _ = writeln!(md, "- {rec}");
        }
        md.trim().to_string()
    }

    fn brief(record: &FeatureRecord) -> String {
        let f = &record.features;
        let first_rec = record
            .recommendations
            .first()
            .map(ToString::to_string)
            .unwrap_or_default();
        format!(
            "# Persona: {}\n\n{} is a **{}** holding {} on the {} chain, with {}.\n\nSuggested next step: {}",
            f.social_handle,
            short_address(&f.address),
            crypto_identity(record),
            usd(f.total_networth),
            f.chain,
            risk_profile(f.risk_score),
            first_rec,
        )
    }
}

// --- Chat completions ---

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct ChatNarrator {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens_detailed: u32,
    max_tokens_brief: u32,
    temperature: f64,
    top_p: f64,
}

/// Prompt for the language model. The detailed variant lists every metric.
pub fn build_prompt(record: &FeatureRecord, detailed: bool) -> String {
    let f = &record.features;
    let short = short_address(&f.address);
    if !detailed {
        return format!(
            "Create a brief crypto persona for wallet {short} with {} total worth on {} chain. \
             Include identity type, risk profile, and 1-2 recommendations.",
            usd(f.total_networth),
            f.chain
        );
    }

    let tags: Vec<&str> = record.classifications.iter().map(PersonaTag::as_str).collect();
    let top_tokens = if f.top_tokens.is_empty() {
        "None".to_string()
    } else {
        f.top_tokens.join(", ")
    };
    let mut p = String::new();
    let _ = writeln!(
        p,
        "Generate a detailed persona profile for crypto wallet {short} based on the following on-chain data:"
    );
    let _ = writeln!(p, "- Total networth: {}", usd(f.total_networth));
    let _ = writeln!(p, "- Native balance: {}", group_thousands(f.native_balance, 2));
    let _ = writeln!(p, "- Token balance: {}", usd(f.token_balance_usd));
    let _ = writeln!(p, "- Chain: {}", f.chain);
    let _ = writeln!(p, "- Wallet Health Score: {} / 100", f.wallet_health_score);
    let _ = writeln!(p, "- Risk Score: {} / 100 (higher means riskier)", f.risk_score);
    let _ = writeln!(p, "- Activity Score: {} (aggregate transaction count)", f.activity_score);
    let _ = writeln!(p, "- Token Count: {} tokens held", f.token_count);
    let _ = writeln!(p, "- Top Tokens: {top_tokens}");
    let _ = writeln!(p, "- DeFi Protocols: {} engaged", f.defi_protocols);
    let _ = writeln!(p, "- Total DeFi USD: {}", usd(f.total_defi_usd));
    let _ = writeln!(p, "- NFT Collections: {}", f.unique_nft_collections);
    let _ = writeln!(p, "- Classifications: {}", tags.join(", "));
    let _ = writeln!(p, "- Social Handle: {}", f.social_handle);
    p.push_str(
        "\nBased on these, create a rich, fictional persona including:\n\
         1. Crypto Identity: Who they are in the crypto ecosystem\n\
         2. Trading Style: Their approach, time horizon, transaction patterns\n\
         3. Risk Profile: Their comfort with different types of risk\n\
         4. Blockchain Preferences: Why they choose this chain\n\
         5. Personalized Recommendations: 3-4 specific products or strategies\n\n\
         Format your response as a well-structured markdown document with headers for each section.",
    );
    p
}

/// Strip an echoed prompt and instruction markers from a completion.
pub fn clean_completion(text: &str, prompt: &str) -> String {
    let body = match text.find(prompt) {
        Some(idx) => &text[idx + prompt.len()..],
        None => text,
    };
    body.replace("[/INST]", "").trim().to_string()
}

impl ChatNarrator {
    pub fn from_config(cfg: &config::Narrative) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("build chat completion http client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key: cfg.api_key(),
            max_tokens_detailed: cfg.max_tokens_detailed,
            max_tokens_brief: cfg.max_tokens_brief,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    pub async fn generate(&self, record: &FeatureRecord, detailed: bool) -> Result<String> {
        let prompt = build_prompt(record, detailed);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: if detailed {
                self.max_tokens_detailed
            } else {
                self.max_tokens_brief
            },
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let mut req = self.http.post(self.completions_url()).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp: ChatResponse = req
            .send()
            .await
            .context("chat completion request")?
            .error_for_status()?
            .json()
            .await
            .context("decode chat completion")?;

        let content = resp
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no content"))?;
        let text = clean_completion(&content, &prompt);
        if text.is_empty() {
            return Err(anyhow!("chat completion was empty"));
        }
        Ok(text)
    }
}
