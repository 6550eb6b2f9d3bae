use metrics::{describe_counter, describe_histogram};

use crate::persona_classification::PersonaTag;
use crate::record_source::RecordOrigin;

pub fn describe() {
    describe_counter!(
        "persona_wallets_profiled_total",
        "Wallets profiled, labelled by record source (local|remote)."
    );
    describe_counter!(
        "persona_wallets_not_found_total",
        "Profile requests for wallets absent locally and remotely."
    );
    describe_counter!(
        "persona_remote_fetch_total",
        "Remote record fetches, labelled by status (ok|error)."
    );
    describe_histogram!(
        "persona_remote_latency_ms",
        "Remote record fetch latency in milliseconds."
    );
    describe_counter!(
        "persona_tags_assigned_total",
        "Persona tags assigned, labelled by tag."
    );
    describe_counter!(
        "persona_narrative_fallback_total",
        "Narratives that fell back to the template generator."
    );
}

pub fn record_profiled(origin: RecordOrigin, tags: &[PersonaTag]) {
    metrics::counter!("persona_wallets_profiled_total", "source" => origin.as_str()).increment(1);
    for tag in tags {
        metrics::counter!("persona_tags_assigned_total", "tag" => tag.as_str()).increment(1);
    }
}

pub fn record_not_found() {
    metrics::counter!("persona_wallets_not_found_total").increment(1);
}

pub fn record_remote_fetch(ok: bool, latency_ms: f64) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!("persona_remote_fetch_total", "status" => status).increment(1);
    metrics::histogram!("persona_remote_latency_ms").record(latency_ms);
}

pub fn record_narrative_fallback() {
    metrics::counter!("persona_narrative_fallback_total").increment(1);
}
