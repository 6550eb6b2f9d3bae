pub mod context;
pub mod error;
pub mod format;
pub mod metrics;
pub mod narrative;
pub mod persona_classification;
pub mod profile;
pub mod recommendations;
pub mod record_source;
pub mod report;
pub mod wallet_features;
pub mod wallet_scoring;

pub use context::ProfilerContext;
pub use error::ProfileError;
pub use profile::FeatureRecord;
