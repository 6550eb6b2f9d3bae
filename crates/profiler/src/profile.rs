use serde::Serialize;

use crate::persona_classification::{classify_wallet, PersonaTag};
use crate::recommendations::{generate_recommendations, Recommendation};
use crate::wallet_features::WalletFeatures;

/// Everything the service returns for one wallet. Built once per request: features,
/// then tags, then recommendations. The narrative is attached by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    #[serde(flatten)]
    pub features: WalletFeatures,
    pub classifications: Vec<PersonaTag>,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_profile: Option<String>,
}

impl FeatureRecord {
    pub fn new(features: WalletFeatures) -> Self {
        let classifications = classify_wallet(&features);
        let recommendations = generate_recommendations(&features, &classifications);
        Self {
            features,
            classifications,
            recommendations,
            persona_profile: None,
        }
    }

    pub fn with_narrative(mut self, narrative: String) -> Self {
        self.persona_profile = Some(narrative);
        self
    }

    pub fn address(&self) -> &str {
        &self.features.address
    }

    pub fn has_tag(&self, tag: PersonaTag) -> bool {
        self.classifications.contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet_features::tests::blank_features;

    #[test]
    fn test_record_always_classified() {
        let record = FeatureRecord::new(blank_features("0xempty"));
        assert_eq!(record.classifications, vec![PersonaTag::RetailUser]);
        assert_eq!(record.recommendations, vec![Recommendation::StarterDapps]);
        assert!(record.persona_profile.is_none());
    }

    #[test]
    fn test_serialized_record_is_flat() {
        let record = FeatureRecord::new(blank_features("0xflat")).with_narrative("hi".into());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["address"], "0xflat");
        assert_eq!(json["risk_score"], 100.0);
        assert_eq!(json["classifications"][0], "retail_user");
        assert_eq!(json["persona_profile"], "hi");
    }
}
