//! Final deployment safety verdict.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::risk::{RiskBucket, RiskLevel};

/// The final safe/unsafe determination with supporting bucket detail.
///
/// Assembled whole from a gate outcome; never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the deployment is safe to proceed.
    pub safe: bool,

    /// Highest risk level across evaluated buckets.
    pub overall_risk_level: RiskLevel,

    /// The bucket carrying the highest risk, or `"none"` when no
    /// assessment was available.
    #[serde(
        serialize_with = "bucket_or_none::serialize",
        deserialize_with = "bucket_or_none::deserialize"
    )]
    pub highest_risk_bucket: Option<RiskBucket>,

    /// Short explanation of the determination.
    pub reasoning: String,

    /// Buckets that met or exceeded their thresholds, in fixed order.
    pub failed_buckets: Vec<RiskBucket>,
}

/// Serializes `Option<RiskBucket>` as the bucket name or the literal
/// string `"none"`, matching the wire shape consumers expect.
mod bucket_or_none {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<RiskBucket>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bucket) => bucket.serialize(serializer),
            None => serializer.serialize_str("none"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RiskBucket>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "none" => Ok(None),
            "drift" => Ok(Some(RiskBucket::Drift)),
            "intent" => Ok(Some(RiskBucket::Intent)),
            "operations" => Ok(Some(RiskBucket::Operations)),
            other => Err(serde::de::Error::custom(format!(
                "unknown risk bucket: {other}"
            ))),
        }
    }
}
