//! Response bodies for the public HTTP contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docmill_storage::SweepReport;

/// Body of a successful `POST /api/convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Always `true`; failures go through the error body instead.
    pub success: bool,
    /// Stored name of the produced artifact.
    pub output_file: String,
    /// Relative URL the artifact can be fetched from.
    pub download_url: String,
    /// Artifact size in bytes.
    pub size: u64,
    /// Present only when a fallback weaker than the requested guarantee
    /// was used.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

/// Body of `GET /api/cleanup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: SweepReport,
    pub timestamp: DateTime<Utc>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_is_omitted_when_false() {
        let body = ConvertResponse {
            success: true,
            output_file: "report.pdf".to_string(),
            download_url: "/api/download/report.pdf".to_string(),
            size: 1024,
            degraded: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("degraded").is_none());
        assert_eq!(json["outputFile"], "report.pdf");
        assert_eq!(json["downloadUrl"], "/api/download/report.pdf");

        let degraded = ConvertResponse {
            degraded: true,
            ..body
        };
        let json = serde_json::to_value(&degraded).unwrap();
        assert_eq!(json["degraded"], true);
    }

    #[test]
    fn cleanup_report_is_flattened() {
        let body = CleanupResponse {
            success: true,
            report: SweepReport {
                deleted_count: 2,
                deleted_files: vec!["a.pdf".to_string(), "b.pdf".to_string()],
                errors: Vec::new(),
            },
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["deletedCount"], 2);
        assert_eq!(json["deletedFiles"][1], "b.pdf");
        assert!(json.get("errors").is_none());
        assert!(json.get("timestamp").is_some());
    }
}
