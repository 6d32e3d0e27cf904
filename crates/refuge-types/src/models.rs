use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The single administrative principal. The credential hash never leaves
/// the store; this is the public view returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    pub id: Uuid,
    pub username: String,
}

/// Categorical tag carried by every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbuseType {
    Physical,
    Emotional,
    Sexual,
    Financial,
    Other,
}

impl AbuseType {
    pub const ALL: [AbuseType; 5] = [
        AbuseType::Physical,
        AbuseType::Emotional,
        AbuseType::Sexual,
        AbuseType::Financial,
        AbuseType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AbuseType::Physical => "Physical",
            AbuseType::Emotional => "Emotional",
            AbuseType::Sexual => "Sexual",
            AbuseType::Financial => "Financial",
            AbuseType::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

/// A submitted incident report. Immutable after creation except deletion.
///
/// The extended fields are populated when the deployment runs with the
/// extended intake form; `image` is the stored path of the optional
/// attachment, served back under `/uploads`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub abuse_type: AbuseType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}
