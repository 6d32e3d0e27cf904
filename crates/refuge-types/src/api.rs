use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Director, Report};

// -- JWT Claims --

/// JWT claims shared by the login handler and the bearer-token middleware.
/// Canonical definition lives here in refuge-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub director: Director,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub message: String,
}

// -- Reports --

/// Raw submission fields as they arrive on the wire, before validation.
/// Every field is optional here; `reports::validate` decides which are
/// required and reports the missing set in one error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub abuse_type: Option<String>,
    pub description: Option<String>,
    pub sex: Option<String>,
    pub work_position: Option<String>,
    pub education_level: Option<String>,
    pub job_type: Option<String>,
    pub incident_time: Option<String>,
    pub incident_place: Option<String>,
    pub incident_day: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitReportResponse {
    pub success: bool,
    pub data: Report,
}
