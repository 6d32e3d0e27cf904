use axum::{
    Extension, Json,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::SecondsFormat;
use tracing::{info, warn};
use uuid::Uuid;

use refuge_db::models::ReportRow;
use refuge_types::api::{ReportSubmission, SubmitReportResponse};
use refuge_types::models::{AbuseType, Report};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentDirector;
use crate::storage::UploadedImage;

/// A submission that passed validation, ready to persist.
#[derive(Debug)]
struct NewReport {
    name: String,
    email: String,
    phone: String,
    abuse_type: AbuseType,
    description: String,
    sex: Option<String>,
    work_position: Option<String>,
    education_level: Option<String>,
    job_type: Option<String>,
    incident_time: Option<String>,
    incident_place: Option<String>,
    incident_day: Option<String>,
}

/// Public intake endpoint. Accepts JSON (fields only) or multipart
/// form-data (fields plus an optional single `image` part).
pub async fn submit_report(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let (submission, image) = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|_| ApiError::Validation("Invalid multipart body".to_string()))?;
        parse_multipart(multipart).await?
    } else {
        let Json(body) = Json::<ReportSubmission>::from_request(req, &())
            .await
            .map_err(|_| ApiError::Validation("Invalid JSON body".to_string()))?;
        (body, None)
    };

    let new_report = validate(&submission, state.extended_fields)?;

    // Nothing is persisted until validation has passed; the image goes to
    // disk first so the row never references a missing file.
    let image_path = match &image {
        Some(img) => Some(state.storage.save_image(img).await?),
        None => None,
    };

    let row = ReportRow {
        id: Uuid::new_v4().to_string(),
        name: new_report.name,
        email: new_report.email,
        phone: new_report.phone,
        abuse_type: new_report.abuse_type.as_str().to_string(),
        description: new_report.description,
        sex: new_report.sex,
        work_position: new_report.work_position,
        education_level: new_report.education_level,
        job_type: new_report.job_type,
        incident_time: new_report.incident_time,
        incident_place: new_report.incident_place,
        incident_day: new_report.incident_day,
        image: image_path.clone(),
        created_at: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    };

    if let Err(e) = state.db.insert_report(&row) {
        // Roll back the stored file so it cannot leak.
        if let Some(path) = &image_path {
            state.storage.delete_image(path).await.ok();
        }
        return Err(ApiError::Internal(e));
    }

    info!("Report {} submitted", row.id);

    let report = row_to_report(row);
    Ok((
        StatusCode::CREATED,
        Json(SubmitReportResponse {
            success: true,
            data: report,
        }),
    ))
}

/// All reports, newest first. Director only.
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentDirector>,
) -> Result<impl IntoResponse, ApiError> {
    // Run the blocking query off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_reports())
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
        .map_err(ApiError::Internal)?;

    let reports: Vec<Report> = rows.into_iter().map(row_to_report).collect();
    Ok(Json(reports))
}

/// Permanently removes a report and its stored attachment. Director only.
pub async fn delete_report(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentDirector>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .db
        .get_report(&id)
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Report"))?;

    if !state.db.delete_report(&id).map_err(ApiError::Internal)? {
        return Err(ApiError::NotFound("Report"));
    }

    if let Some(image) = &report.image {
        state.storage.delete_image(image).await.ok();
    }

    info!("Report {} deleted by {}", id, current.username);

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Report deleted successfully",
    })))
}

async fn parse_multipart(
    mut multipart: Multipart,
) -> Result<(ReportSubmission, Option<UploadedImage>), ApiError> {
    let mut submission = ReportSubmission::default();
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Invalid multipart body".to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            if image.is_some() {
                return Err(ApiError::Validation(
                    "Only one image attachment is allowed".to_string(),
                ));
            }
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::Validation("Failed to read image upload".to_string()))?
                .to_vec();
            image = Some(UploadedImage {
                filename,
                content_type,
                data,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|_| ApiError::Validation("Invalid multipart body".to_string()))?;

        match name.as_str() {
            "name" => submission.name = Some(value),
            "email" => submission.email = Some(value),
            "phone" => submission.phone = Some(value),
            "abuseType" => submission.abuse_type = Some(value),
            "description" => submission.description = Some(value),
            "sex" => submission.sex = Some(value),
            "workPosition" => submission.work_position = Some(value),
            "educationLevel" => submission.education_level = Some(value),
            "jobType" => submission.job_type = Some(value),
            "incidentTime" => submission.incident_time = Some(value),
            "incidentPlace" => submission.incident_place = Some(value),
            "incidentDay" => submission.incident_day = Some(value),
            // Unknown text fields are dropped, matching the form contract.
            _ => {}
        }
    }

    Ok((submission, image))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Checks that every required field is present and non-empty, naming the
/// whole missing set in one error. The extended fields are required only
/// when the extended intake form is enabled.
fn validate(submission: &ReportSubmission, extended: bool) -> Result<NewReport, ApiError> {
    let core: [(&str, &Option<String>); 5] = [
        ("name", &submission.name),
        ("email", &submission.email),
        ("phone", &submission.phone),
        ("abuseType", &submission.abuse_type),
        ("description", &submission.description),
    ];
    let extended_set: [(&str, &Option<String>); 7] = [
        ("sex", &submission.sex),
        ("workPosition", &submission.work_position),
        ("educationLevel", &submission.education_level),
        ("jobType", &submission.job_type),
        ("incidentTime", &submission.incident_time),
        ("incidentPlace", &submission.incident_place),
        ("incidentDay", &submission.incident_day),
    ];

    let mut missing: Vec<&str> = Vec::new();
    for (field, value) in core.iter() {
        if is_blank(value) {
            missing.push(field);
        }
    }
    if extended {
        for (field, value) in extended_set.iter() {
            if is_blank(value) {
                missing.push(field);
            }
        }
    }

    if !missing.is_empty() {
        return Err(ApiError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let abuse_type_raw = submission.abuse_type.as_deref().unwrap_or_default();
    let abuse_type = AbuseType::parse(abuse_type_raw).ok_or_else(|| {
        ApiError::Validation(
            "abuseType must be one of Physical, Emotional, Sexual, Financial, Other".to_string(),
        )
    })?;

    Ok(NewReport {
        name: submission.name.clone().unwrap_or_default(),
        email: submission.email.clone().unwrap_or_default(),
        phone: submission.phone.clone().unwrap_or_default(),
        abuse_type,
        description: submission.description.clone().unwrap_or_default(),
        sex: submission.sex.clone(),
        work_position: submission.work_position.clone(),
        education_level: submission.education_level.clone(),
        job_type: submission.job_type.clone(),
        incident_time: submission.incident_time.clone(),
        incident_place: submission.incident_place.clone(),
        incident_day: submission.incident_day.clone(),
    })
}

/// Stored rows are trusted but parsed defensively: a corrupt value is
/// logged and mapped to a default rather than failing the whole listing.
fn row_to_report(row: ReportRow) -> Report {
    let abuse_type = AbuseType::parse(&row.abuse_type).unwrap_or_else(|| {
        warn!("Corrupt abuse_type '{}' on report '{}'", row.abuse_type, row.id);
        AbuseType::Other
    });

    Report {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt report id '{}': {}", row.id, e);
            Uuid::default()
        }),
        name: row.name,
        email: row.email,
        phone: row.phone,
        abuse_type,
        description: row.description,
        sex: row.sex,
        work_position: row.work_position,
        education_level: row.education_level,
        job_type: row.job_type,
        incident_time: row.incident_time,
        incident_place: row.incident_place,
        incident_day: row.incident_day,
        image: row.image,
        created_at: row
            .created_at
            .parse::<chrono::DateTime<chrono::Utc>>()
            .or_else(|_| {
                // SQLite-default timestamps are "YYYY-MM-DD HH:MM:SS"
                // without timezone. Parse as naive UTC and convert.
                chrono::NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| ndt.and_utc())
            })
            .unwrap_or_else(|e| {
                warn!("Corrupt created_at '{}' on report '{}': {}", row.created_at, row.id, e);
                chrono::DateTime::default()
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_submission() -> ReportSubmission {
        ReportSubmission {
            name: Some("A".to_string()),
            email: Some("a@x.com".to_string()),
            phone: Some("123".to_string()),
            abuse_type: Some("Physical".to_string()),
            description: Some("...".to_string()),
            ..ReportSubmission::default()
        }
    }

    #[test]
    fn valid_core_submission_passes() {
        let report = validate(&core_submission(), false).unwrap();
        assert_eq!(report.abuse_type, AbuseType::Physical);
    }

    #[test]
    fn missing_fields_are_all_named() {
        let submission = ReportSubmission {
            name: Some("A".to_string()),
            ..ReportSubmission::default()
        };
        let err = validate(&submission, false).unwrap_err();
        let message = err.to_string();
        for field in ["email", "phone", "abuseType", "description"] {
            assert!(message.contains(field), "missing {field} in: {message}");
        }
        assert!(!message.contains("name"));
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let mut submission = core_submission();
        submission.email = Some("   ".to_string());
        let err = validate(&submission, false).unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn unknown_abuse_type_is_rejected() {
        let mut submission = core_submission();
        submission.abuse_type = Some("Verbal".to_string());
        let err = validate(&submission, false).unwrap_err();
        assert!(err.to_string().contains("abuseType"));
    }

    #[test]
    fn extended_fields_required_only_when_enabled() {
        let submission = core_submission();
        assert!(validate(&submission, false).is_ok());

        let err = validate(&submission, true).unwrap_err();
        let message = err.to_string();
        for field in [
            "sex",
            "workPosition",
            "educationLevel",
            "jobType",
            "incidentTime",
            "incidentPlace",
            "incidentDay",
        ] {
            assert!(message.contains(field), "missing {field} in: {message}");
        }
    }

    #[test]
    fn extended_fields_pass_through_even_when_not_required() {
        let mut submission = core_submission();
        submission.sex = Some("F".to_string());
        let report = validate(&submission, false).unwrap();
        assert_eq!(report.sex.as_deref(), Some("F"));
    }

    #[test]
    fn row_round_trips_to_api_model() {
        let row = ReportRow {
            id: "0193d3f0-0000-7000-8000-000000000000".to_string(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "123".to_string(),
            abuse_type: "Financial".to_string(),
            description: "...".to_string(),
            image: Some("uploads/x.png".to_string()),
            created_at: "2025-03-01T09:00:00.000000+00:00".to_string(),
            ..ReportRow::default()
        };
        let report = row_to_report(row);
        assert_eq!(report.abuse_type, AbuseType::Financial);
        assert_eq!(report.image.as_deref(), Some("uploads/x.png"));
        assert_eq!(report.created_at.to_rfc3339(), "2025-03-01T09:00:00+00:00");
    }

    #[test]
    fn sqlite_default_timestamps_still_parse() {
        let row = ReportRow {
            id: Uuid::new_v4().to_string(),
            created_at: "2025-03-01 09:00:00".to_string(),
            abuse_type: "Other".to_string(),
            ..ReportRow::default()
        };
        let report = row_to_report(row);
        assert_eq!(report.created_at.to_rfc3339(), "2025-03-01T09:00:00+00:00");
    }
}
