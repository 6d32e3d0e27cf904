/// Database row types — these map directly to SQLite rows.
/// Distinct from refuge-types API models to keep the DB layer independent.

pub struct DirectorRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Clone, Default)]
pub struct ReportRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub abuse_type: String,
    pub description: String,
    pub sex: Option<String>,
    pub work_position: Option<String>,
    pub education_level: Option<String>,
    pub job_type: Option<String>,
    pub incident_time: Option<String>,
    pub incident_place: Option<String>,
    pub incident_day: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
}
