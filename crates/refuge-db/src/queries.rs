use crate::Database;
use crate::models::{DirectorRow, ReportRow};
use anyhow::Result;
use rusqlite::{Connection, Row};

const REPORT_COLUMNS: &str = "id, name, email, phone, abuse_type, description, sex, \
     work_position, education_level, job_type, incident_time, incident_place, \
     incident_day, image, created_at";

impl Database {
    // -- Directors --

    pub fn create_director(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO directors (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_director_by_username(&self, username: &str) -> Result<Option<DirectorRow>> {
        self.with_conn(|conn| query_director_by_username(conn, username))
    }

    pub fn get_director_by_id(&self, id: &str) -> Result<Option<DirectorRow>> {
        self.with_conn(|conn| query_director_by_id(conn, id))
    }

    /// Replaces the stored hash. Callers hash the plaintext first;
    /// plaintext never reaches this layer.
    pub fn update_director_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE directors SET password = ?1 WHERE id = ?2",
                (password_hash, id),
            )?;
            Ok(changed > 0)
        })
    }

    // -- Reports --

    pub fn insert_report(&self, report: &ReportRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO reports ({REPORT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
                ),
                rusqlite::params![
                    report.id,
                    report.name,
                    report.email,
                    report.phone,
                    report.abuse_type,
                    report.description,
                    report.sex,
                    report.work_position,
                    report.education_level,
                    report.job_type,
                    report.incident_time,
                    report.incident_place,
                    report.incident_day,
                    report.image,
                    report.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// All reports, newest first.
    pub fn list_reports(&self) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([], report_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_report(&self, id: &str) -> Result<Option<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"
            ))?;
            let row = stmt.query_row([id], report_from_row).optional()?;
            Ok(row)
        })
    }

    /// Returns true if a row was actually removed.
    pub fn delete_report(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM reports WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    pub fn count_reports(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM reports", [], |r| r.get(0))?;
            Ok(count)
        })
    }

    /// Whether any report references the given stored image path.
    /// Used by the orphan-file sweep.
    pub fn report_references_image(&self, image_path: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let hit: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM reports WHERE image = ?1 LIMIT 1",
                    [image_path],
                    |r| r.get(0),
                )
                .optional()?;
            Ok(hit.is_some())
        })
    }
}

fn query_director_by_username(conn: &Connection, username: &str) -> Result<Option<DirectorRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM directors WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(DirectorRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_director_by_id(conn: &Connection, id: &str) -> Result<Option<DirectorRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM directors WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(DirectorRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        abuse_type: row.get(4)?,
        description: row.get(5)?,
        sex: row.get(6)?,
        work_position: row.get(7)?,
        education_level: row.get(8)?,
        job_type: row.get(9)?,
        incident_time: row.get(10)?,
        incident_place: row.get(11)?,
        incident_day: row.get(12)?,
        image: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, created_at: &str) -> ReportRow {
        ReportRow {
            id: id.to_string(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "123".to_string(),
            abuse_type: "Physical".to_string(),
            description: "...".to_string(),
            created_at: created_at.to_string(),
            ..ReportRow::default()
        }
    }

    #[test]
    fn list_orders_newest_first_regardless_of_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        db.insert_report(&report("b", "2025-03-02T09:00:00.000000+00:00")).unwrap();
        db.insert_report(&report("c", "2025-03-03T09:00:00.000000+00:00")).unwrap();
        db.insert_report(&report("a", "2025-03-01T09:00:00.000000+00:00")).unwrap();

        let ids: Vec<String> = db.list_reports().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn delete_removes_exactly_one_row() {
        let db = Database::open_in_memory().unwrap();
        db.insert_report(&report("a", "2025-03-01T09:00:00.000000+00:00")).unwrap();
        db.insert_report(&report("b", "2025-03-02T09:00:00.000000+00:00")).unwrap();

        assert!(db.delete_report("a").unwrap());
        assert_eq!(db.count_reports().unwrap(), 1);
        assert!(db.get_report("a").unwrap().is_none());
        assert!(db.get_report("b").unwrap().is_some());
    }

    #[test]
    fn delete_missing_report_is_a_noop() {
        let db = Database::open_in_memory().unwrap();
        db.insert_report(&report("a", "2025-03-01T09:00:00.000000+00:00")).unwrap();

        assert!(!db.delete_report("nope").unwrap());
        assert_eq!(db.count_reports().unwrap(), 1);
    }

    #[test]
    fn director_usernames_are_unique() {
        let db = Database::open_in_memory().unwrap();
        db.create_director("d1", "motri", "hash1").unwrap();
        assert!(db.create_director("d2", "motri", "hash2").is_err());
    }

    #[test]
    fn update_password_replaces_the_stored_hash() {
        let db = Database::open_in_memory().unwrap();
        db.create_director("d1", "motri", "hash1").unwrap();

        assert!(db.update_director_password("d1", "hash2").unwrap());
        let row = db.get_director_by_id("d1").unwrap().unwrap();
        assert_eq!(row.password, "hash2");

        assert!(!db.update_director_password("ghost", "hash3").unwrap());
    }

    #[test]
    fn image_reference_lookup() {
        let db = Database::open_in_memory().unwrap();
        let mut r = report("a", "2025-03-01T09:00:00.000000+00:00");
        r.image = Some("uploads/abc.png".to_string());
        db.insert_report(&r).unwrap();

        assert!(db.report_references_image("uploads/abc.png").unwrap());
        assert!(!db.report_references_image("uploads/other.png").unwrap());
    }
}
