//! Out-of-band director provisioning. There is no self-registration
//! endpoint; this tool is the only way a director account comes to exist.
//!
//! Usage: `provision-director <username> <password>`, or set
//! `REFUGE_DIRECTOR_USERNAME` / `REFUGE_DIRECTOR_PASSWORD`.
//! Idempotent: an existing username is left untouched.

use std::path::PathBuf;

use anyhow::bail;
use tracing::info;
use uuid::Uuid;

use refuge_db::Database;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt().init();

    let mut args = std::env::args().skip(1);
    let username = args
        .next()
        .or_else(|| std::env::var("REFUGE_DIRECTOR_USERNAME").ok());
    let password = args
        .next()
        .or_else(|| std::env::var("REFUGE_DIRECTOR_PASSWORD").ok());

    let (Some(username), Some(password)) = (username, password) else {
        bail!("usage: provision-director <username> <password>");
    };
    if username.is_empty() || password.is_empty() {
        bail!("username and password must be non-empty");
    }

    let db_path: PathBuf = std::env::var("REFUGE_DB_PATH")
        .unwrap_or_else(|_| "refuge.db".into())
        .into();
    let db = Database::open(&db_path)?;

    if db.get_director_by_username(&username)?.is_some() {
        info!("Director '{}' already exists", username);
        return Ok(());
    }

    let password_hash = refuge_api::auth::hash_password(&password)?;
    let id = Uuid::new_v4();
    db.create_director(&id.to_string(), &username, &password_hash)?;

    info!("Director '{}' created ({})", username, id);
    Ok(())
}
