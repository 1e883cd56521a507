// Where the Airflow metadata database lives

use anyhow::{anyhow, bail, Result};
use std::env;
use std::path::PathBuf;

use crate::db::Session;

pub const SQL_ALCHEMY_CONN_VAR: &str = "AIRFLOW__CORE__SQL_ALCHEMY_CONN";
pub const AIRFLOW_HOME_VAR: &str = "AIRFLOW_HOME";
pub const DEFAULT_DB_FILE: &str = "airflow.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_path: PathBuf,
}

impl Settings {
    /// Load `.env` if present, then resolve from the process environment
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        Self::resolve(
            env::var(SQL_ALCHEMY_CONN_VAR).ok(),
            env::var(AIRFLOW_HOME_VAR).ok(),
            env::var("HOME").ok(),
        )
    }

    /// Connection string first, then `$AIRFLOW_HOME/airflow.db`, then
    /// `~/airflow/airflow.db`
    pub fn resolve(
        sql_alchemy_conn: Option<String>,
        airflow_home: Option<String>,
        home: Option<String>,
    ) -> Result<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let database_path = if let Some(conn) = non_empty(sql_alchemy_conn) {
            sqlite_path(&conn)?
        } else if let Some(airflow_home) = non_empty(airflow_home) {
            PathBuf::from(airflow_home).join(DEFAULT_DB_FILE)
        } else if let Some(home) = non_empty(home) {
            PathBuf::from(home).join("airflow").join(DEFAULT_DB_FILE)
        } else {
            return Err(anyhow!(
                "Cannot locate the Airflow database: set {} or {}",
                SQL_ALCHEMY_CONN_VAR,
                AIRFLOW_HOME_VAR
            ));
        };

        Ok(Settings { database_path })
    }

    pub fn open_session(&self) -> Result<Session> {
        tracing::debug!(path = %self.database_path.display(), "opening session");
        Session::open(&self.database_path)
    }
}

/// `sqlite:///relative.db` or `sqlite:////absolute/path.db`
fn sqlite_path(conn: &str) -> Result<PathBuf> {
    let conn = conn.trim();
    let Some(rest) = conn.strip_prefix("sqlite:///") else {
        bail!(
            "Unsupported {}: `{}` (only sqlite:/// URLs are supported)",
            SQL_ALCHEMY_CONN_VAR,
            conn
        );
    };
    if rest.is_empty() {
        bail!("{} has no database path", SQL_ALCHEMY_CONN_VAR);
    }
    Ok(PathBuf::from(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_sqlite_url_wins() {
        let settings = Settings::resolve(
            some("sqlite:////var/lib/airflow/airflow.db"),
            some("/opt/airflow"),
            some("/home/op"),
        )
        .unwrap();
        assert_eq!(settings.database_path, PathBuf::from("/var/lib/airflow/airflow.db"));
    }

    #[test]
    fn test_relative_sqlite_url() {
        let settings = Settings::resolve(some("sqlite:///airflow.db"), None, None).unwrap();
        assert_eq!(settings.database_path, PathBuf::from("airflow.db"));
    }

    #[test]
    fn test_airflow_home_fallback() {
        let settings = Settings::resolve(None, some("/opt/airflow"), some("/home/op")).unwrap();
        assert_eq!(settings.database_path, PathBuf::from("/opt/airflow/airflow.db"));
    }

    #[test]
    fn test_home_fallback() {
        let settings = Settings::resolve(some(""), None, some("/home/op")).unwrap();
        assert_eq!(settings.database_path, PathBuf::from("/home/op/airflow/airflow.db"));
    }

    #[test]
    fn test_non_sqlite_url_rejected() {
        let err = Settings::resolve(
            some("postgresql+psycopg2://airflow@localhost/airflow"),
            None,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("only sqlite"));
    }

    #[test]
    fn test_nothing_configured() {
        assert!(Settings::resolve(None, None, None).is_err());
        assert!(Settings::resolve(some("sqlite:///"), None, None).is_err());
    }

    #[test]
    fn test_open_session_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::resolve(None, Some(dir.path().display().to_string()), None).unwrap();

        let session = settings.open_session().unwrap();
        assert_eq!(crate::db::count_users(session.connection()).unwrap(), 0);
        assert!(dir.path().join(DEFAULT_DB_FILE).exists());
    }
}
