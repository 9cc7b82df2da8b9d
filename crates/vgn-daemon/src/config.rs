//! Environment configuration.
//!
//! Two knobs, both optional: `PORT` and `DB_CONN_STR`. The process time
//! zone is forced to UTC at startup (`main.rs`); all dates in the system
//! are calendar dates, so nothing else is time-zone sensitive.

pub const ENV_PORT: &str = "PORT";
pub const ENV_DB_CONN_STR: &str = "DB_CONN_STR";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_CONN_STR: &str = "postgresql://localhost:5432/varangian";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_conn_str: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(ENV_PORT).ok(),
            std::env::var(ENV_DB_CONN_STR).ok(),
        )
    }

    fn from_vars(port: Option<String>, db_conn_str: Option<String>) -> Self {
        let port = port
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let db_conn_str = db_conn_str
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_CONN_STR.to_string());

        Self { port, db_conn_str }
    }
}
