//! Process configuration, read from `STOCKKEEP_*` environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use stockkeep_auth::{Authenticator, DenyAllAuthenticator, PasswordAuthenticator, Role};
use stockkeep_inventory::AddedWindow;
use stockkeep_observability::LogFormat;

pub const DB_PATH_VAR: &str = "STOCKKEEP_DB_PATH";
pub const ADDED_WINDOW_VAR: &str = "STOCKKEEP_ADDED_WINDOW";
pub const ADMIN_USER_VAR: &str = "STOCKKEEP_ADMIN_USER";
pub const ADMIN_PASSWORD_HASH_VAR: &str = "STOCKKEEP_ADMIN_PASSWORD_HASH";
pub const LOG_FORMAT_VAR: &str = "STOCKKEEP_LOG_FORMAT";

const DEFAULT_ADMIN_USER: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Explicit database path; `None` means the per-user default.
    pub db_path: Option<PathBuf>,
    pub added_window: AddedWindow,
    pub admin_user: String,
    pub admin_password_hash: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let added_window = match get(ADDED_WINDOW_VAR) {
            Some(raw) => raw
                .parse::<AddedWindow>()
                .with_context(|| format!("invalid {ADDED_WINDOW_VAR}"))?,
            None => AddedWindow::default(),
        };

        let log_format = match get(LOG_FORMAT_VAR) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            db_path: get(DB_PATH_VAR).map(PathBuf::from),
            added_window,
            admin_user: get(ADMIN_USER_VAR)
                .map(|u| u.trim().to_string())
                .unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
            admin_password_hash: get(ADMIN_PASSWORD_HASH_VAR).map(|h| h.trim().to_string()),
            log_format,
        })
    }

    /// Database path, with `--db` taking precedence over the environment.
    pub fn resolve_db_path(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        match flag.or_else(|| self.db_path.clone()) {
            Some(path) => Ok(path),
            None => default_db_path(),
        }
    }

    /// The purge authenticator. Without a configured hash nobody can purge.
    pub fn authenticator(&self) -> Arc<dyn Authenticator> {
        match &self.admin_password_hash {
            Some(hash) => Arc::new(PasswordAuthenticator::new().with_account(
                self.admin_user.clone(),
                hash.clone(),
                vec![Role::ADMIN],
            )),
            None => Arc::new(DenyAllAuthenticator),
        }
    }
}

/// `{app_data_dir}/stockkeep/stockkeep.db`.
fn default_db_path() -> Result<PathBuf> {
    let mut path = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory; set STOCKKEEP_DB_PATH or pass --db")?;
    path.push("stockkeep");
    path.push("stockkeep.db");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use stockkeep_auth::{AuthError, Credentials};

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.db_path, None);
        assert_eq!(cfg.added_window, AddedWindow::OnDay);
        assert_eq!(cfg.admin_user, "admin");
        assert_eq!(cfg.admin_password_hash, None);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            (DB_PATH_VAR, "/tmp/shop.db"),
            (ADDED_WINDOW_VAR, "cumulative"),
            (ADMIN_USER_VAR, " owner "),
            (ADMIN_PASSWORD_HASH_VAR, "$2b$04$abc"),
            (LOG_FORMAT_VAR, "pretty"),
        ])
        .unwrap();
        assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/shop.db")));
        assert_eq!(cfg.added_window, AddedWindow::UpToAndIncluding);
        assert_eq!(cfg.admin_user, "owner");
        assert_eq!(cfg.admin_password_hash.as_deref(), Some("$2b$04$abc"));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[(ADMIN_USER_VAR, "  "), (ADMIN_PASSWORD_HASH_VAR, "")]).unwrap();
        assert_eq!(cfg.admin_user, "admin");
        assert_eq!(cfg.admin_password_hash, None);
    }

    #[test]
    fn rejects_unknown_window_and_log_format() {
        assert!(config(&[(ADDED_WINDOW_VAR, "weekly")]).is_err());
        assert!(config(&[(LOG_FORMAT_VAR, "xml")]).is_err());
    }

    #[test]
    fn db_flag_overrides_environment() {
        let cfg = config(&[(DB_PATH_VAR, "/tmp/env.db")]).unwrap();
        assert_eq!(
            cfg.resolve_db_path(Some(PathBuf::from("/tmp/flag.db"))).unwrap(),
            PathBuf::from("/tmp/flag.db")
        );
        assert_eq!(cfg.resolve_db_path(None).unwrap(), PathBuf::from("/tmp/env.db"));
    }

    #[test]
    fn missing_hash_refuses_every_purge() {
        let cfg = config(&[]).unwrap();
        let err = cfg
            .authenticator()
            .authenticate(&Credentials::new("admin", "senha123"))
            .unwrap_err();
        assert_eq!(err, AuthError::NotConfigured);
    }
}
