//! Process-environment configuration, read once at startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::RelayError;

const PROJECT_ID_VAR: &str = "OUBLIETTE_PROJECT_ID";
const SOCKET_PATH_VAR: &str = "OUBLIETTE_RELAY_SOCKET";
const PAIRING_BUDGET_VAR: &str = "OUBLIETTE_PAIRING_BUDGET_SECS";
const REAPER_TICK_VAR: &str = "OUBLIETTE_REAPER_TICK_SECS";

const DEFAULT_SOCKET_PATH: &str = "/mcp/relay.sock";
const DEFAULT_PAIRING_BUDGET_SECS: u64 = 60;
const DEFAULT_REAPER_TICK_SECS: u64 = 10;

/// Immutable configuration for one relay instance.
///
/// Every relay instance serves exactly one project; `project_id` is that
/// project's identifier, enforced byte-for-byte against every connection's
/// header (spec.md's `ProjectBinding`).
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub project_id: String,
    pub socket_path: PathBuf,
    pub pairing_budget: Duration,
    pub reaper_tick: Duration,
}

impl RelayConfig {
    /// Reads and validates configuration from the process environment.
    pub fn from_env() -> Result<Self, RelayError> {
        let project_id = match std::env::var(PROJECT_ID_VAR) {
            Ok(v) if !v.is_empty() => v,
            _ => return Err(RelayError::MissingProjectId(PROJECT_ID_VAR)),
        };

        let socket_path = std::env::var(SOCKET_PATH_VAR)
            .unwrap_or_else(|_| DEFAULT_SOCKET_PATH.to_owned())
            .into();

        let pairing_budget = duration_secs_var(PAIRING_BUDGET_VAR, DEFAULT_PAIRING_BUDGET_SECS)?;
        let reaper_tick = duration_secs_var(REAPER_TICK_VAR, DEFAULT_REAPER_TICK_SECS)?;

        Ok(Self {
            project_id,
            socket_path,
            pairing_budget,
            reaper_tick,
        })
    }
}

fn duration_secs_var(var: &'static str, default: u64) -> Result<Duration, RelayError> {
    match std::env::var(var) {
        Err(_) => Ok(Duration::from_secs(default)),
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(RelayError::InvalidDuration { var, value }),
            Ok(secs) => Ok(Duration::from_secs(secs)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [PROJECT_ID_VAR, SOCKET_PATH_VAR, PAIRING_BUDGET_VAR, REAPER_TICK_VAR] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn missing_project_id_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        assert!(matches!(
            RelayConfig::from_env(),
            Err(RelayError::MissingProjectId(_))
        ));
    }

    #[test]
    fn defaults_apply_when_optional_vars_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(PROJECT_ID_VAR, "proj-X");
        let cfg = RelayConfig::from_env().unwrap();
        assert_eq!(cfg.project_id, "proj-X");
        assert_eq!(cfg.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
        assert_eq!(cfg.pairing_budget, Duration::from_secs(DEFAULT_PAIRING_BUDGET_SECS));
        assert_eq!(cfg.reaper_tick, Duration::from_secs(DEFAULT_REAPER_TICK_SECS));
        clear_env();
    }

    #[test]
    fn invalid_duration_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(PROJECT_ID_VAR, "proj-X");
        std::env::set_var(PAIRING_BUDGET_VAR, "not-a-number");
        assert!(matches!(
            RelayConfig::from_env(),
            Err(RelayError::InvalidDuration { var, .. }) if var == PAIRING_BUDGET_VAR
        ));
        clear_env();
    }

    #[test]
    fn zero_duration_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(PROJECT_ID_VAR, "proj-X");
        std::env::set_var(REAPER_TICK_VAR, "0");
        assert!(matches!(
            RelayConfig::from_env(),
            Err(RelayError::InvalidDuration { var, .. }) if var == REAPER_TICK_VAR
        ));
        clear_env();
    }
}
