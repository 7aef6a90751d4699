//! Daemon configuration, loaded from environment variables with
//! defaults.

const DEFAULT_CONFIG_PATH: &str = "/etc/secwd/configuration.json";
const DEFAULT_DATABASE_PATH: &str = "/var/lib/secwd/database.json";
const DEFAULT_MAPPING_PATH: &str = "/var/lib/secwd/mapping.json";
const DEFAULT_SOCKET_PATH: &str = "/run/secwd/secwd.sock";
const DEFAULT_CAMS_AGENT_NAME: &str = "secw-cams";
const DEFAULT_SECW_AGENT_NAME: &str = "secw-sws";
const DEFAULT_SRR_AGENT_NAME: &str = "secw-srr";

/// Daemon-wide configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub config_path: String,
    pub database_path: String,
    pub mapping_path: String,
    pub socket_path: String,
    pub cams_agent_name: String,
    pub secw_agent_name: String,
    pub srr_agent_name: String,
    pub verbose: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            mapping_path: DEFAULT_MAPPING_PATH.to_string(),
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            cams_agent_name: DEFAULT_CAMS_AGENT_NAME.to_string(),
            secw_agent_name: DEFAULT_SECW_AGENT_NAME.to_string(),
            srr_agent_name: DEFAULT_SRR_AGENT_NAME.to_string(),
            verbose: false,
        }
    }
}

impl DaemonConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            config_path: env_or_default("SECW_CONFIG_PATH", &defaults.config_path),
            database_path: env_or_default("SECW_DATABASE_PATH", &defaults.database_path),
            mapping_path: env_or_default("SECW_MAPPING_PATH", &defaults.mapping_path),
            socket_path: env_or_default("SECW_SOCKET_PATH", &defaults.socket_path),
            cams_agent_name: env_or_default("CAMS_AGENT_NAME", &defaults.cams_agent_name),
            secw_agent_name: env_or_default("SECW_AGENT_NAME", &defaults.secw_agent_name),
            srr_agent_name: env_or_default("SRR_AGENT_NAME", &defaults.srr_agent_name),
            verbose: std::env::var("SECW_VERBOSE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.verbose),
        }
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_used_when_env_unset() {
        let config = DaemonConfig::default();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert!(!config.verbose);
    }
}
