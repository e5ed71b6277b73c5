use std::path::PathBuf;

/// Process settings, read from `FLEETBOOK_*` environment variables.
/// Missing or unparseable values fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Serve Prometheus metrics on this port when set.
    pub metrics_port: Option<u16>,
    pub scenario_path: PathBuf,
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_port: None,
            scenario_path: PathBuf::from("./scenario.json"),
            pretty: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            metrics_port: lookup("FLEETBOOK_METRICS_PORT").and_then(|s| s.parse().ok()),
            scenario_path: lookup("FLEETBOOK_SCENARIO")
                .map(PathBuf::from)
                .unwrap_or(defaults.scenario_path),
            pretty: lookup("FLEETBOOK_PRETTY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pretty),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]), Config::default());
    }

    #[test]
    fn reads_all_settings() {
        let c = config(&[
            ("FLEETBOOK_METRICS_PORT", "9100"),
            ("FLEETBOOK_SCENARIO", "/tmp/fleet.json"),
            ("FLEETBOOK_PRETTY", "false"),
        ]);
        assert_eq!(c.metrics_port, Some(9100));
        assert_eq!(c.scenario_path, PathBuf::from("/tmp/fleet.json"));
        assert!(!c.pretty);
    }

    #[test]
    fn garbage_falls_back() {
        let c = config(&[("FLEETBOOK_METRICS_PORT", "not-a-port"), ("FLEETBOOK_PRETTY", "yes")]);
        assert_eq!(c.metrics_port, None);
        assert!(c.pretty);
    }
}
