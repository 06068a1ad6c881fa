//! Service configuration from the environment

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::analysis::AnalysisOptions;
use crate::dialects::DialectKind;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Parent of per-run scratch directories
    pub scratch_dir: PathBuf,
    pub keep_scratch: bool,
    executables: HashMap<DialectKind, String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8084,
            scratch_dir: std::env::temp_dir().join("deck-service"),
            keep_scratch: false,
            executables: HashMap::new(),
        }
    }
}

/// Environment variable naming the executable of `kind`
pub fn executable_var(kind: DialectKind) -> &'static str {
    match kind {
        DialectKind::Abaqus => "ABAQUS_PATH",
        DialectKind::Ansys => "ANSYS_PATH",
        DialectKind::OpenSees => "OPENSEES_PATH",
        DialectKind::Sofistik => "SOFISTIK_PATH",
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep their
    /// defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT '{}'", port),
            }
        }
        if let Some(dir) = lookup("DECK_SCRATCH_DIR") {
            config.scratch_dir = PathBuf::from(dir);
        }
        if let Some(keep) = lookup("DECK_KEEP_SCRATCH") {
            config.keep_scratch = matches!(keep.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        for kind in DialectKind::ALL {
            if let Some(exe) = lookup(executable_var(kind)) {
                config.executables.insert(kind, resolve_executable(&exe));
            }
        }
        config
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configured solver command, or the dialect's conventional one
    pub fn executable(&self, kind: DialectKind) -> String {
        self.executables
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_executable().to_string())
    }

    /// Analysis options for `kind` with this service's scratch policy
    pub fn analysis_options(&self, kind: DialectKind) -> AnalysisOptions {
        AnalysisOptions {
            exe: Some(self.executable(kind)),
            keep_scratch: self.keep_scratch,
            scratch_root: Some(self.scratch_dir.clone()),
            ..AnalysisOptions::new(kind)
        }
    }
}

/// Solvers run from a scratch directory, so relative paths are made absolute
fn resolve_executable(exe: &str) -> String {
    let path = Path::new(exe);
    if path.components().count() > 1 {
        if let Ok(abs) = std::fs::canonicalize(path) {
            return abs.to_string_lossy().into_owned();
        }
    }
    exe.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(|_| None);
        assert_eq!(config.addr(), "0.0.0.0:8084");
        assert_eq!(config.executable(DialectKind::Abaqus), "ccx");
        assert!(!config.keep_scratch);
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("DECK_KEEP_SCRATCH", "true"),
            ("DECK_SCRATCH_DIR", "/var/tmp/decks"),
            ("OPENSEES_PATH", "OpenSees3"),
        ]
        .into_iter()
        .collect();
        let config = ServiceConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.port, 9000);
        assert!(config.keep_scratch);
        assert_eq!(config.executable(DialectKind::OpenSees), "OpenSees3");

        let options = config.analysis_options(DialectKind::OpenSees);
        assert_eq!(options.exe.as_deref(), Some("OpenSees3"));
        assert_eq!(options.scratch_root, Some(PathBuf::from("/var/tmp/decks")));
    }

    #[test]
    fn test_bad_port_keeps_default() {
        let config = ServiceConfig::from_lookup(|k| (k == "PORT").then(|| "http".to_string()));
        assert_eq!(config.port, 8084);
    }
}
