use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub mounts: MountsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Watch mode refresh interval in milliseconds
    pub update_interval_ms: u64,
    /// Which /proc/[pid]/mountstats to read: "self" or a numeric pid
    pub pid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Average RTT above this is reported SLOW (ms)
    pub rtt_warn_ms: f64,
    /// Average RTT above this is reported DEGRADED (ms)
    pub rtt_crit_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountsConfig {
    /// Glob-style patterns of mountpoints to hide (e.g. "/backup*")
    pub exclude: Vec<String>,
}

impl MountsConfig {
    pub fn is_excluded(&self, mountpoint: &str) -> bool {
        self.exclude.iter().any(|pat| {
            if let Some(p) = pat.strip_suffix('*') { mountpoint.starts_with(p) }
            else { pat == mountpoint }
        })
    }
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            general:    GeneralConfig::default(),
            thresholds: Thresholds::default(),
            mounts:     MountsConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { update_interval_ms: 2000, pid: "self".into() }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { rtt_warn_ms: 5.0, rtt_crit_ms: 50.0 }
    }
}

impl Default for MountsConfig {
    fn default() -> Self {
        Self { exclude: Vec::new() }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        match try_load() {
            Ok(c)  => c,
            Err(_) => {
                // Write defaults on first run (best-effort)
                let _ = try_write_defaults();
                Config::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nfsmon").join("nfsmon.toml"))
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    let text = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&text)?;
    Ok(cfg)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# nfsmon configuration\n# Generated on first run; edit freely\n\n{}", text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.general.update_interval_ms, 2000);
        assert_eq!(cfg.general.pid, "self");
        assert_eq!(cfg.thresholds.rtt_warn_ms, 5.0);
        assert_eq!(cfg.thresholds.rtt_crit_ms, 50.0);
        assert!(cfg.mounts.exclude.is_empty());
    }

    #[test]
    fn exclude_patterns_match_prefix_globs() {
        let mounts = MountsConfig { exclude: vec!["/backup*".into(), "/mnt/scratch".into()] };
        assert!(mounts.is_excluded("/backup"));
        assert!(mounts.is_excluded("/backup/nightly"));
        assert!(mounts.is_excluded("/mnt/scratch"));
        assert!(!mounts.is_excluded("/mnt/scratch2"));
        assert!(!mounts.is_excluded("/data"));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str("[thresholds]\nrtt_warn_ms = 10.0\nrtt_crit_ms = 80.0\n").unwrap();
        assert_eq!(cfg.thresholds.rtt_warn_ms, 10.0);
        assert_eq!(cfg.general.update_interval_ms, 2000);
    }
}
