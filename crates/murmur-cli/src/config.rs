//! Configuration for the murmur bot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
///
/// Loaded from `config/default.toml` (optional) layered under environment
/// variables with a `MURMUR_` prefix, then validated.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Name the bot answers to.
    pub bot_name: String,
    /// Default utterer when none is given on the command line.
    pub username: String,
    /// Where the network snapshot and the state files live.
    pub data_dir: PathBuf,
    /// Log filter, `tracing_subscriber::EnvFilter` syntax.
    pub log_filter: String,
    pub reply: ReplyConfig,
}

/// Tuning of reply generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Fast propagation steps run before picking a seed.
    pub propagation_steps: u32,
    /// Selector temperature in [0, 100].
    pub temperature: f64,
    /// Baseline in-degree of the influence normalizer, > 1.
    pub normal_incoming_links: f64,
    /// Memory performance of the propagation aging penalty.
    pub memory_perf: f64,
    /// Starting activation threshold for seed candidates; lowered stepwise
    /// when nothing is hot enough.
    pub seed_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_name: "Murmur".to_string(),
            username: "User".to_string(),
            data_dir: PathBuf::from("data"),
            log_filter: "info".to_string(),
            reply: ReplyConfig::default(),
        }
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            propagation_steps: 2,
            temperature: 60.0,
            normal_incoming_links: 2.0,
            memory_perf: 100.0,
            seed_threshold: 90.0,
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Order: `config/default.toml` (base, optional), then environment
    /// variables with the `MURMUR_` prefix (`MURMUR_REPLY__TEMPERATURE`
    /// style nesting).
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("MURMUR").separator("__"));
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=100.0).contains(&self.reply.temperature) {
            anyhow::bail!(
                "reply.temperature must be in [0,100], got {}",
                self.reply.temperature
            );
        }
        if self.reply.normal_incoming_links <= 1.0 {
            anyhow::bail!(
                "reply.normal_incoming_links must be > 1, got {}",
                self.reply.normal_incoming_links
            );
        }
        if self.reply.propagation_steps == 0 {
            anyhow::bail!("reply.propagation_steps must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_bad_temperature_is_rejected() {
        let mut config = Config::default();
        config.reply.temperature = 130.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_normal_incoming_links_is_rejected() {
        let mut config = Config::default();
        config.reply.normal_incoming_links = 1.0;
        assert!(config.validate().is_err());
    }
}
