use std::path::PathBuf;
use std::sync::{Arc, atomic::AtomicUsize};

use serde_json::json;
use tracing::{debug, info};
use zenoh::{Result, Session, Wait};

use crate::{Builder, node::ZNodeBuilder};

/// Source of node and endpoint ids, unique within a context.
#[derive(Debug, Default)]
pub struct GlobalCounter(AtomicUsize);

impl GlobalCounter {
    pub fn increment(&self) -> usize {
        self.0.fetch_add(1, std::sync::atomic::Ordering::AcqRel)
    }
}

#[derive(Default)]
pub struct ZContextBuilder {
    domain_id: usize,
    config_file: Option<PathBuf>,
    config_overrides: Vec<(String, serde_json::Value)>,
    /// First override that failed to serialize, reported by `build`
    override_error: Option<String>,
}

impl ZContextBuilder {
    /// Set the ROS domain ID
    pub fn with_domain_id(mut self, domain_id: usize) -> Self {
        self.domain_id = domain_id;
        self
    }

    /// Load configuration from a JSON5 Zenoh config file
    pub fn with_config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Add a JSON configuration override
    ///
    /// ```rust,ignore
    /// use serde_json::json;
    ///
    /// let ctx = ZContextBuilder::default()
    ///     .with_json("scouting/multicast/enabled", json!(false))
    ///     .with_json("connect/endpoints", json!(["tcp/127.0.0.1:7447"]))
    ///     .build()?;
    /// ```
    pub fn with_json<K: Into<String>, V: serde::Serialize>(mut self, key: K, value: V) -> Self {
        let key = key.into();
        match serde_json::to_value(&value) {
            Ok(value) => self.config_overrides.push((key, value)),
            Err(e) => {
                if self.override_error.is_none() {
                    self.override_error =
                        Some(format!("Failed to serialize value for key '{}': {}", key, e));
                }
            }
        }
        self
    }

    pub fn disable_multicast_scouting(self) -> Self {
        self.with_json("scouting/multicast/enabled", json!(false))
    }

    pub fn with_connect_endpoints<I, S>(self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints: Vec<String> = endpoints.into_iter().map(|s| s.into()).collect();
        self.with_json("connect/endpoints", json!(endpoints))
    }

    /// Zenoh mode: `peer`, `client` or `router`
    pub fn with_mode<S: Into<String>>(self, mode: S) -> Self {
        self.with_json("mode", json!(mode.into()))
    }

    /// Append the overrides found in `ROSZ_CONFIG_OVERRIDE`.
    ///
    /// Expected format: `key1=value1;key2=value2`, values in JSON5:
    ///
    /// ```text
    /// export ROSZ_CONFIG_OVERRIDE='mode="client";connect/endpoints=["tcp/192.168.1.1:7447"]'
    /// ```
    fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(overrides_str) = std::env::var("ROSZ_CONFIG_OVERRIDE") {
            debug!(
                "Applying config overrides from ROSZ_CONFIG_OVERRIDE: {}",
                overrides_str
            );
            self.config_overrides
                .extend(parse_config_overrides(&overrides_str)?);
        }
        Ok(self)
    }
}

fn parse_config_overrides(overrides_str: &str) -> Result<Vec<(String, serde_json::Value)>> {
    let mut overrides = Vec::new();
    for pair in overrides_str.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        // Values may themselves contain '='
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!(
                "Invalid ROSZ_CONFIG_OVERRIDE format: '{}'. Expected 'key=value'",
                pair
            )
            .into());
        };
        let key = key.trim();
        let value = value.trim();

        let json_value = json5::from_str::<serde_json::Value>(value).map_err(|e| {
            format!(
                "Failed to parse ROSZ_CONFIG_OVERRIDE value for key '{}': {} (value: {})",
                key, e, value
            )
        })?;
        debug!("Override: {} = {}", key, json_value);
        overrides.push((key.to_string(), json_value));
    }
    Ok(overrides)
}

impl Builder for ZContextBuilder {
    type Output = ZContext;

    #[tracing::instrument(name = "context_build", skip(self), fields(domain_id = self.domain_id))]
    fn build(mut self) -> Result<ZContext> {
        if let Some(e) = self.override_error.take() {
            return Err(e.into());
        }

        // Explicit file first, then ROSZ_CONFIG_FILE, then defaults
        let mut config = if let Some(ref config_file) = self.config_file {
            zenoh::Config::from_file(config_file)?
        } else if let Ok(path) = std::env::var("ROSZ_CONFIG_FILE") {
            debug!("Loading config from ROSZ_CONFIG_FILE: {}", path);
            zenoh::Config::from_file(path)?
        } else {
            zenoh::Config::default()
        };

        self = self.apply_env_overrides()?;

        for (key, value) in self.config_overrides {
            let value_str = serde_json::to_string(&value)
                .map_err(|e| format!("Failed to serialize value for key '{}': {}", key, e))?;

            config.insert_json5(&key, &value_str).map_err(|e| {
                format!(
                    "Failed to apply config override '{}' = '{}': {}",
                    key, value_str, e
                )
            })?;
        }

        let session = zenoh::open(config).wait()?;
        info!("Zenoh session opened: zid={}", session.zid());

        Ok(ZContext {
            session: Arc::new(session),
            counter: Arc::new(GlobalCounter::default()),
            domain_id: self.domain_id,
        })
    }
}

pub struct ZContext {
    session: Arc<Session>,
    counter: Arc<GlobalCounter>,
    domain_id: usize,
}

impl ZContext {
    pub fn create_node<S: AsRef<str>>(&self, name: S) -> ZNodeBuilder {
        ZNodeBuilder {
            domain_id: self.domain_id,
            name: name.as_ref().to_owned(),
            namespace: "".to_string(),
            session: self.session.clone(),
            counter: self.counter.clone(),
        }
    }
}
