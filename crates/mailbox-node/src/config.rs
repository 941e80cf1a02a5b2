//! # Node Configuration
//!
//! Engine limits, request loop sizing, endpoint identities and logging.
//! Built from defaults, then overridden from `MBX_*` environment
//! variables. Values that do not parse are reported and ignored.

use mailbox_core::{CreatePolicy, DeliveryModel, Endpoint, MailboxConfig, MailboxError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Mailbox engine limits and policies.
    pub mailbox: MailboxConfig,
    /// Request loop configuration.
    pub server: ServerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Request loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Requests buffered ahead of the consumer.
    pub request_queue_depth: usize,
    /// Endpoint to user identity bindings.
    pub identities: Vec<(Endpoint, u32)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_queue_depth: 64,
            identities: vec![(0, 0)],
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid mailbox limits: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("request queue depth must be greater than zero")]
    ZeroQueueDepth,

    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

impl NodeConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mailbox.validate()?;
        if self.server.request_queue_depth == 0 {
            return Err(ConfigError::ZeroQueueDepth);
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }
        Ok(())
    }

    /// Applies `MBX_*` overrides read through `lookup`.
    ///
    /// Returns one message per variable that was set but could not be
    /// parsed; those variables leave the default in place.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut rejected = Vec::new();

        let mut numeric = |key: &str, target: &mut usize| {
            if let Some(raw) = lookup(key) {
                match raw.trim().parse() {
                    Ok(value) => *target = value,
                    Err(_) => rejected.push(format!("{}={:?} is not a number", key, raw)),
                }
            }
        };
        numeric("MBX_MAX_MESSAGE_LEN", &mut self.mailbox.max_message_len);
        numeric("MBX_MAX_MESSAGE_COUNT", &mut self.mailbox.max_message_count);
        numeric("MBX_QUEUE_DEPTH", &mut self.server.request_queue_depth);

        if let Some(raw) = lookup("MBX_DELIVERY_MODEL") {
            match parse_delivery_model(&raw) {
                Some(model) => self.mailbox.default_delivery_model = model,
                None => rejected.push(format!("MBX_DELIVERY_MODEL={:?} is not a delivery model", raw)),
            }
        }

        if let Some(raw) = lookup("MBX_CREATE_POLICY") {
            match parse_create_policy(&raw) {
                Some(policy) => self.mailbox.create_policy = policy,
                None => rejected.push(format!("MBX_CREATE_POLICY={:?} is not a create policy", raw)),
            }
        }

        if let Some(raw) = lookup("MBX_IDENTITIES") {
            match parse_identities(&raw) {
                Some(identities) => self.server.identities = identities,
                None => rejected.push(format!(
                    "MBX_IDENTITIES={:?} must be endpoint:uid pairs",
                    raw
                )),
            }
        }

        if let Some(level) = lookup("MBX_LOG_LEVEL") {
            self.logging.level = level.trim().to_lowercase();
        }

        rejected
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> (NodeConfig, Vec<String>) {
    let mut config = NodeConfig::default();
    let rejected = config.apply_overrides(|key| std::env::var(key).ok());
    (config, rejected)
}

fn parse_delivery_model(raw: &str) -> Option<DeliveryModel> {
    match raw.trim().to_lowercase().as_str() {
        "target-list" | "target_list" | "targetlist" => Some(DeliveryModel::TargetList),
        "permission" => Some(DeliveryModel::Permission),
        _ => None,
    }
}

fn parse_create_policy(raw: &str) -> Option<CreatePolicy> {
    match raw.trim().to_lowercase().as_str() {
        "exact-mask" | "exact_mask" | "exact" => Some(CreatePolicy::ExactMask),
        "capability-bit" | "capability_bit" | "bit" => Some(CreatePolicy::CapabilityBit),
        _ => None,
    }
}

/// Parses `"endpoint:uid endpoint:uid ..."`.
fn parse_identities(raw: &str) -> Option<Vec<(Endpoint, u32)>> {
    raw.split_whitespace()
        .map(|pair| {
            let (endpoint, uid) = pair.split_once(':')?;
            Some((endpoint.parse().ok()?, uid.parse().ok()?))
        })
        .collect()
}
