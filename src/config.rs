use std::fmt;
use std::path::PathBuf;

/// Service endpoint used when `SUBSCRIPTION_SERVICE_ENDPOINT` is not set.
pub const DEFAULT_ENDPOINT: &str =
    "https://epsb-ws.verlagsinfo.de/epsb-ws/ContractService/Contract";
/// Target namespace of the contract service interface.
pub const DEFAULT_NAMESPACE: &str = "http://order.ws.epsb.bitech.de";
pub const DEFAULT_DEBUG_LOG: &str = "debug.log";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Account identifiers sent with (or held for) every remote call.
///
/// Only `username`, `password` and `mandator_id` go on the wire today. The
/// remaining identifiers belong to the account but the lookup operation does
/// not accept them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub mandator_id: String,
    pub customer_id: String,
    pub contract_id: String,
    pub global_order_id: String,
    pub source_id: String,
    pub order_number: String,
}

impl Credentials {
    /// Creates credentials with only the fields the lookup operation sends.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        mandator_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mandator_id: mandator_id.into(),
            customer_id: String::new(),
            contract_id: String::new(),
            global_order_id: String::new(),
            source_id: String::new(),
            order_number: String::new(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("mandator_id", &self.mandator_id)
            .field("customer_id", &self.customer_id)
            .field("contract_id", &self.contract_id)
            .field("global_order_id", &self.global_order_id)
            .field("source_id", &self.source_id)
            .field("order_number", &self.order_number)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoint: String,
    pub namespace: String,
    pub debug_enabled: bool,
    pub debug_log_path: PathBuf,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Configuration pointing at the production endpoint with debug logging off.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            debug_enabled: false,
            debug_log_path: PathBuf::from(DEFAULT_DEBUG_LOG),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let credentials = Credentials {
            username: required("SUBSCRIPTION_SERVICE_USER")?,
            password: required("SUBSCRIPTION_SERVICE_PASSWORD")?,
            mandator_id: required("SUBSCRIPTION_SERVICE_MANDATOR_ID")?,
            customer_id: optional("SUBSCRIPTION_SERVICE_CUSTOMER_ID").unwrap_or_default(),
            contract_id: optional("SUBSCRIPTION_SERVICE_CONTRACT_ID").unwrap_or_default(),
            global_order_id: optional("SUBSCRIPTION_SERVICE_GLOBAL_ORDER_ID")
                .unwrap_or_default(),
            source_id: optional("SUBSCRIPTION_SERVICE_SOURCE_ID").unwrap_or_default(),
            order_number: optional("SUBSCRIPTION_SERVICE_ORDER_NUMBER").unwrap_or_default(),
        };

        let endpoint = match optional("SUBSCRIPTION_SERVICE_ENDPOINT") {
            Some(url) => validate_url("SUBSCRIPTION_SERVICE_ENDPOINT", url)?,
            None => DEFAULT_ENDPOINT.to_string(),
        };

        let config = Self {
            credentials,
            endpoint,
            namespace: optional("SUBSCRIPTION_SERVICE_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            debug_enabled: optional("SUBSCRIPTION_DEBUG")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            debug_log_path: optional("SUBSCRIPTION_DEBUG_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DEBUG_LOG)),
            request_timeout_secs: match optional("SUBSCRIPTION_TIMEOUT_SECS") {
                Some(secs) => secs.parse().map_err(|_| {
                    anyhow::anyhow!("SUBSCRIPTION_TIMEOUT_SECS must be a whole number of seconds")
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Subscription service endpoint: {}", config.endpoint);
        tracing::debug!("Mandator: {}", config.credentials.mandator_id);
        if config.debug_enabled {
            tracing::info!(
                "Wire debug log enabled: {}",
                config.debug_log_path.display()
            );
        }

        Ok(config)
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn validate_url(name: &str, value: String) -> anyhow::Result<String> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    url::Url::parse(&value).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    Ok(value)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
