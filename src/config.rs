use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::distributor::DistributionConfig;
use crate::session::SessionLimits;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub distributor: DistributorConfig,
    pub sessions: SessionLimits,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            distributor: DistributorConfig::from_env(),
            sessions: session_limits_from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "STONE_SORTER_API_HOST";
    const PORT_VAR: &'static str = "STONE_SORTER_API_PORT";

    fn from_env() -> Self {
        let (bind_ip, display_host) = match env_string(Self::HOST_VAR) {
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => (ip, raw),
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::HOST_VAR,
                        raw,
                        err,
                        Self::DEFAULT_HOST
                    );
                    (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string()),
        };

        let port = load_with_warning(
            Self::PORT_VAR,
            Self::DEFAULT_PORT,
            |value| value != 0,
            "must not be 0",
        );

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Configuration for the distribution engine.
#[derive(Clone, Debug, Default)]
pub struct DistributorConfig {
    distribution: DistributionConfig,
}

impl DistributorConfig {
    const COMBINATION_SIZE_VAR: &'static str = "STONE_SORTER_MAX_COMBINATION_SIZE";
    const CANDIDATES_VAR: &'static str = "STONE_SORTER_MAX_CANDIDATES";
    const MASS_EPSILON_VAR: &'static str = "STONE_SORTER_MASS_EPSILON";
    const NODE_LIMIT_VAR: &'static str = "STONE_SORTER_NODE_LIMIT";

    fn from_env() -> Self {
        let max_combination_size = load_with_warning(
            Self::COMBINATION_SIZE_VAR,
            DistributionConfig::DEFAULT_MAX_COMBINATION_SIZE,
            |value| value >= 1,
            "must be at least 1",
        );

        let max_candidates = load_with_warning(
            Self::CANDIDATES_VAR,
            DistributionConfig::DEFAULT_MAX_CANDIDATES,
            |value| value >= 1,
            "must be at least 1",
        );

        // Half a hundredth of a carat keeps distinct two-decimal masses apart.
        let mass_epsilon = load_with_warning(
            Self::MASS_EPSILON_VAR,
            DistributionConfig::DEFAULT_MASS_EPSILON,
            |value: f64| (0.0..0.005).contains(&value),
            "must be at least 0 and below 0.005",
        );

        let node_limit = env_string(Self::NODE_LIMIT_VAR)
            .map(|raw| parse_node_limit(&raw, Self::NODE_LIMIT_VAR))
            .unwrap_or(DistributionConfig::DEFAULT_NODE_LIMIT);

        let distribution = DistributionConfig::builder()
            .max_combination_size(max_combination_size)
            .max_candidates(max_candidates)
            .mass_epsilon(mass_epsilon)
            .node_limit(node_limit)
            .build();

        if distribution != DistributionConfig::default() {
            info!(?distribution, "using custom distribution settings");
        }

        Self { distribution }
    }

    /// Returns the configured DistributionConfig.
    pub fn distribution_config(&self) -> DistributionConfig {
        self.distribution
    }
}

const MAX_SESSIONS_VAR: &str = "STONE_SORTER_MAX_SESSIONS";
const SESSION_IDLE_SECS_VAR: &str = "STONE_SORTER_SESSION_IDLE_SECS";

fn session_limits_from_env() -> SessionLimits {
    let max_sessions = load_with_warning(
        MAX_SESSIONS_VAR,
        SessionLimits::DEFAULT_MAX_SESSIONS,
        |value| value >= 1,
        "must be at least 1",
    );
    let idle_secs = load_with_warning(
        SESSION_IDLE_SECS_VAR,
        SessionLimits::DEFAULT_IDLE_TIMEOUT.as_secs(),
        |value| value >= 1,
        "must be at least 1",
    );

    SessionLimits {
        max_sessions,
        idle_timeout: Duration::from_secs(idle_secs),
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

/// Interprets a work budget; `0`, `off`, `none` and `unlimited` disable it.
///
/// Unparsable values keep the default budget.
fn parse_node_limit(raw: &str, var_name: &str) -> Option<u64> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "0" | "off" | "none" | "unlimited" => None,
        other => match other.parse::<u64>() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}'): {}. Using {:?}.",
                    var_name,
                    other,
                    err,
                    DistributionConfig::DEFAULT_NODE_LIMIT
                );
                DistributionConfig::DEFAULT_NODE_LIMIT
            }
        },
    }
}

fn parse_checked<T>(raw: &str, validator: impl Fn(T) -> bool) -> Result<T, String>
where
    T: FromStr + Copy,
    T::Err: std::fmt::Display,
{
    let value = raw.trim().parse::<T>().map_err(|err| err.to_string())?;
    if validator(value) {
        Ok(value)
    } else {
        Err("out of range".to_string())
    }
}

fn load_with_warning<T>(
    var_name: &str,
    default: T,
    validator: impl Fn(T) -> bool,
    invalid_hint: &str,
) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env_string(var_name) {
        Some(raw) => match parse_checked(&raw, validator) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "{} contains invalid value '{}' ({}): {}. Using {}.",
                    var_name, raw, err, invalid_hint, default
                );
                default
            }
        },
        None => default,
    }
}
