use core::{str::FromStr, time::Duration};

use crate::{ConfigError, DomainHash, Error, QualifierProfile, Result, SnowflakeId, TWITTER_EPOCH};

/// What a generator does when the clock reads earlier than the last tick it
/// issued.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RegressionPolicy {
    /// Report [`IdGenStatus::Pending`](crate::IdGenStatus::Pending) and let
    /// blocking calls wait for the clock to catch up.
    #[default]
    Block,
    /// Fail the call with [`Error::ClockRegression`] right away.
    FailFast,
}

impl FromStr for RegressionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "fail-fast" | "fail_fast" | "failfast" => Ok(Self::FailFast),
            _ => Err(ConfigError::InvalidValue {
                key: "regression_policy",
                value: s.to_owned(),
            }
            .into()),
        }
    }
}

/// The owning domain of a generator, by name or as a pre-computed hash.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    /// A domain name, hashed once when the config is validated. The empty
    /// name and `"0"` stand for the zero hash used by local setups.
    Name(String),
    /// A hash computed elsewhere; must fit 32 bits.
    Hash(u64),
}

impl Domain {
    fn resolve(&self) -> Result<DomainHash> {
        match self {
            Self::Name(name) if name.is_empty() || name == "0" => Ok(DomainHash::ZERO),
            Self::Name(name) => Ok(DomainHash::of(name)),
            Self::Hash(hash) => DomainHash::try_from_u64(*hash),
        }
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::Name(String::new())
    }
}

impl From<&str> for Domain {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for Domain {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Settings for a [`SiqGenerator`](crate::SiqGenerator), before validation.
///
/// ```
/// use siq::{GeneratorConfig, QualifierProfile, RegressionPolicy};
///
/// let settings = GeneratorConfig::new("example.com")
///     .with_shard(3)
///     .with_regression_policy(RegressionPolicy::FailFast)
///     .validate()
///     .unwrap();
/// assert_eq!(settings.shard, 3);
/// assert_eq!(settings.domain.get(), 2_261_653_831);
/// assert_eq!(settings.profile, QualifierProfile::Compact);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub domain: Domain,
    /// Replaces the top byte of the domain hash.
    pub local_id: Option<u8>,
    /// Defaults to the process id modulo 256.
    pub shard: Option<u16>,
    pub profile: QualifierProfile,
    pub on_regression: RegressionPolicy,
    /// Wait budget of blocking calls; unbounded when unset.
    pub max_wait_ms: Option<u64>,
}

impl GeneratorConfig {
    pub fn new(domain: impl Into<Domain>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_domain_hash(mut self, hash: u64) -> Self {
        self.domain = Domain::Hash(hash);
        self
    }

    #[must_use]
    pub fn with_local_id(mut self, local_id: u8) -> Self {
        self.local_id = Some(local_id);
        self
    }

    #[must_use]
    pub fn with_shard(mut self, shard: u16) -> Self {
        self.shard = Some(shard);
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: QualifierProfile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub fn with_regression_policy(mut self, policy: RegressionPolicy) -> Self {
        self.on_regression = policy;
        self
    }

    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = Some(u64::try_from(max_wait.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Checks every field and resolves the domain hash.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ShardOutOfRange`] if the shard exceeds 255
    /// - [`ConfigError::DomainHashOutOfRange`] if a pre-computed hash is
    ///   wider than 32 bits
    pub fn validate(&self) -> Result<GeneratorSettings> {
        const MAX_SHARD: u16 = u8::MAX as u16;

        let shard = self.shard.unwrap_or_else(|| default_shard(MAX_SHARD));
        let shard = u8::try_from(shard).map_err(|_| ConfigError::ShardOutOfRange {
            shard,
            max: MAX_SHARD,
        })?;

        let mut domain = self.domain.resolve()?;
        if let Some(local_id) = self.local_id {
            domain = domain.with_local_id(local_id);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(shard, domain = %domain, profile = ?self.profile, "resolved generator settings");

        Ok(GeneratorSettings {
            shard,
            domain,
            profile: self.profile,
            on_regression: self.on_regression,
            max_wait: self.max_wait_ms.map(Duration::from_millis),
        })
    }

    /// Reads the config from `SIQ_*` environment variables, loading a
    /// `.env` file first if one exists.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `SIQ_DOMAIN` | domain name |
    /// | `SIQ_DOMAIN_HASH` | pre-computed hash, wins over `SIQ_DOMAIN` |
    /// | `SIQ_LOCAL_ID` | local id |
    /// | `SIQ_SHARD` | shard |
    /// | `SIQ_PROFILE` | `compact` or `wide` |
    /// | `SIQ_ON_REGRESSION` | `block` or `fail-fast` |
    /// | `SIQ_MAX_WAIT_MS` | wait budget in milliseconds |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a variable that does not
    /// parse.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Some(domain) = env_var("SIQ_DOMAIN") {
            config.domain = Domain::Name(domain);
        }
        if let Some(hash) = env_parse("SIQ_DOMAIN_HASH")? {
            config.domain = Domain::Hash(hash);
        }
        config.local_id = env_parse("SIQ_LOCAL_ID")?;
        config.shard = env_parse("SIQ_SHARD")?;
        if let Some(profile) = env_var("SIQ_PROFILE") {
            config.profile = profile.parse()?;
        }
        if let Some(policy) = env_var("SIQ_ON_REGRESSION") {
            config.on_regression = policy.parse()?;
        }
        config.max_wait_ms = env_parse("SIQ_MAX_WAIT_MS")?;
        Ok(config)
    }
}

/// Validated, immutable settings owned by a [`SiqGenerator`](crate::SiqGenerator).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub shard: u8,
    pub domain: DomainHash,
    pub profile: QualifierProfile,
    pub on_regression: RegressionPolicy,
    pub max_wait: Option<Duration>,
}

/// Settings for the Snowflake generators, before validation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnowflakeConfig {
    /// Milliseconds since the Unix epoch that timestamp 0 stands for.
    pub epoch_ms: u64,
    pub worker: u16,
    /// Defaults to the process id modulo 32.
    pub shard: Option<u16>,
    pub on_regression: RegressionPolicy,
    pub max_wait_ms: Option<u64>,
}

impl Default for SnowflakeConfig {
    fn default() -> Self {
        Self {
            epoch_ms: TWITTER_EPOCH.as_millis() as u64,
            worker: 0,
            shard: None,
            on_regression: RegressionPolicy::default(),
            max_wait_ms: None,
        }
    }
}

impl SnowflakeConfig {
    pub fn new(epoch: Duration) -> Self {
        Self::default().with_epoch(epoch)
    }

    #[must_use]
    pub fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch_ms = u64::try_from(epoch.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_worker(mut self, worker: u16) -> Self {
        self.worker = worker;
        self
    }

    #[must_use]
    pub fn with_shard(mut self, shard: u16) -> Self {
        self.shard = Some(shard);
        self
    }

    #[must_use]
    pub fn with_regression_policy(mut self, policy: RegressionPolicy) -> Self {
        self.on_regression = policy;
        self
    }

    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = Some(u64::try_from(max_wait.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Checks every field against the clock reading `now`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::WorkerOutOfRange`] / [`ConfigError::ShardOutOfRange`]
    ///   if either id exceeds 31
    /// - [`ConfigError::EpochInFuture`] if the epoch is later than `now`
    pub fn validate(&self, now: Duration) -> Result<SnowflakeSettings> {
        const MAX: u16 = SnowflakeId::WORKER_MASK as u16;

        if self.worker > MAX {
            return Err(ConfigError::WorkerOutOfRange {
                worker: self.worker,
                max: MAX,
            }
            .into());
        }
        let shard = self.shard.unwrap_or_else(|| default_shard(MAX));
        if shard > MAX {
            return Err(ConfigError::ShardOutOfRange { shard, max: MAX }.into());
        }
        let epoch = Duration::from_millis(self.epoch_ms);
        if epoch > now {
            return Err(ConfigError::EpochInFuture { epoch, now }.into());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(worker = self.worker, shard, epoch_ms = self.epoch_ms, "resolved snowflake settings");

        Ok(SnowflakeSettings {
            epoch,
            worker: self.worker as u8,
            shard: shard as u8,
            on_regression: self.on_regression,
            max_wait: self.max_wait_ms.map(Duration::from_millis),
        })
    }

    /// Reads `SNOWFLAKE_EPOCH_MS`, `SNOWFLAKE_WORKER` and `SNOWFLAKE_SHARD`,
    /// plus `SIQ_ON_REGRESSION` and `SIQ_MAX_WAIT_MS`, after loading `.env`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a variable that does not
    /// parse.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Some(epoch_ms) = env_parse("SNOWFLAKE_EPOCH_MS")? {
            config.epoch_ms = epoch_ms;
        }
        if let Some(worker) = env_parse("SNOWFLAKE_WORKER")? {
            config.worker = worker;
        }
        config.shard = env_parse("SNOWFLAKE_SHARD")?;
        if let Some(policy) = env_var("SIQ_ON_REGRESSION") {
            config.on_regression = policy.parse()?;
        }
        config.max_wait_ms = env_parse("SIQ_MAX_WAIT_MS")?;
        Ok(config)
    }
}

/// Validated, immutable settings owned by a Snowflake generator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SnowflakeSettings {
    pub epoch: Duration,
    pub worker: u8,
    pub shard: u8,
    pub on_regression: RegressionPolicy,
    pub max_wait: Option<Duration>,
}

fn default_shard(max: u16) -> u16 {
    (std::process::id() % (u32::from(max) + 1)) as u16
}

#[cfg(feature = "env")]
fn env_var(key: &'static str) -> Option<String> {
    dotenvy::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(feature = "env")]
fn env_parse<V: FromStr>(key: &'static str) -> Result<Option<V>> {
    env_var(key)
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                Error::from(ConfigError::InvalidValue { key, value: raw.clone() })
            })
        })
        .transpose()
}
