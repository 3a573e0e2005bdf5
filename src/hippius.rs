use anyhow::{Context, anyhow, bail};
use dotenvy::from_path_iter;
use resolve_path::PathResolveExt;
use std::collections::BTreeMap;
use std::env;
use std::fmt::{Debug, Display};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://api.hippius.io";
pub const DEFAULT_S3_ENDPOINT: &str = "https://s3.hippius.com";
pub const DEFAULT_S3_REGION: &str = "decentralized";

pub const ACCESS_KEY_VAR: &str = "HIPPIUS_S3_ACCESS_KEY";
pub const SECRET_KEY_VAR: &str = "HIPPIUS_S3_SECRET_KEY";

/// Upper bound for every single network call (RPC and S3).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn get_from_config(
    config: &BTreeMap<String, String>,
    key: &str,
) -> anyhow::Result<String> {
    config
        .get(key)
        .filter(|value| !value.is_empty())
        .map_or_else(
            || Err(anyhow!("Key {key} could not be found in the config.")),
            |value| Ok(value.clone()),
        )
}

/// Empty variables count as unset, like an `export KEY=` without value.
pub fn get_from_env(key: &str) -> anyhow::Result<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(anyhow!("Key {key} could not be found in your environment.")),
    }
}

fn read_configfile(path: &PathBuf) -> Option<BTreeMap<String, String>> {
    let iter = from_path_iter(path).ok()?;

    let mut config: BTreeMap<String, String> = BTreeMap::new();

    for item in iter {
        let (key, value) = item.ok()?;
        config.insert(key, value);
    }

    Some(config)
}

/// Access key pair for the S3 endpoint.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl S3Credentials {
    pub fn new<S: Into<String>>(
        access_key: S,
        secret_key: S,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let abs_path = path
            .try_resolve()
            .map_or_else(|_| path.to_path_buf(), std::borrow::Cow::into_owned);

        if let Some(config) = read_configfile(&abs_path) {
            Ok(Self {
                access_key: get_from_config(&config, ACCESS_KEY_VAR)?,
                secret_key: get_from_config(&config, SECRET_KEY_VAR)?,
            })
        } else {
            bail!("Invalid config file {}", abs_path.display())
        }
    }

    pub fn from_filename(filename: &str) -> anyhow::Result<Self> {
        Self::from_path(Path::new(filename))
    }

    pub fn from_dotenv() -> anyhow::Result<Self> {
        Self::from_filename(".env")
    }

    /// Read ~/.hippius
    pub fn from_global_dotfile() -> anyhow::Result<Self> {
        Self::from_filename("~/.hippius")
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            access_key: get_from_env(ACCESS_KEY_VAR)?,
            secret_key: get_from_env(SECRET_KEY_VAR)?,
        })
    }

    pub fn guess() -> anyhow::Result<Self> {
        // environment variables, then .env, then ~/.hippius
        Self::from_env()
            .or_else(|_| Self::from_dotenv())
            .or_else(|_| Self::from_global_dotfile())
            .with_context(|| {
                "No S3 credentials could be found (tried environment variables, .env, ~/.hippius)"
            })
    }

    fn obfuscated_key(&self) -> String {
        let key = &self.access_key;
        let head = key.get(..4);
        let tail = key.len().checked_sub(4).and_then(|start| key.get(start..));

        match (head, tail) {
            (Some(head), Some(tail)) if key.len() > 8 => format!("{head}...{tail}"),
            _ => String::from("***"),
        }
    }
}

// never leak the secret through `{:?}` or tracing fields
impl Debug for S3Credentials {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key", &self.obfuscated_key())
            .field("secret_key", &"***")
            .finish()
    }
}

impl Display for S3Credentials {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.obfuscated_key())
    }
}

/// Where and how to reach the object store.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct S3Settings {
    pub endpoint: String,
    pub region: String,
    pub credentials: S3Credentials,
}

impl S3Settings {
    pub fn new<S: Into<String>>(
        endpoint: S,
        region: S,
        credentials: S3Credentials,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: region.into(),
            credentials,
        }
    }
}
