//! Connection parameters.

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;

/// Connection parameters for [`Database::connect`](crate::Database::connect).
///
/// ```ignore
/// let config = DbConfig::new("localhost")
///     .username("app")
///     .password("secret")
///     .dbname("shop")
///     .prefix("t_");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    #[serde(alias = "user")]
    pub username: String,
    #[serde(alias = "pass")]
    pub password: String,
    #[serde(alias = "name")]
    pub dbname: String,
    pub port: u16,
    /// Client charset; `None` keeps the server default.
    pub charset: Option<String>,
    /// Prepended to every table name the builder renders.
    pub prefix: String,
    /// Column returned by [`Database::insert`](crate::Database::insert).
    pub primary_key: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            dbname: String::new(),
            port: 5432,
            charset: Some("utf8".to_string()),
            prefix: String::new(),
            primary_key: "id".to_string(),
        }
    }
}

impl DbConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = dbname.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client charset; an empty string keeps the server default.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        let charset = charset.into();
        self.charset = (!charset.trim().is_empty()).then_some(charset);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Build from key/value pairs: `host`, `username`/`user`,
    /// `password`/`pass`, `dbname`/`name`, `port`, `charset`, `prefix`,
    /// `primary_key`. Unknown keys are ignored.
    pub fn from_map<I, K, V>(entries: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in entries {
            let value = value.into();
            match key.as_ref() {
                "host" => config.host = value,
                "username" | "user" => config.username = value,
                "password" | "pass" => config.password = value,
                "dbname" | "name" => config.dbname = value,
                "port" => config.port = parse_port(&value)?,
                "charset" => config = config.charset(value),
                "prefix" => config.prefix = value,
                "primary_key" => config.primary_key = value,
                _ => {}
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Read `DB_HOST`, `DB_USER`, `DB_PASS`, `DB_NAME`, `DB_PORT`,
    /// `DB_CHARSET` and `DB_PREFIX` from the environment.
    pub fn from_env() -> OrmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load a `.env` file if one exists, then [`from_env`](Self::from_env).
    pub fn from_dotenv() -> OrmResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        const KEYS: [(&str, &str); 7] = [
            ("DB_HOST", "host"),
            ("DB_USER", "username"),
            ("DB_PASS", "password"),
            ("DB_NAME", "dbname"),
            ("DB_PORT", "port"),
            ("DB_CHARSET", "charset"),
            ("DB_PREFIX", "prefix"),
        ];
        if lookup("DB_HOST").is_none() {
            return Err(OrmError::Config("DB_HOST is not set".to_string()));
        }
        Self::from_map(
            KEYS.iter()
                .filter_map(|(env, key)| lookup(env).map(|v| (*key, v))),
        )
    }

    pub fn validate(&self) -> OrmResult<()> {
        if self.host.trim().is_empty() {
            return Err(OrmError::Config("host is not set".to_string()));
        }
        if let Some(charset) = &self.charset {
            if !charset
                .trim()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(OrmError::Config(format!("invalid charset '{charset}'")));
            }
        }
        Ok(())
    }

    /// PostgreSQL `client_encoding` for the configured charset.
    pub fn client_encoding(&self) -> Option<String> {
        let charset = self.charset.as_deref()?.trim();
        match charset.to_ascii_lowercase().as_str() {
            "" => None,
            "utf8" | "utf8mb4" | "utf-8" => Some("UTF8".to_string()),
            _ => Some(charset.to_ascii_uppercase()),
        }
    }

    /// Driver configuration for these parameters; the charset is sent as a
    /// `client_encoding` startup option.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host).port(self.port);
        if !self.username.is_empty() {
            pg.user(&self.username);
        }
        if !self.password.is_empty() {
            pg.password(&self.password);
        }
        if !self.dbname.is_empty() {
            pg.dbname(&self.dbname);
        }
        if let Some(encoding) = self.client_encoding() {
            pg.options(&format!("-c client_encoding={encoding}"));
        }
        pg
    }
}

fn parse_port(value: &str) -> OrmResult<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| OrmError::Config(format!("invalid port '{value}'")))
}
