use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tokio_postgres::{Config as TokioPgConnectOptions, config::SslMode as TokioPgSslMode};

use crate::shared::ValidationError;

const COMMON_DATESTYLE: &str = "ISO";
const COMMON_INTERVALSTYLE: &str = "postgres";
const COMMON_EXTRA_FLOAT_DIGITS: i32 = 3;
const COMMON_CLIENT_ENCODING: &str = "UTF8";
const COMMON_TIMEZONE: &str = "UTC";

const APP_NAME_PROVISIONING: &str = "duckdb_pg_export_provisioning";

/// Session options for the direct connection opened while provisioning the destination table.
///
/// Short timeouts, since the connection only runs one catalog lookup and at most one DDL
/// statement.
pub static EXPORT_PROVISIONING_OPTIONS: LazyLock<PgConnectionOptions> =
    LazyLock::new(|| PgConnectionOptions {
        datestyle: COMMON_DATESTYLE.to_string(),
        intervalstyle: COMMON_INTERVALSTYLE.to_string(),
        extra_float_digits: COMMON_EXTRA_FLOAT_DIGITS,
        client_encoding: COMMON_CLIENT_ENCODING.to_string(),
        timezone: COMMON_TIMEZONE.to_string(),
        statement_timeout: 30_000,
        lock_timeout: 10_000,
        idle_in_transaction_session_timeout: 60_000,
        application_name: APP_NAME_PROVISIONING.to_string(),
    });

/// Server-side settings applied to a Postgres session at connection time.
#[derive(Debug, Clone)]
pub struct PgConnectionOptions {
    pub datestyle: String,
    pub intervalstyle: String,
    pub extra_float_digits: i32,
    pub client_encoding: String,
    pub timezone: String,
    pub statement_timeout: u32,
    pub lock_timeout: u32,
    pub idle_in_transaction_session_timeout: u32,
    pub application_name: String,
}

impl PgConnectionOptions {
    /// Returns the options as a `-c key=value` list for the libpq `options` parameter.
    pub fn to_options_string(&self) -> String {
        format!(
            "-c datestyle={} -c intervalstyle={} -c extra_float_digits={} -c client_encoding={} -c timezone={} -c statement_timeout={} -c lock_timeout={} -c idle_in_transaction_session_timeout={}",
            self.datestyle,
            self.intervalstyle,
            self.extra_float_digits,
            self.client_encoding,
            self.timezone,
            self.statement_timeout,
            self.lock_timeout,
            self.idle_in_transaction_session_timeout,
        )
    }
}

/// Configuration for connecting to a Postgres database.
///
/// This intentionally does not implement [`Serialize`] so the password cannot leak into
/// serialized forms. The password is redacted in debug output.
#[derive(Debug, Clone, Deserialize)]
pub struct PgConnectionConfig {
    /// Hostname or IP address of the Postgres server.
    pub host: String,
    /// Port number on which the Postgres server is listening.
    pub port: u16,
    /// Name of the Postgres database to connect to.
    pub name: String,
    /// Username for authenticating with the Postgres server.
    pub username: String,
    /// Password for the specified user.
    pub password: Option<SecretString>,
    /// TLS configuration for secure connections.
    #[serde(default)]
    pub tls: TlsConfig,
}

impl PgConnectionConfig {
    /// Validates the [`PgConnectionConfig`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyField("host"));
        }

        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }

        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyField("username"));
        }

        if self.port == 0 {
            return Err(ValidationError::PortZero);
        }

        self.tls.validate()
    }

    /// Renders the connection as a libpq keyword/value string.
    ///
    /// This is the form DuckDB's `postgres` extension expects in `ATTACH`. Values containing
    /// whitespace, quotes or backslashes are single-quoted with backslash escapes. The result
    /// contains the password in clear text and must not be logged.
    pub fn to_libpq_conninfo(&self) -> String {
        let mut pairs = vec![
            ("dbname", self.name.clone()),
            ("user", self.username.clone()),
        ];

        if let Some(password) = &self.password {
            pairs.push(("password", password.expose_secret().to_owned()));
        }

        pairs.push(("host", self.host.clone()));
        pairs.push(("port", self.port.to_string()));

        if self.tls.enabled {
            pairs.push(("sslmode", "require".to_owned()));
        }

        pairs
            .into_iter()
            .map(|(key, value)| format!("{key}={}", quote_libpq_value(&value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quotes a libpq conninfo value when it would otherwise be split or misparsed.
fn quote_libpq_value(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');

    if !needs_quoting {
        return value.to_owned();
    }

    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// TLS settings for secure Postgres connections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TlsConfig {
    /// PEM-encoded trusted root certificates.
    #[serde(default)]
    pub trusted_root_certs: String,
    /// Whether TLS is enabled for the connection.
    #[serde(default)]
    pub enabled: bool,
}

impl TlsConfig {
    /// Returns a configuration with TLS turned off.
    pub fn disabled() -> Self {
        Self {
            trusted_root_certs: String::new(),
            enabled: false,
        }
    }

    /// Checks that trusted root certificates are present when TLS is enabled.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

/// Converts [`PgConnectionConfig`] into client-library specific connect options.
pub trait IntoConnectOptions<Output> {
    /// Creates connect options without selecting a database.
    fn without_db(&self, options: Option<&PgConnectionOptions>) -> Output;

    /// Creates connect options for the configured database.
    fn with_db(&self, options: Option<&PgConnectionOptions>) -> Output;
}

impl IntoConnectOptions<TokioPgConnectOptions> for PgConnectionConfig {
    fn without_db(&self, options: Option<&PgConnectionOptions>) -> TokioPgConnectOptions {
        let ssl_mode = if self.tls.enabled {
            TokioPgSslMode::Require
        } else {
            TokioPgSslMode::Prefer
        };

        let mut config = TokioPgConnectOptions::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.username)
            .ssl_mode(ssl_mode);

        if let Some(options) = options {
            config
                .options(&options.to_options_string())
                .application_name(&options.application_name);
        }

        if let Some(password) = &self.password {
            config.password(password.expose_secret());
        }

        config
    }

    fn with_db(&self, options: Option<&PgConnectionOptions>) -> TokioPgConnectOptions {
        let mut config: TokioPgConnectOptions = self.without_db(options);
        config.dbname(&self.name);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config(password: Option<&str>) -> PgConnectionConfig {
        PgConnectionConfig {
            host: "127.0.0.1".to_string(),
            port: 5432,
            name: "mydb".to_string(),
            username: "postgres".to_string(),
            password: password.map(|p| SecretString::from(p.to_string())),
            tls: TlsConfig::disabled(),
        }
    }

    #[test]
    fn test_conninfo_for_local_database() {
        let config = local_config(Some("postgres"));

        assert_eq!(
            config.to_libpq_conninfo(),
            "dbname=mydb user=postgres password=postgres host=127.0.0.1 port=5432"
        );
    }

    #[test]
    fn test_conninfo_without_password() {
        let config = local_config(None);

        assert_eq!(
            config.to_libpq_conninfo(),
            "dbname=mydb user=postgres host=127.0.0.1 port=5432"
        );
    }

    #[test]
    fn test_conninfo_quotes_special_values() {
        let config = local_config(Some("it's a \\secret"));

        assert_eq!(
            config.to_libpq_conninfo(),
            "dbname=mydb user=postgres password='it\\'s a \\\\secret' host=127.0.0.1 port=5432"
        );
    }

    #[test]
    fn test_conninfo_requires_ssl_when_tls_enabled() {
        let mut config = local_config(None);
        config.tls = TlsConfig {
            trusted_root_certs: "cert".to_string(),
            enabled: true,
        };

        assert!(config.to_libpq_conninfo().ends_with(" sslmode=require"));
    }

    #[test]
    fn test_validate_rejects_incomplete_config() {
        let mut config = local_config(None);
        config.host = " ".to_string();
        assert_eq!(config.validate(), Err(ValidationError::EmptyField("host")));

        let mut config = local_config(None);
        config.port = 0;
        assert_eq!(config.validate(), Err(ValidationError::PortZero));

        let mut config = local_config(None);
        config.tls.enabled = true;
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingTrustedRootCerts)
        );

        assert_eq!(local_config(Some("pw")).validate(), Ok(()));
    }

    #[test]
    fn test_password_is_redacted_in_debug_output() {
        let config = local_config(Some("hunter2"));

        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_options_string_format() {
        let options = EXPORT_PROVISIONING_OPTIONS.to_options_string();

        assert!(options.starts_with("-c datestyle=ISO -c intervalstyle=postgres"));
        assert!(options.contains("-c statement_timeout=30000"));
    }
}
