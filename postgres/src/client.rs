use std::io::BufReader;

use config::shared::{IntoConnectOptions, PgConnectionConfig, PgConnectionOptions};
use rustls::ClientConfig;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, Config, Connection, NoTls, Socket};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{Instrument, error, info};

/// Errors raised while establishing a Postgres connection.
#[derive(Debug, Error)]
pub enum PgConnectError {
    /// The server could not be reached or rejected the session.
    #[error("postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    /// The trusted root certificates could not be read.
    #[error("failed to read trusted root certificates: {0}")]
    Certificates(#[from] std::io::Error),
    /// A trusted root certificate was rejected by rustls.
    #[error("invalid tls configuration: {0}")]
    Tls(#[from] rustls::Error),
}

/// A Postgres client together with the task driving its connection.
///
/// Call [`PgClient::close`] to drop the client and wait for the connection task to finish.
#[derive(Debug)]
pub struct PgClient {
    client: Client,
    connection: JoinHandle<()>,
}

impl PgClient {
    /// Connects to the configured database, using TLS when enabled in `pg_connection_config`.
    pub async fn connect(
        pg_connection_config: &PgConnectionConfig,
        options: Option<&PgConnectionOptions>,
    ) -> Result<Self, PgConnectError> {
        let config: Config = pg_connection_config.with_db(options);

        if pg_connection_config.tls.enabled {
            let tls_config = build_tls_config(&pg_connection_config.tls.trusted_root_certs)?;
            let (client, connection) = config.connect(MakeRustlsConnect::new(tls_config)).await?;
            let connection = spawn_postgres_connection::<MakeRustlsConnect>(connection);

            info!(host = %pg_connection_config.host, "connected to postgres with tls");

            Ok(Self { client, connection })
        } else {
            let (client, connection) = config.connect(NoTls).await?;
            let connection = spawn_postgres_connection::<NoTls>(connection);

            info!(host = %pg_connection_config.host, "connected to postgres without tls");

            Ok(Self { client, connection })
        }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns mutable access to the underlying client, needed to open transactions.
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Closes the connection and waits for the connection task to terminate.
    pub async fn close(self) {
        drop(self.client);

        if let Err(err) = self.connection.await {
            error!("postgres connection task failed to join: {}", err);
        }
    }
}

/// Builds a rustls client configuration trusting the PEM-encoded roots in `trusted_root_certs`.
fn build_tls_config(trusted_root_certs: &str) -> Result<ClientConfig, PgConnectError> {
    let mut root_store = rustls::RootCertStore::empty();
    let mut root_certs_reader = BufReader::new(trusted_root_certs.as_bytes());
    for cert in rustls_pemfile::certs(&mut root_certs_reader) {
        root_store.add(cert?)?;
    }

    Ok(ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth())
}

/// Spawns a task driving a Postgres connection until it terminates.
fn spawn_postgres_connection<T>(connection: Connection<Socket, T::Stream>) -> JoinHandle<()>
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let span = tracing::Span::current();
    let task = async move {
        match connection.await {
            Err(err) => error!("an error occurred during the postgres connection: {}", err),
            Ok(()) => info!("postgres connection terminated successfully"),
        }
    }
    .instrument(span);

    tokio::spawn(task)
}
