//! MongoDB client bootstrap for the persistence layer.
//!
//! The driver owns its own connection pool; this module only resolves the
//! configured database, verifies reachability with a `ping`, and hands out
//! collection handles. Pool sizing is left at driver defaults.

use mongodb::bson::doc;
use mongodb::{Client, Collection, Database};
use tracing::info;

use super::documents::StudentDocument;

/// Name of the collection holding student documents.
pub const STUDENTS_COLLECTION: &str = "students";

/// Errors that can occur while establishing the store connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The connection string could not be parsed or the client not built.
    #[error("failed to configure document store client: {message}")]
    Configure { message: String },

    /// The server did not answer the `ping` command.
    #[error("document store is unreachable: {message}")]
    Unreachable { message: String },
}

impl StoreError {
    /// Create a configuration error with the given message.
    pub fn configure(message: impl Into<String>) -> Self {
        Self::Configure {
            message: message.into(),
        }
    }

    /// Create an unreachable error with the given message.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }
}

/// Connection settings for the document store.
///
/// # Example
///
/// ```
/// use student_records::outbound::persistence::StoreConfig;
///
/// let config = StoreConfig::new("mongodb://localhost:27017").with_database("school");
/// assert_eq!(config.database_name(), "school");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    url: String,
    database_name: String,
}

impl StoreConfig {
    /// Default database used when none is configured.
    pub const DEFAULT_DATABASE: &'static str = "student_db";

    /// Create a configuration for the given connection string.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database_name: Self::DEFAULT_DATABASE.to_owned(),
        }
    }

    /// Select the database holding the students collection.
    pub fn with_database(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = database_name.into();
        self
    }

    /// Connection string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Database name.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }
}

/// Handle to the configured MongoDB database.
///
/// Cloning is cheap: the driver client is reference counted internally.
#[derive(Clone, Debug)]
pub struct StoreClient {
    client: Client,
    database: Database,
}

impl StoreClient {
    /// Build a client and verify the server answers a `ping`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configure`] for an invalid connection string and
    /// [`StoreError::Unreachable`] when the server cannot be reached.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(config.url())
            .await
            .map_err(|err| StoreError::configure(err.to_string()))?;
        let store = Self {
            database: client.database(config.database_name()),
            client,
        };
        store.ping().await?;
        info!(database = config.database_name(), "connected to document store");
        Ok(store)
    }

    /// Round-trip a `ping` command to the server.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unreachable`] when the command fails.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|err| StoreError::unreachable(err.to_string()))
    }

    /// Close pooled connections and stop background monitoring.
    ///
    /// Waits for outstanding cursors and sessions to be dropped first.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("document store client shut down");
    }

    /// Typed handle to the students collection.
    pub(crate) fn students(&self) -> Collection<StudentDocument> {
        self.database.collection(STUDENTS_COLLECTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn store_config_defaults_database_name() {
        let config = StoreConfig::new("mongodb://localhost:27017");

        assert_eq!(config.url(), "mongodb://localhost:27017");
        assert_eq!(config.database_name(), StoreConfig::DEFAULT_DATABASE);
    }

    #[rstest]
    fn store_error_display() {
        let configure = StoreError::configure("invalid scheme");
        let unreachable = StoreError::unreachable("connection refused");

        assert!(configure.to_string().contains("invalid scheme"));
        assert!(unreachable.to_string().contains("connection refused"));
    }

    #[rstest]
    #[tokio::test]
    async fn connect_rejects_malformed_connection_strings() {
        let config = StoreConfig::new("postgres://localhost/students");
        let result = StoreClient::connect(&config).await;
        assert!(matches!(result, Err(StoreError::Configure { .. })));
    }
}
