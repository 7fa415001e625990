//! Application settings and the HTTP server configuration built from them.

use std::io;
use std::net::SocketAddr;

use actix_web::http::Uri;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};

use student_records::inbound::http::state::HttpState;
use student_records::outbound::persistence::StoreConfig;

const DEFAULT_MONGODB_URL: &str = "mongodb://localhost:27017";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Start-up settings loaded via OrthoConfig from `STUDENTS_*` environment
/// variables, command-line flags or a configuration file.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STUDENTS")]
pub struct AppSettings {
    /// MongoDB connection string.
    pub mongodb_url: Option<String>,
    /// Database holding the `students` collection.
    pub database_name: Option<String>,
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<String>,
    /// CORS origins, given as a list or a comma-separated string.
    #[serde(default, deserialize_with = "origin_list")]
    #[ortho_config(
        default = vec![DEFAULT_ALLOWED_ORIGINS.to_owned()],
        merge_strategy = "replace"
    )]
    pub allowed_origins: Vec<String>,
    /// Requests per minute allowed per client; `0` disables limiting.
    #[ortho_config(default = DEFAULT_REQUESTS_PER_MINUTE)]
    pub requests_per_minute: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accepts a single value or a list.
fn origin_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(raw) => vec![raw],
        OneOrMany::Many(list) => list,
    })
}

impl AppSettings {
    /// MongoDB connection string, falling back to a local server.
    pub fn mongodb_url(&self) -> &str {
        self.mongodb_url.as_deref().unwrap_or(DEFAULT_MONGODB_URL)
    }

    /// Database name, falling back to `student_db`.
    pub fn database_name(&self) -> &str {
        self.database_name
            .as_deref()
            .unwrap_or(StoreConfig::DEFAULT_DATABASE)
    }

    /// Per-client request quota.
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Document store connection settings.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.mongodb_url()).with_database(self.database_name())
    }

    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] when the value is not a socket
    /// address.
    pub fn bind_addr(&self) -> io::Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid bind address {raw:?}: {err}"),
            )
        })
    }

    /// Split and validate the configured CORS origins.
    ///
    /// `*` is accepted as a wildcard; every other entry must be an absolute
    /// origin such as `https://school.example`. An empty list falls back to
    /// the local front-end origin.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] for an entry without scheme or
    /// host.
    pub fn allowed_origins(&self) -> io::Result<Vec<String>> {
        let origins: Vec<&str> = self
            .allowed_origins
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .collect();
        if origins.is_empty() {
            return Ok(vec![DEFAULT_ALLOWED_ORIGINS.to_owned()]);
        }
        origins
            .into_iter()
            .map(|origin| {
                if origin == "*" || is_absolute_origin(origin) {
                    Ok(origin.trim_end_matches('/').to_owned())
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid CORS origin {origin:?}"),
                    ))
                }
            })
            .collect()
    }
}

fn is_absolute_origin(origin: &str) -> bool {
    origin
        .parse::<Uri>()
        .is_ok_and(|uri| uri.scheme().is_some() && uri.host().is_some())
}

/// Configuration consumed by [`super::create_server`].
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) allowed_origins: Vec<String>,
    pub(crate) requests_per_minute: u32,
    pub(crate) http_state: HttpState,
}

impl ServerConfig {
    /// Construct a server configuration for the given handler state.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, http_state: HttpState) -> Self {
        Self {
            bind_addr,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGINS.to_owned()],
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            http_state,
        }
    }

    /// Replace the CORS origin allow-list.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Set the per-client quota; `0` disables limiting.
    #[must_use]
    pub fn with_requests_per_minute(mut self, requests: u32) -> Self {
        self.requests_per_minute = requests;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 5] = [
        "STUDENTS_MONGODB_URL",
        "STUDENTS_DATABASE_NAME",
        "STUDENTS_BIND_ADDR",
        "STUDENTS_ALLOWED_ORIGINS",
        "STUDENTS_REQUESTS_PER_MINUTE",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("student-records")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.mongodb_url(), DEFAULT_MONGODB_URL);
        assert_eq!(settings.database_name(), "student_db");
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            "0.0.0.0:8000".parse::<SocketAddr>().expect("socket address")
        );
        assert_eq!(
            settings.allowed_origins().expect("default origins"),
            ["http://localhost:3000"]
        );
        assert_eq!(settings.requests_per_minute(), 60);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("STUDENTS_MONGODB_URL", Some("mongodb://db:27017".to_owned())),
            ("STUDENTS_DATABASE_NAME", Some("school".to_owned())),
            ("STUDENTS_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "STUDENTS_ALLOWED_ORIGINS",
                Some("https://a.example, https://b.example/".to_owned()),
            ),
            ("STUDENTS_REQUESTS_PER_MINUTE", Some("0".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.store_config().url(), "mongodb://db:27017");
        assert_eq!(settings.store_config().database_name(), "school");
        assert_eq!(
            settings.bind_addr().expect("override parses").port(),
            9000
        );
        assert_eq!(
            settings.allowed_origins().expect("valid origins"),
            ["https://a.example", "https://b.example"]
        );
        assert_eq!(settings.requests_per_minute(), 0);
    }

    #[rstest]
    fn single_origin_is_accepted_from_the_environment() {
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "STUDENTS_ALLOWED_ORIGINS")
                .then(|| "https://school.example".to_owned());
            (name, value)
        }));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.allowed_origins().expect("valid origin"),
            ["https://school.example"]
        );
        assert_eq!(settings.requests_per_minute(), DEFAULT_REQUESTS_PER_MINUTE);
    }

    #[rstest]
    fn invalid_bind_address_is_rejected() {
        let _guard = lock_env([("STUDENTS_BIND_ADDR", Some("localhost".to_owned()))]);

        let error = load_from_empty_args()
            .bind_addr()
            .expect_err("missing port");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[rstest]
    #[case("localhost:3000")]
    #[case("not an origin")]
    fn invalid_origins_are_rejected(#[case] origin: &str) {
        let settings = AppSettings {
            mongodb_url: None,
            database_name: None,
            bind_addr: None,
            allowed_origins: vec!["https://ok.example".to_owned(), origin.to_owned()],
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        };
        assert!(settings.allowed_origins().is_err());
    }
}
