use std::fmt;
use std::fs::DirBuilder;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Listening endpoint for the gateway transport.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket at the given path.
    Unix { path: Utf8PathBuf },
    /// TCP socket bound to `host:port`.
    Tcp { host: String, port: u16 },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Socket path for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the parent directory of a Unix socket with owner-only access.
    ///
    /// TCP endpoints need no filesystem preparation and return immediately.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
            return Err(SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        builder
            .create(parent.as_std_path())
            .map_err(|source| SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => match url.path() {
                "" => Err(SocketParseError::MissingUnixPath(input.to_owned())),
                path => Ok(Self::unix(path)),
            },
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| SocketParseError::MissingPort(input.to_owned()))?;
                Ok(Self::tcp(host, port))
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was neither `tcp` nor `unix`.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// Unix socket path was empty.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// Text was not a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised while preparing the directory of a Unix socket.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// Socket path has no parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    /// Creating the parent directory failed.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("tcp://127.0.0.1:8889", SocketEndpoint::tcp("127.0.0.1", 8889))]
    #[case("unix:///run/portico/proxy.sock", SocketEndpoint::unix("/run/portico/proxy.sock"))]
    fn parses_supported_schemes(#[case] input: &str, #[case] expected: SocketEndpoint) {
        let endpoint: SocketEndpoint = input.parse().expect("endpoint should parse");
        assert_eq!(endpoint, expected);
        assert_eq!(endpoint.to_string(), input);
    }

    #[rstest]
    #[case("http://127.0.0.1:80")]
    #[case("tcp://127.0.0.1")]
    #[case("not a url")]
    fn rejects_malformed_endpoints(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err());
    }

    #[test]
    fn prepares_unix_socket_parent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = dir.path().join("nested").join("proxy.sock");
        let endpoint = SocketEndpoint::unix(socket.to_str().expect("utf8 path"));

        endpoint.prepare_filesystem().expect("prepare parent");
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn tcp_endpoints_need_no_preparation() {
        SocketEndpoint::tcp("127.0.0.1", 0)
            .prepare_filesystem()
            .expect("tcp endpoints are ready");
    }
}
