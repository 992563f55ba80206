//! Connection handling for the gateway listener.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use tracing::warn;

use super::TRANSPORT_TARGET;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Stream types accepted by the gateway listener.
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Answers every request line with the same pre-rendered status document.
#[derive(Debug, Clone)]
pub(crate) struct StatusHandler {
    response: Arc<[u8]>,
}

impl StatusHandler {
    /// `response` must already be newline-terminated.
    pub(crate) fn new(response: impl Into<Arc<[u8]>>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl ConnectionHandler for StatusHandler {
    fn handle(&self, stream: ConnectionStream) {
        let mut reader = BufReader::new(stream);
        loop {
            match read_request_line(&mut reader) {
                Ok(Some(_)) => {}
                Ok(None) => return,
                Err(error) => {
                    warn!(
                        target: TRANSPORT_TARGET,
                        error = %error,
                        "connection handler error"
                    );
                    return;
                }
            }

            let stream = reader.get_mut();
            if let Err(error) = stream
                .write_all(&self.response)
                .and_then(|()| stream.flush())
            {
                warn!(
                    target: TRANSPORT_TARGET,
                    error = %error,
                    "connection handler error"
                );
                return;
            }
        }
    }
}

/// Reads one newline-terminated request, or the trailing bytes before EOF.
fn read_request_line<R: BufRead>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let limit = u64::try_from(MAX_REQUEST_BYTES + 1).unwrap_or(u64::MAX);
    let read = reader.by_ref().take(limit).read_until(b'\n', &mut line)?;
    if read == 0 {
        return Ok(None);
    }
    if line.len() > MAX_REQUEST_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "request exceeds maximum size",
        ));
    }
    Ok(Some(line))
}
