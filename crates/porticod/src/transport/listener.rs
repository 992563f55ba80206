//! Socket listener backing the gateway transport.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use portico_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, ListenerError, TRANSPORT_TARGET};
#[cfg(unix)]
use super::OccupiedBy;

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

const IDLE_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Socket bound to the configured endpoint, not yet accepting.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    socket: BoundSocket,
}

#[derive(Debug)]
enum BoundSocket {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl BoundSocket {
    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(listener) => listener.set_nonblocking(true),
        }
    }

    /// Accepts one pending connection; `Ok(None)` when none is waiting.
    fn accept(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl SocketListener {
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let socket = match endpoint {
            SocketEndpoint::Tcp { host, port } => BoundSocket::Tcp(bind_tcp(endpoint, host, *port)?),
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => BoundSocket::Unix(bind_unix(path.as_std_path())?),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                return Err(ListenerError::bind(
                    endpoint,
                    io::Error::new(io::ErrorKind::Unsupported, "unix sockets are unavailable"),
                ));
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Bound TCP address; `None` for Unix sockets.
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.socket {
            BoundSocket::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            BoundSocket::Unix(_) => None,
        }
    }

    /// Moves the socket onto a background accept thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.socket.set_nonblocking() {
            remove_socket_file(&self.endpoint);
            return Err(ListenerError::bind(&self.endpoint, source));
        }
        let stop = Arc::new(AtomicBool::new(false));
        let accept_loop = AcceptLoop {
            listener: self,
            stop: Arc::clone(&stop),
            handler,
        };
        let thread = thread::spawn(move || accept_loop.run());
        Ok(ListenerHandle {
            stop,
            thread: Some(thread),
        })
    }
}

struct AcceptLoop {
    listener: SocketListener,
    stop: Arc<AtomicBool>,
    handler: Arc<dyn ConnectionHandler>,
}

impl AcceptLoop {
    fn run(self) {
        let endpoint = &self.listener.endpoint;
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %endpoint,
            "gateway listener active"
        );
        let mut served = 0_u64;
        let mut last_error = None::<io::ErrorKind>;
        while !self.stop.load(Ordering::SeqCst) {
            match self.listener.socket.accept() {
                Ok(Some(stream)) => {
                    last_error = None;
                    served += 1;
                    debug!(target: TRANSPORT_TARGET, served, "connection accepted");
                    let handler = Arc::clone(&self.handler);
                    thread::spawn(move || handler.handle(stream));
                }
                Ok(None) => thread::sleep(IDLE_BACKOFF),
                Err(error) => {
                    // Repeated failures of the same kind are logged once.
                    if last_error != Some(error.kind()) {
                        warn!(
                            target: TRANSPORT_TARGET,
                            error = %error,
                            "gateway accept error"
                        );
                    }
                    last_error = Some(error.kind());
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        remove_socket_file(endpoint);
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %endpoint,
            served,
            "gateway listener stopped"
        );
    }
}

/// Handle to the background accept thread.
///
/// Dropping the handle asks the thread to stop without waiting for it.
pub(crate) struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept thread to stop after its current iteration.
    pub(crate) fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stops the accept thread and waits for it to exit.
    pub(crate) fn stop(mut self) -> Result<(), ListenerError> {
        self.signal_stop();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

fn bind_tcp(
    endpoint: &SocketEndpoint,
    host: &str,
    port: u16,
) -> Result<TcpListener, ListenerError> {
    let resolve_error = |source: io::Error| ListenerError::Resolve {
        endpoint: endpoint.to_string(),
        source,
    };
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(resolve_error)?
        .next()
        .ok_or_else(|| {
            resolve_error(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no addresses resolved",
            ))
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::bind(endpoint, source))
}

#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    if let Some(occupant) = socket_path_occupant(path)? {
        return Err(ListenerError::Occupied {
            path: path.display().to_string(),
            occupant,
        });
    }
    UnixListener::bind(path).map_err(|source| ListenerError::bind(path.display(), source))
}

/// Clears a socket file left behind by a dead process.
///
/// Returns what still holds the path when it cannot be reclaimed.
#[cfg(unix)]
fn socket_path_occupant(path: &Path) -> Result<Option<OccupiedBy>, ListenerError> {
    let reclaim_error = |source: io::Error| ListenerError::Reclaim {
        path: path.display().to_string(),
        source,
    };
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(reclaim_error(error)),
    };
    if !metadata.file_type().is_socket() {
        return Ok(Some(OccupiedBy::OtherFile));
    }
    match UnixStream::connect(path) {
        Ok(_live) => Ok(Some(OccupiedBy::LiveSocket)),
        Err(error) if error.kind() == io::ErrorKind::ConnectionRefused => {
            debug!(target: TRANSPORT_TARGET, path = %path.display(), "removing stale socket");
            fs::remove_file(path).map_err(reclaim_error)?;
            Ok(None)
        }
        Err(error) => Err(reclaim_error(error)),
    }
}

#[cfg(unix)]
fn remove_socket_file(endpoint: &SocketEndpoint) {
    let Some(path) = endpoint.unix_path() else {
        return;
    };
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: TRANSPORT_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}

#[cfg(not(unix))]
fn remove_socket_file(_endpoint: &SocketEndpoint) {}
