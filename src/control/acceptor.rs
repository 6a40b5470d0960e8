//! Control acceptor for Unix sockets and loopback TCP
//!
//! A single background task owns the listener and forwards every accept
//! outcome into one of two channels. [`ControlAcceptor::accept`] waits on
//! both and returns whichever value arrives first.

use crate::config::DEFAULT_SOCKET_DIR;
use crate::control::{ControlAddr, ControlConn};
use crate::error::{Result, TunnelError};
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use tokio::net::{TcpListener, UnixListener, UnixStream};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};

/// Accepts control connections through a background accept loop
#[derive(Debug)]
pub struct ControlAcceptor {
    /// Address the listener is bound to
    local_addr: ControlAddr,
    /// Consumer ends of the forwarding channels
    channels: Mutex<AcceptChannels>,
    /// Set to `true` to stop the accept loop
    shutdown: watch::Sender<bool>,
}

#[derive(Debug)]
struct AcceptChannels {
    conn_rx: mpsc::UnboundedReceiver<ControlConn>,
    err_rx: mpsc::UnboundedReceiver<TunnelError>,
}

impl ControlAcceptor {
    /// Listen on a named endpoint, resolving names in the default socket directory
    pub async fn listen(name: &str) -> Result<Self> {
        Self::bind(ControlAddr::resolve(name, Path::new(DEFAULT_SOCKET_DIR))).await
    }

    /// Bind `addr` and start the accept loop
    ///
    /// Must be called from within a tokio runtime.
    pub async fn bind(addr: ControlAddr) -> Result<Self> {
        let listener = Listener::bind(&addr).await?;
        let local_addr = listener.local_addr().map_err(TunnelError::Listener)?;

        let (conn_tx, conn_rx) = mpsc::unbounded_channel();
        let (err_tx, err_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        info!("Control acceptor listening at {}", local_addr);
        tokio::spawn(accept_loop(listener, conn_tx, err_tx, shutdown_rx));

        Ok(Self {
            local_addr,
            channels: Mutex::new(AcceptChannels { conn_rx, err_rx }),
            shutdown,
        })
    }

    /// Wait for the next connection or listener error
    ///
    /// Queued connections are returned before a queued error. Once the
    /// accept loop has stopped and everything it forwarded has been consumed,
    /// this returns [`TunnelError::ListenerClosed`] immediately.
    pub async fn accept(&self) -> Result<ControlConn> {
        let mut channels = self.channels.lock().await;
        let AcceptChannels { conn_rx, err_rx } = &mut *channels;

        tokio::select! {
            biased;
            Some(conn) = conn_rx.recv() => Ok(conn),
            Some(err) = err_rx.recv() => Err(err),
            else => Err(TunnelError::ListenerClosed),
        }
    }

    /// Stop the accept loop and release the listener
    ///
    /// Connections already returned by [`accept`](Self::accept) are not
    /// affected. Calling this more than once is harmless.
    pub fn close(&self) -> Result<()> {
        if !self.shutdown.send_replace(true) {
            info!("Closing control acceptor at {}", self.local_addr);
        }
        Ok(())
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> &ControlAddr {
        &self.local_addr
    }
}

impl Drop for ControlAcceptor {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

/// Forward accept outcomes until shutdown or the first accept failure
async fn accept_loop(
    listener: Listener,
    conn_tx: mpsc::UnboundedSender<ControlConn>,
    err_tx: mpsc::UnboundedSender<TunnelError>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                debug!("Control accept loop received shutdown");
                let _ = err_tx.send(TunnelError::ListenerClosed);
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok(conn) => {
                        debug!("Accepted control connection");
                        if conn_tx.send(conn).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to accept control connection: {}", e);
                        let _ = err_tx.send(TunnelError::Listener(e));
                        break;
                    }
                }
            }
        }
    }

    debug!("Control accept loop stopped");
}

/// Listener owned by the accept loop
enum Listener {
    Unix { listener: UnixListener, path: PathBuf },
    Tcp(TcpListener),
}

impl Listener {
    async fn bind(addr: &ControlAddr) -> Result<Self> {
        match addr {
            ControlAddr::Unix(path) => {
                prepare_socket_path(path)
                    .await
                    .map_err(TunnelError::Listener)?;
                let listener = UnixListener::bind(path).map_err(TunnelError::Listener)?;
                Ok(Listener::Unix {
                    listener,
                    path: path.clone(),
                })
            }
            ControlAddr::Tcp(addr) => {
                if !addr.ip().is_loopback() {
                    return Err(TunnelError::Listener(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("control endpoint {} is not a loopback address", addr),
                    )));
                }
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(TunnelError::Listener)?;
                Ok(Listener::Tcp(listener))
            }
        }
    }

    fn local_addr(&self) -> io::Result<ControlAddr> {
        match self {
            Listener::Unix { path, .. } => Ok(ControlAddr::Unix(path.clone())),
            Listener::Tcp(listener) => listener.local_addr().map(ControlAddr::Tcp),
        }
    }

    async fn accept(&self) -> io::Result<ControlConn> {
        match self {
            Listener::Unix { listener, .. } => {
                listener.accept().await.map(|(stream, _)| ControlConn::Unix(stream))
            }
            Listener::Tcp(listener) => {
                listener.accept().await.map(|(stream, _)| ControlConn::Tcp(stream))
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Listener::Unix { path, .. } = self {
            if let Err(e) = std::fs::remove_file(&*path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove control socket {:?}: {}", path, e);
                }
            }
        }
    }
}

/// Clear a stale socket file and create the parent directory
///
/// Only a socket that refuses connections is removed. A socket that still
/// accepts connections belongs to a live listener, and anything that is not a
/// socket is left alone; both are reported as `AddrInUse`.
async fn prepare_socket_path(path: &Path) -> io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_socket() => {
            if UnixStream::connect(path).await.is_ok() {
                return Err(io::Error::new(
                    io::ErrorKind::AddrInUse,
                    format!("control socket {:?} is already in use", path),
                ));
            }
            info!("Removing stale control socket at {:?}", path);
            std::fs::remove_file(path)?;
        }
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AddrInUse,
                format!("{:?} exists and is not a socket", path),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(())
}
