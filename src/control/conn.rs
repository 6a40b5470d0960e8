//! Accepted control connection

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, UnixStream};

/// A connection accepted on a control endpoint
#[derive(Debug)]
pub enum ControlConn {
    /// Connection on a Unix domain socket
    Unix(UnixStream),
    /// Connection on a loopback TCP listener
    Tcp(TcpStream),
}

impl AsyncRead for ControlConn {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ControlConn::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
            ControlConn::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ControlConn {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            ControlConn::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
            ControlConn::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ControlConn::Unix(stream) => Pin::new(stream).poll_flush(cx),
            ControlConn::Tcp(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ControlConn::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
            ControlConn::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}
