//! Control/data handle pair owned by a tunnel device

use crate::error::{Result, TunnelError};
use std::fs::File;
use std::io;
use std::os::unix::io::IntoRawFd;
use tracing::warn;

/// The two files opened against one interface instance
///
/// Both are released together by [`HandlePair::close`]. Once closed, every
/// accessor fails with [`io::ErrorKind::NotConnected`].
#[derive(Debug)]
pub(crate) struct HandlePair {
    ctl: Option<File>,
    data: Option<File>,
}

impl HandlePair {
    pub(crate) fn new(ctl: File, data: File) -> Self {
        Self {
            ctl: Some(ctl),
            data: Some(data),
        }
    }

    pub(crate) fn ctl(&mut self) -> io::Result<&mut File> {
        self.ctl.as_mut().ok_or_else(closed_error)
    }

    pub(crate) fn data(&mut self) -> io::Result<&mut File> {
        self.data.as_mut().ok_or_else(closed_error)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.ctl.is_none() && self.data.is_none()
    }

    /// Close the data handle, then the control handle
    ///
    /// Both closes are attempted even if the first fails. Closing an already
    /// closed pair is a no-op.
    pub(crate) fn close(&mut self) -> Result<()> {
        let data = self.data.take().and_then(|f| close_file(f).err());
        let control = self.ctl.take().and_then(|f| close_file(f).err());

        if data.is_none() && control.is_none() {
            Ok(())
        } else {
            Err(TunnelError::Teardown { data, control })
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "tunnel device is closed")
}

/// Close a file and report the result of close(2), which `Drop` discards
pub(crate) fn close_file(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    // SAFETY: `fd` was released from an owned `File` and is closed exactly once.
    if unsafe { libc::close(fd) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Close files left over from a failed construction, logging close failures
pub(crate) fn abandon(files: impl IntoIterator<Item = File>) {
    for file in files {
        if let Err(e) = close_file(file) {
            warn!("Failed to close handle after aborted device creation: {}", e);
        }
    }
}
