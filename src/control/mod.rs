//! Control endpoint for external configuration clients
//!
//! This module binds the control socket (a Unix socket on a path, or a
//! loopback TCP address) and turns its accept loop into a repeatable
//! [`ControlAcceptor::accept`] call.

mod acceptor;
mod addr;
mod conn;

pub use acceptor::ControlAcceptor;
pub use addr::ControlAddr;
pub use conn::ControlConn;
