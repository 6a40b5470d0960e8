//! Tunnel device on the ipifc pseudo-filesystem
//!
//! A [`TunDevice`] owns the control and data handles of one virtual network
//! interface and exposes packet I/O, live MTU queries, a memoized name and
//! event/error channels for the owning daemon.

mod device;
mod handles;
mod name;
mod status;

pub use device::{DeviceConfig, TunDevice, TunEvent};
pub use name::NameCache;
pub use status::parse_mtu;
