//! Interface status file parsing
//!
//! The status file of an ipifc interface is newline separated. Its first line
//! is a run of whitespace separated fields, the fourth of which is the MTU.

use crate::error::{Result, TunnelError};

/// Index of the MTU field on the first status line
const MTU_FIELD: usize = 3;

/// Extract the MTU from the contents of an interface status file
pub fn parse_mtu(status: &str) -> Result<u32> {
    let first_line = status.split('\n').next().unwrap_or_default();
    let fields: Vec<&str> = first_line.split_whitespace().collect();

    let field = fields.get(MTU_FIELD).ok_or_else(|| {
        TunnelError::StatusFormat(format!(
            "expected at least {} fields on first status line, found {}",
            MTU_FIELD + 1,
            fields.len()
        ))
    })?;

    field.parse::<u32>().map_err(|e| {
        TunnelError::StatusFormat(format!("MTU field {:?} is not a number: {}", field, e))
    })
}
