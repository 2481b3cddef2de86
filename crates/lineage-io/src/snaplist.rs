//! Snapshot expansion-factor lists
//!
//! Plain-text file with one expansion factor per snapshot, whitespace
//! separated, in snapshot order.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Read the expansion factors of every simulation snapshot.
pub fn read_snap_list(path: &Path) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path)?;
    let mut factors = Vec::new();
    for token in text.split_whitespace() {
        let a: f64 = token.parse().map_err(|_| Error::BadSnapList {
            path: path.to_path_buf(),
            message: format!("not a number: {token:?}"),
        })?;
        if a <= 0.0 || a > 1.0 {
            return Err(Error::BadSnapList {
                path: path.to_path_buf(),
                message: format!("expansion factor {a} outside (0, 1]"),
            });
        }
        factors.push(a);
    }
    if factors.is_empty() {
        return Err(Error::BadSnapList {
            path: path.to_path_buf(),
            message: "empty file".to_string(),
        });
    }
    debug!(path = %path.display(), snapshots = factors.len(), "snapshot list read");
    Ok(factors)
}
