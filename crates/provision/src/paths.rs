//! Host/guest path resolution
//!
//! Host paths are shared into the guest under the scratch directory at a
//! mount point named after a digest of the path string. The VM layer keys
//! synced folders on that mount point, so the same host path must land on
//! the same guest path on every run.

use crate::types::{PathKind, TaggedPath, join_guest};

/// Width of the hex key used in mount point names
pub const KEY_WIDTH: usize = 32;

/// Fixed-width hex digest of a path string.
///
/// Only the string is hashed, never the directory contents or metadata.
pub fn stable_hash(path: &str) -> String {
    let digest = blake3::hash(path.as_bytes());
    digest.to_hex().as_str()[..KEY_WIDTH].to_string()
}

/// Resolve a tagged path to the guest-absolute path the applier will see.
///
/// Guest paths are returned unchanged; host paths map to
/// `<temp_dir>/<kind>-<key>`.
pub fn resolve_guest_path(tagged: &TaggedPath, kind: PathKind, temp_dir: &str) -> String {
    match tagged {
        TaggedPath::Guest(path) => path.clone(),
        TaggedPath::Host(path) => {
            let guest = mount_point(path, kind, temp_dir);
            log::debug!("Resolved {} path {} to {}", kind, path, guest);
            guest
        }
    }
}

/// Guest mount point for a host path.
pub fn mount_point(host_path: &str, kind: PathKind, temp_dir: &str) -> String {
    join_guest(
        temp_dir,
        &format!("{}-{}", kind.as_str(), stable_hash(host_path)),
    )
}
