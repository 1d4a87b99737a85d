//! Canonical, process-stable hashing of [`Key`]s.

use md5::{Digest, Md5};

use crate::Key;

/// MD5 digest of a [`Key`]'s canonical string rendering, hex-encoded.
///
/// Implementations must agree byte-for-byte across processes; this renders
/// `dim=val;dim2=val2;...` with dimensions sorted, the same format
/// `Key`'s `Display` impl produces.
pub type KeyHash = String;

/// Computes the canonical hash of `key`.
pub fn canonical_hash(key: &Key) -> KeyHash {
    let mut hasher = Md5::new();
    hasher.update(key.to_string().as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
