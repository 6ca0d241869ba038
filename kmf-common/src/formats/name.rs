//! Fixed-width, null-padded name fields

use std::borrow::Cow;
use std::fmt;

use super::constants::{NAME_SIZE, PATH_SIZE};

/// Null-padded byte array of exactly `N` bytes
///
/// Construction truncates at a UTF-8 character boundary so the stored bytes
/// are always what ends up on disk. Reading trims at the first NUL.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedName<const N: usize> {
    bytes: [u8; N],
}

/// Node name field (20 bytes)
pub type NodeName = FixedName<NAME_SIZE>;
/// Mesh name field (20 bytes)
pub type MeshName = FixedName<NAME_SIZE>;
/// Slash-separated ancestor path (50 bytes)
pub type NodePath = FixedName<PATH_SIZE>;

impl<const N: usize> FixedName<N> {
    pub const SIZE: usize = N;

    /// Build from a string, truncating to `N` bytes
    ///
    /// Interior NULs end the name, matching what a reader will see.
    pub fn new(name: &str) -> Self {
        let name = name.split('\0').next().unwrap_or_default();
        let mut end = name.len().min(N);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = [0u8; N];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self { bytes }
    }

    /// Returns true if `name` fits without truncation
    pub fn fits(name: &str) -> bool {
        name.len() <= N && !name.contains('\0')
    }

    /// Read a field from its on-disk bytes
    ///
    /// Everything after the first NUL is dropped.
    pub fn from_bytes(raw: &[u8; N]) -> Self {
        let len = raw.iter().position(|&b| b == 0).unwrap_or(N);
        let mut bytes = [0u8; N];
        bytes[..len].copy_from_slice(&raw[..len]);
        Self { bytes }
    }

    /// On-disk bytes, padded with NULs
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Name bytes without padding
    pub fn trimmed(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    pub fn len(&self) -> usize {
        self.bytes.iter().position(|&b| b == 0).unwrap_or(N)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }

    /// Name as text; invalid UTF-8 from foreign files is replaced
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.trimmed())
    }
}

impl<const N: usize> Default for FixedName<N> {
    fn default() -> Self {
        Self { bytes: [0; N] }
    }
}

impl<const N: usize> From<&str> for FixedName<N> {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl<const N: usize> fmt::Display for FixedName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl<const N: usize> fmt::Debug for FixedName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}
