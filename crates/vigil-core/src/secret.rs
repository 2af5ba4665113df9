//! Bounded buffer for the secret being typed

use zeroize::Zeroize;

use crate::SECRET_CAPACITY;

/// Fixed-capacity byte buffer holding the candidate secret
///
/// Appends that would overflow the buffer are dropped whole. Every clear
/// zeroes the backing storage, and so does drop.
pub struct SecretBuffer {
    bytes: [u8; SECRET_CAPACITY],
    len: usize,
}

impl SecretBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            bytes: [0u8; SECRET_CAPACITY],
            len: 0,
        }
    }

    /// Append bytes if they fit, returning whether they were accepted
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        if chunk.is_empty() || self.len + chunk.len() > SECRET_CAPACITY {
            return false;
        }
        self.bytes[self.len..self.len + chunk.len()].copy_from_slice(chunk);
        self.len += chunk.len();
        true
    }

    /// Remove the last byte; no-op when empty
    pub fn pop(&mut self) {
        if self.len > 0 {
            self.len -= 1;
            self.bytes[self.len] = 0;
        }
    }

    /// Empty the buffer and zero its storage
    pub fn clear(&mut self) {
        self.bytes.zeroize();
        self.len = 0;
    }

    /// Current contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        SECRET_CAPACITY
    }
}

impl Default for SecretBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBuffer")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
