//! Blake3 hashing for structural identities.
//!
//! Build targets are keyed by a hash over their configuration. Fields are
//! length-prefixed so that `["ab", "c"]` and `["a", "bc"]` never collide.

/// Compute Blake3 hash of data as lowercase hex
pub fn blake3_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Incremental hasher over labelled, length-prefixed fields
pub struct IdentityHasher {
    inner: blake3::Hasher,
}

impl IdentityHasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Feed a single string field
    pub fn field(&mut self, value: &str) -> &mut Self {
        self.inner.update(&(value.len() as u64).to_le_bytes());
        self.inner.update(value.as_bytes());
        self
    }

    /// Feed a list field; element order is significant
    pub fn list<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: Vec<S> = values.into_iter().collect();
        self.inner.update(&(values.len() as u64).to_le_bytes());
        for value in &values {
            self.field(value.as_ref());
        }
        self
    }

    pub fn finish(&self) -> String {
        self.inner.finalize().to_hex().to_string()
    }
}

impl Default for IdentityHasher {
    fn default() -> Self {
        Self::new()
    }
}
