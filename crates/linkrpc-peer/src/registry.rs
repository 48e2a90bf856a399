use crate::error::{Result, RpcError};

/// A slave-side procedure.
///
/// Receives the command payload and appends the response into the endpoint's
/// response buffer. The response is shipped back once the callback returns;
/// nothing borrowed from the input may be retained.
pub type Callback = Box<dyn FnMut(&[u8], &mut Vec<u8>)>;

struct Entry {
    key: u32,
    callback: Callback,
}

/// Fixed-capacity command dispatch table.
///
/// Registration upserts: a matching key overwrites in place without
/// consuming a slot, so re-registering a name is always allowed. Lookup is a
/// linear scan — the table is small and scanned once per call.
pub struct CallbackRegistry {
    entries: Vec<Entry>,
    capacity: usize,
}

impl CallbackRegistry {
    /// Create an empty registry holding at most `capacity` commands.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Register or replace the callback for `key`.
    pub fn register(&mut self, key: u32, callback: Callback) -> Result<()> {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.callback = callback;
            return Ok(());
        }

        if self.entries.len() < self.capacity {
            self.entries.push(Entry { key, callback });
            return Ok(());
        }

        Err(RpcError::RegistryFull(self.capacity))
    }

    /// Look up the callback registered for `key`.
    pub fn lookup_mut(&mut self, key: u32) -> Option<&mut Callback> {
        self.entries
            .iter_mut()
            .find(|entry| entry.key == key)
            .map(|entry| &mut entry.callback)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of commands.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
