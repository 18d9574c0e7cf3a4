use zeroize::{Zeroize, Zeroizing};

/// Sole owner of the currently revealed secret value.
///
/// Bytes are wiped before every replacement and on [`SecretVault::clear`].
/// Wiping is best effort: copies the allocator or the terminal backend made
/// before the wipe (reallocation, rendered frame buffers) are out of reach.
#[derive(Default)]
pub struct SecretVault {
    buf: Option<Vec<u8>>,
}

impl SecretVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `bytes` into a fresh allocation after wiping the previous value.
    pub fn set(&mut self, bytes: &[u8]) {
        self.clear();
        self.buf = Some(bytes.to_vec());
    }

    pub fn clear(&mut self) {
        self.wipe();
        self.buf = None;
    }

    fn wipe(&mut self) {
        if let Some(buf) = self.buf.as_mut() {
            buf.as_mut_slice().zeroize();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.as_ref().is_none_or(|b| b.is_empty())
    }

    pub fn len(&self) -> usize {
        self.buf.as_ref().map_or(0, Vec::len)
    }

    /// Text view for a single render pass or clipboard write. Wiped on drop.
    pub fn as_display_string(&self) -> Zeroizing<String> {
        match &self.buf {
            Some(bytes) => Zeroizing::new(String::from_utf8_lossy(bytes).into_owned()),
            None => Zeroizing::new(String::new()),
        }
    }
}

impl Drop for SecretVault {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_copies_input() {
        let mut source = b"hunter2".to_vec();
        let mut vault = SecretVault::new();
        vault.set(&source);
        source.iter_mut().for_each(|b| *b = b'x');
        assert_eq!(vault.as_display_string().as_str(), "hunter2");
    }

    #[test]
    fn wipe_zeroes_every_byte_in_place() {
        let mut vault = SecretVault::new();
        vault.set(b"top-secret");
        vault.wipe();
        let held = vault.buf.as_ref().map(Vec::as_slice).unwrap_or_default();
        assert_eq!(held.len(), 10);
        assert!(held.iter().all(|b| *b == 0));
    }

    #[test]
    fn clear_leaves_nothing_to_display() {
        let mut vault = SecretVault::new();
        vault.set(b"value");
        vault.clear();
        assert!(vault.is_empty());
        assert_eq!(vault.len(), 0);
        assert!(vault.as_display_string().is_empty());
    }

    #[test]
    fn set_replaces_previous_value() {
        let mut vault = SecretVault::new();
        vault.set(b"first-value");
        vault.set(b"2nd");
        assert_eq!(vault.as_display_string().as_str(), "2nd");
        assert_eq!(vault.len(), 3);
    }

    #[test]
    fn debug_does_not_leak_value() {
        let mut vault = SecretVault::new();
        vault.set(b"leak-me");
        assert!(!format!("{vault:?}").contains("leak-me"));
    }
}
