use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest of everything read during one detection cycle
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex encoding of the digest
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first 8 bytes are plenty to tell cycles apart in logs
        write!(f, "Fingerprint({})", hex::encode(&self.0[..8]))
    }
}

/// Fingerprint the buffers read in one cycle, in attempt order
///
/// Each buffer is fed as its little-endian u64 length followed by its bytes,
/// so moving bytes from one format to the next changes the digest.
/// Returns None when every buffer is empty: "nothing read" is not a state.
pub fn fingerprint<'a, I>(buffers: I) -> Option<Fingerprint>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Sha256::new();
    let mut any = false;

    for buf in buffers {
        any |= !buf.is_empty();
        hasher.update((buf.len() as u64).to_le_bytes());
        hasher.update(buf);
    }

    if !any {
        return None;
    }

    Some(Fingerprint(hasher.finalize().into()))
}
