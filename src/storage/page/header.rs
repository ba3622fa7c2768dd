/// Bitmap header of a slotted page: bit `i` (LSB-first within each byte)
/// records whether slot `i` holds a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBitmap {
    bytes: Vec<u8>,
}

impl SlotBitmap {
    /// An all-clear bitmap of `header_len` bytes
    pub fn new(header_len: usize) -> Self {
        Self {
            bytes: vec![0; header_len],
        }
    }

    // Deserialize header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    // Serialize header to bytes
    pub fn to_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bits the header can address
    pub fn capacity(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.bytes
            .get(index / 8)
            .is_some_and(|byte| (byte >> (index % 8)) & 1 == 1)
    }

    /// Flip a single bit; the caller bounds-checks `index`
    pub(crate) fn set(&mut self, index: usize, value: bool) {
        let mask = 1u8 << (index % 8);
        if value {
            self.bytes[index / 8] |= mask;
        } else {
            self.bytes[index / 8] &= !mask;
        }
    }
}
