/// Slot geometry of a page holding fixed-width records
///
/// Each slot costs `record_len` bytes plus one header bit, so
/// `slot_count = floor(page_size * 8 / (record_len * 8 + 1))` and the
/// bitmap header takes `ceil(slot_count / 8)` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub page_size: usize,
    pub record_len: usize,
    pub slot_count: usize,
    pub header_len: usize,
}

impl PageLayout {
    pub fn new(page_size: usize, record_len: usize) -> Self {
        let slot_count = (page_size * 8) / (record_len * 8 + 1);
        let header_len = slot_count.div_ceil(8);
        Self {
            page_size,
            record_len,
            slot_count,
            header_len,
        }
    }

    /// Byte offset of a slot from the start of the page
    pub fn slot_offset(&self, slot: usize) -> usize {
        self.header_len + slot * self.record_len
    }

    /// Bytes after the last slot that are always zero
    pub fn padding_len(&self) -> usize {
        self.page_size - self.slot_offset(self.slot_count)
    }
}
