use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::catalog::{FieldValue, Record, RecordSchema, SchemaCatalog};
use crate::common::types::{PageId, RecordId, StorageConfig, TransactionId};
use crate::storage::page::error::{ParseError, ParseResult, StorageError, StorageResult};
use crate::storage::page::header::SlotBitmap;
use crate::storage::page::layout::PageLayout;

/// A page of fixed-width records behind a used/free bitmap header
///
/// Layout: `[bitmap][slot 0]..[slot n-1][zero padding]`. A slot whose bit is
/// clear is stored as `record_len` zero bytes. `slots[i]` is `Some` exactly
/// when bit `i` is set.
pub struct SlottedPage {
    page_id: PageId,
    schema: Arc<RecordSchema>,
    layout: PageLayout,
    header: SlotBitmap,
    slots: Vec<Option<Record>>,
    dirty: Option<TransactionId>,
    // Serialized state at the last checkpoint, consumed by recovery
    before_image: Mutex<Arc<[u8]>>,
}

impl SlottedPage {
    /// Materialize a page, resolving its schema through the catalog
    pub fn new(
        page_id: PageId,
        data: &[u8],
        catalog: &dyn SchemaCatalog,
        config: &StorageConfig,
    ) -> ParseResult<Self> {
        let schema = catalog
            .schema(page_id.table_id)
            .ok_or(ParseError::SchemaNotFound(page_id.table_id))?;
        Self::from_bytes(page_id, data, schema, config.page_size)
    }

    /// Materialize a page whose schema the caller already knows
    pub fn from_bytes(
        page_id: PageId,
        data: &[u8],
        schema: Arc<RecordSchema>,
        page_size: usize,
    ) -> ParseResult<Self> {
        if data.len() < page_size {
            return Err(ParseError::Truncated {
                expected: page_size,
                actual: data.len(),
            });
        }

        let layout = PageLayout::new(page_size, schema.byte_len());
        let header = SlotBitmap::from_bytes(&data[..layout.header_len]);

        let mut slots = Vec::with_capacity(layout.slot_count);
        for slot in 0..layout.slot_count {
            if !header.is_set(slot) {
                // Unused slots still occupy record_len bytes
                slots.push(None);
                continue;
            }
            let offset = layout.slot_offset(slot);
            let values = decode_record(&schema, &data[offset..offset + layout.record_len], slot)?;
            slots.push(Some(Record::from_decoded(
                schema.clone(),
                values,
                RecordId::new(page_id, slot),
            )));
        }

        let page = Self {
            page_id,
            schema,
            layout,
            header,
            slots,
            dirty: None,
            before_image: Mutex::new(Arc::from(Vec::new())),
        };
        page.capture_before_image();

        debug!(
            "Parsed page {} ({} of {} slots used)",
            page_id,
            layout.slot_count - page.empty_slot_count(),
            layout.slot_count
        );
        Ok(page)
    }

    /// Bytes of a page with no used slots
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0; page_size]
    }

    /// Serialize the page; `from_bytes` on the output rebuilds an equal page
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.layout.page_size);
        buf.extend_from_slice(self.header.to_bytes());

        for slot in &self.slots {
            match slot {
                Some(record) => record.serialize(&mut buf),
                None => buf.resize(buf.len() + self.layout.record_len, 0),
            }
        }

        buf.resize(self.layout.page_size, 0);
        buf
    }

    /// Replace the before-image with the current serialized state
    pub fn capture_before_image(&self) {
        let snapshot: Arc<[u8]> = Arc::from(self.serialize());
        *self.before_image.lock() = snapshot;
    }

    /// Rebuild the page as it was at the last captured before-image
    pub fn before_image(&self) -> ParseResult<SlottedPage> {
        let snapshot = self.before_image.lock().clone();
        Self::from_bytes(self.page_id, &snapshot, self.schema.clone(), self.layout.page_size)
    }

    /// Store a record in the lowest free slot and stamp its record id
    ///
    /// On error neither the page nor the record is modified.
    pub fn insert(&mut self, record: &mut Record) -> StorageResult<RecordId> {
        if **record.schema() != *self.schema {
            return Err(StorageError::SchemaMismatch(self.page_id));
        }

        let slot = (0..self.layout.slot_count)
            .find(|slot| !self.is_slot_used(*slot))
            .ok_or(StorageError::PageFull(self.page_id))?;

        self.set_slot_used(slot, true)?;
        let record_id = RecordId::new(self.page_id, slot);
        record.set_record_id(record_id);
        self.slots[slot] = Some(record.clone());

        debug!("Inserted record into {}", record_id);
        Ok(record_id)
    }

    /// Free the slot a record occupies
    ///
    /// The caller's record keeps its record id; clearing it is up to them.
    pub fn delete(&mut self, record: &Record) -> StorageResult<()> {
        let record_id = record
            .record_id()
            .filter(|rid| rid.page_id == self.page_id && rid.slot < self.layout.slot_count)
            .ok_or(StorageError::RecordNotOnPage(self.page_id))?;

        if !self.is_slot_used(record_id.slot) {
            return Err(StorageError::SlotAlreadyEmpty {
                page_id: self.page_id,
                slot: record_id.slot,
            });
        }

        self.set_slot_used(record_id.slot, false)?;
        self.slots[record_id.slot] = None;

        debug!("Deleted record at {}", record_id);
        Ok(())
    }

    /// Tag the page with the transaction that dirtied it, or clear the tag
    pub fn mark_dirty(&mut self, owner: Option<TransactionId>) {
        self.dirty = owner;
    }

    /// The transaction that last dirtied the page, if it is dirty
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty
    }

    pub fn empty_slot_count(&self) -> usize {
        (0..self.layout.slot_count)
            .filter(|slot| !self.is_slot_used(*slot))
            .count()
    }

    /// Whether a slot holds a record; out-of-range slots are never used
    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.layout.slot_count && self.header.is_set(slot)
    }

    // The only path that flips header bits
    pub(crate) fn set_slot_used(&mut self, slot: usize, used: bool) -> StorageResult<()> {
        if slot >= self.layout.slot_count {
            return Err(StorageError::SlotOutOfRange {
                slot,
                slot_count: self.layout.slot_count,
            });
        }
        self.header.set(slot, used);
        Ok(())
    }

    /// Records in used slots, in ascending slot order
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.slots.iter().flatten()
    }

    pub fn record(&self, slot: usize) -> Option<&Record> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn slot_count(&self) -> usize {
        self.layout.slot_count
    }

    /// Raw bitmap header bytes
    pub fn header_bytes(&self) -> &[u8] {
        self.header.to_bytes()
    }
}

fn decode_record(schema: &RecordSchema, bytes: &[u8], slot: usize) -> ParseResult<Vec<FieldValue>> {
    let mut values = Vec::with_capacity(schema.num_fields());
    let mut offset = 0;
    for (field, def) in schema.fields().iter().enumerate() {
        let value = def
            .field_type
            .parse(&bytes[offset..])
            .map_err(|source| ParseError::Field { slot, field, source })?;
        offset += def.field_type.byte_len();
        values.push(value);
    }
    Ok(values)
}

impl<'a> IntoIterator for &'a SlottedPage {
    type Item = &'a Record;
    type IntoIter = std::iter::Flatten<std::slice::Iter<'a, Option<Record>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter().flatten()
    }
}

impl Clone for SlottedPage {
    fn clone(&self) -> Self {
        Self {
            page_id: self.page_id,
            schema: self.schema.clone(),
            layout: self.layout,
            header: self.header.clone(),
            slots: self.slots.clone(),
            dirty: self.dirty,
            before_image: Mutex::new(self.before_image.lock().clone()),
        }
    }
}

/// Pages compare by identity and stored content; the dirty tag and the
/// before-image are bookkeeping and do not take part
impl PartialEq for SlottedPage {
    fn eq(&self, other: &Self) -> bool {
        self.page_id == other.page_id
            && *self.schema == *other.schema
            && self.layout == other.layout
            && self.header == other.header
            && self.slots == other.slots
    }
}

impl fmt::Debug for SlottedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlottedPage")
            .field("page_id", &self.page_id)
            .field("slot_count", &self.layout.slot_count)
            .field("used_slots", &(self.layout.slot_count - self.empty_slot_count()))
            .field("dirty", &self.dirty)
            .finish()
    }
}
