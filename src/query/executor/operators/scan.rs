// Page Scan Operator
//
// Scans the used slots of a sequence of slotted pages, page by page.

use std::sync::Arc;

use log::debug;

use crate::catalog::{Record, RecordSchema};
use crate::query::executor::operators::Operator;
use crate::query::executor::result::{QueryError, QueryResult};
use crate::storage::page::SlottedPage;

/// Yields every stored record of its pages in page order, then slot order
pub struct PageScanOperator {
    schema: Arc<RecordSchema>,
    pages: Vec<SlottedPage>,
    /// Current page index
    page_index: usize,
    /// Next slot to inspect on the current page
    slot_index: usize,
    is_open: bool,
}

impl PageScanOperator {
    pub fn new(schema: Arc<RecordSchema>, pages: Vec<SlottedPage>) -> Self {
        Self {
            schema,
            pages,
            page_index: 0,
            slot_index: 0,
            is_open: false,
        }
    }

    // Move the cursor to the next used slot, returning whether one exists
    fn seek(&mut self) -> bool {
        while let Some(page) = self.pages.get(self.page_index) {
            while self.slot_index < page.slot_count() {
                if page.is_slot_used(self.slot_index) {
                    return true;
                }
                self.slot_index += 1;
            }
            self.page_index += 1;
            self.slot_index = 0;
        }
        false
    }
}

impl Operator for PageScanOperator {
    fn open(&mut self) -> QueryResult<()> {
        if self.is_open {
            return Err(QueryError::AlreadyOpen);
        }
        self.is_open = true;
        self.page_index = 0;
        self.slot_index = 0;
        debug!("Opened page scan over {} pages", self.pages.len());
        Ok(())
    }

    fn has_next(&mut self) -> QueryResult<bool> {
        if !self.is_open {
            return Err(QueryError::NotOpen);
        }
        Ok(self.seek())
    }

    fn next(&mut self) -> QueryResult<Record> {
        if !self.has_next()? {
            return Err(QueryError::NoMoreElements);
        }
        let record = self.pages[self.page_index]
            .record(self.slot_index)
            .cloned()
            .ok_or(QueryError::NoMoreElements)?;
        self.slot_index += 1;
        Ok(record)
    }

    fn rewind(&mut self) -> QueryResult<()> {
        if !self.is_open {
            return Err(QueryError::NotOpen);
        }
        self.page_index = 0;
        self.slot_index = 0;
        Ok(())
    }

    fn close(&mut self) -> QueryResult<()> {
        self.is_open = false;
        Ok(())
    }

    fn schema(&self) -> Arc<RecordSchema> {
        self.schema.clone()
    }
}
