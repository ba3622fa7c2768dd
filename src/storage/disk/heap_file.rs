use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;
use thiserror::Error;

use crate::catalog::{Record, RecordSchema};
use crate::common::types::{PageId, RecordId, StorageConfig, TableId};
use crate::storage::page::{ParseError, SlottedPage, StorageError};

#[derive(Error, Debug)]
pub enum HeapFileError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Page parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Page storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Page {page_no} is out of range for a file of {num_pages} pages")]
    PageOutOfRange { page_no: u32, num_pages: u32 },
    #[error("Page belongs to {actual}, but this file stores {expected}")]
    TableMismatch { expected: TableId, actual: TableId },
}

pub type Result<T> = std::result::Result<T, HeapFileError>;

/// A file of consecutive fixed-size slotted pages belonging to one table
pub struct HeapFile {
    file: Mutex<File>,
    path: PathBuf,
    table_id: TableId,
    schema: Arc<RecordSchema>,
    config: StorageConfig,
}

impl HeapFile {
    /// Open (creating if needed) the heap file at `path`
    pub fn open(
        path: impl AsRef<Path>,
        table_id: TableId,
        schema: Arc<RecordSchema>,
        config: StorageConfig,
    ) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        info!("Opened heap file {} for {}", path.as_ref().display(), table_id);
        Ok(Self {
            file: Mutex::new(file),
            path: path.as_ref().to_path_buf(),
            table_id,
            schema,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Number of whole pages in the file
    pub fn num_pages(&self) -> Result<u32> {
        let file_size = self.file.lock().metadata()?.len();
        Ok((file_size / self.config.page_size as u64) as u32)
    }

    /// Read and parse a page
    pub fn read_page(&self, page_no: u32) -> Result<SlottedPage> {
        let num_pages = self.num_pages()?;
        if page_no >= num_pages {
            return Err(HeapFileError::PageOutOfRange { page_no, num_pages });
        }

        let mut buffer = vec![0u8; self.config.page_size];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(self.page_offset(page_no)))?;
            file.read_exact(&mut buffer)?;
        }

        let page_id = PageId::new(self.table_id, page_no);
        Ok(SlottedPage::from_bytes(page_id, &buffer, self.schema.clone(), self.config.page_size)?)
    }

    /// Write a page back at its page number; writing one past the end appends
    pub fn write_page(&self, page: &SlottedPage) -> Result<()> {
        let page_id = page.page_id();
        if page_id.table_id != self.table_id {
            return Err(HeapFileError::TableMismatch {
                expected: self.table_id,
                actual: page_id.table_id,
            });
        }
        let num_pages = self.num_pages()?;
        if page_id.page_no > num_pages {
            return Err(HeapFileError::PageOutOfRange {
                page_no: page_id.page_no,
                num_pages,
            });
        }

        let data = page.serialize();
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(self.page_offset(page_id.page_no)))?;
        file.write_all(&data)?;
        file.flush()?;

        debug!("Wrote page {}", page_id);
        Ok(())
    }

    /// Append an empty page and return its id
    pub fn allocate_page(&self) -> Result<PageId> {
        let mut file = self.file.lock();
        let file_size = file.metadata()?.len();
        let page_no = (file_size / self.config.page_size as u64) as u32;

        file.seek(SeekFrom::Start(self.page_offset(page_no)))?;
        file.write_all(&SlottedPage::empty_page_data(self.config.page_size))?;
        file.flush()?;

        let page_id = PageId::new(self.table_id, page_no);
        debug!("Allocated page {}", page_id);
        Ok(page_id)
    }

    /// Insert a record into the first page with a free slot, growing the
    /// file by one page when every page is full
    ///
    /// The record id is stamped on `record` only once the page is written.
    pub fn insert_record(&self, record: &mut Record) -> Result<RecordId> {
        let mut page = match self.first_page_with_space()? {
            Some(page) => page,
            None => {
                let page_id = self.allocate_page()?;
                self.read_page(page_id.page_no)?
            }
        };

        let mut stored = record.clone();
        let record_id = page.insert(&mut stored)?;
        self.write_page(&page)?;
        record.set_record_id(record_id);
        Ok(record_id)
    }

    fn first_page_with_space(&self) -> Result<Option<SlottedPage>> {
        for page_no in 0..self.num_pages()? {
            let page = self.read_page(page_no)?;
            if page.empty_slot_count() > 0 {
                return Ok(Some(page));
            }
        }
        Ok(None)
    }

    /// Read every page of the file in page order
    pub fn read_all_pages(&self) -> Result<Vec<SlottedPage>> {
        (0..self.num_pages()?).map(|page_no| self.read_page(page_no)).collect()
    }

    fn page_offset(&self, page_no: u32) -> u64 {
        page_no as u64 * self.config.page_size as u64
    }
}
