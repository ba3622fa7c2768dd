pub mod error;
pub mod header;
pub mod layout;
pub mod slotted_page;

pub use error::{ParseError, ParseResult, StorageError, StorageResult};
pub use header::SlotBitmap;
pub use layout::PageLayout;
pub use slotted_page::SlottedPage;
