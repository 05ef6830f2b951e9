//! Data module - CSV loading and processing

mod loader;
mod processor;
mod record;

pub use loader::{DataLoader, LoaderError};
pub use processor::{DataProcessor, DroppedRows, ProcessorError};
pub use record::{parse_date, postcode_prefix, PropertyAttributes, Transaction, PPD_COLUMNS};
