pub mod format;
pub mod reader;
pub mod timestamp;

pub use format::{Fields, LogFormat};
pub use reader::{Dataset, DatasetReader, LogRecord, ParsedDataset, ReaderError};
pub use timestamp::TimestampExtractor;
