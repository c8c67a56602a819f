pub mod vocabulary;
pub mod window;
pub mod writer;

pub use vocabulary::{EventId, EventVocabulary};
pub use window::{aggregate, TimeWindow, WindowWidth};
pub use writer::{write_sequence_file, write_windows, WriteError};
