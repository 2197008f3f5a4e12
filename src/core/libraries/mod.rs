pub mod processor;

pub use processor::{resolve_target, FetchSummary, LibraryProcessor, LibraryTarget};
