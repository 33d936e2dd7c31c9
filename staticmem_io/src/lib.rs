pub mod error_mapping;
pub mod memfile;

pub use error_mapping::{error_kind_to_str, error_to_error_kind, error_to_io_error};
pub use memfile::MemFile;
