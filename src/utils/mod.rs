pub mod error;
pub mod filename;

pub use filename::{allowed_file, secure_filename, ALLOWED_EXTENSIONS};
