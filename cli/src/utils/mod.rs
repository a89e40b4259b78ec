pub mod files;
pub mod io;

pub use files::{relative_object_name, walk_files};
pub use io::{init_env_logger, read_token_from_stdin, LOG_PREFIX_INFO};
