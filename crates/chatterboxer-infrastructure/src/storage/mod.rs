pub mod atomic_file;
pub mod config_storage;

pub use atomic_file::atomic_write;
pub use config_storage::ConfigStorage;
