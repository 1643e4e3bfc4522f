pub mod file_handlers;

pub use file_handlers::FileRpc;
