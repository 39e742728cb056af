pub mod covers;
pub mod library_store;
pub mod server;
