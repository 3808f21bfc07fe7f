pub mod batch;
pub mod config_handler;
pub mod extract;
