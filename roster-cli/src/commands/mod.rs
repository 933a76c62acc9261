pub mod config;
pub mod members;
pub mod sync;
