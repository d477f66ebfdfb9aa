mod app;
pub mod core;
pub mod utils;
