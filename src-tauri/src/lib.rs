pub mod cache;
pub mod catalog;
pub mod error;
pub mod net;
pub mod session;
pub mod storage;
pub mod worker;

mod app;
mod commands;
#[cfg(desktop)]
pub mod desktop;
mod engine;
pub mod settings;

pub use app::run;
