pub mod capture;
pub mod config;
pub mod event;
pub mod monitor;
pub mod pattern;
pub mod worker;

pub use capture::*;
pub use config::*;
pub use event::*;
pub use monitor::*;
pub use pattern::*;
pub use worker::*;
