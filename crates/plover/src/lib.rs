#![doc = include_str!("../README.md")]

mod config;
pub mod content;
mod date;
mod fetch;
pub mod html;
pub mod paginate;
mod partials;
mod permalink;
pub mod render;
mod site;
mod storage;
pub mod text;

pub use config::*;
pub use date::*;
pub use fetch::*;
pub use partials::*;
pub use permalink::*;
pub use site::*;
pub use storage::*;
