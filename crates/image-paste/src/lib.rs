mod config;
mod error;
mod host;
mod paste;
mod queue;
mod resolver;
mod source;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::host::{HttpFetcher, ImageFetcher, ImageHost, ImgBbHost};
pub use crate::paste::*;
pub use crate::queue::*;
pub use crate::resolver::*;
pub use crate::source::*;
