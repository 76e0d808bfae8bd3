//! Headless motion and layout engine for three page sections: a masonry
//! gallery with a detail modal, a looping logo marquee and an auto-advancing
//! card carousel.
//!
//! Components never touch a real document. They are mounted on a [`host::Host`]
//! that owns time, geometry and callbacks, and react to the dispatches it
//! hands back.

pub mod components;
pub mod config;
pub mod error;
pub mod host;
pub mod image_loader;
pub mod layout;
pub mod models;
pub mod motion;
pub mod preload;
pub mod scanner;
pub mod showcase;

pub use error::{Error, Result};
