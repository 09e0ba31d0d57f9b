//! Protocol configuration, read from a TOML file.

pub mod file;

pub use file::{load, load_str};
