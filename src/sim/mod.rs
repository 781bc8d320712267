//! Program loading.

pub mod loader;

pub use loader::{load, LoadResult};
