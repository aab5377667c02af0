//! Data module - input selection and CSV loading

mod loader;
mod selector;

pub use loader::{DataLoader, LoaderError};
pub use selector::{FileSelector, SelectorError};
