//! Read-only view over the audio library directory tree

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::library::tags::TagReader;

pub mod browse;
pub mod error;
pub mod fs;
pub mod metadata;
pub mod tags;

/// Entry point for everything that reads the library: listings, tags, album cards.
#[derive(Clone)]
pub struct Library {
    root: PathBuf,
    reader: Arc<dyn TagReader>,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>, reader: Arc<dyn TagReader>) -> Self {
        Self {
            root: root.into(),
            reader,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
