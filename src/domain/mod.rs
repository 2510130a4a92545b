pub mod entry;
pub mod metadata;
