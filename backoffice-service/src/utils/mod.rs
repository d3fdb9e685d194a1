pub mod format;
pub mod pagination;
