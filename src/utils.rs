pub mod clipboard;
pub mod file;
pub mod opener;
