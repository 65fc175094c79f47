//! Manifest domain

pub mod loader;

pub use loader::ManifestSet;
