//! Output plumbing

pub mod output;
