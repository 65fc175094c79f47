//! Core resolution domain

pub mod manifest;
pub mod resolve;
