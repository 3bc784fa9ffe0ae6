// Public library interface for squarify-rs
// This allows the debug CLI tool to use the core modules

pub mod launcher;
pub mod layout;
