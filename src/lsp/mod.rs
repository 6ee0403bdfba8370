//! LSP Protocol Implementation
//!
//! Thin protocol layer over [`crate::core::SessionCoordinator`].

pub mod backend;
pub mod client;
pub mod handlers;
pub mod server;

pub use backend::Backend;
pub use server::serve;
