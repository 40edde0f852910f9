//! Request handler module
//!
//! Responsible for request routing dispatch and the page, asset and contact
//! form handlers.

pub mod contact;
pub mod pages;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
