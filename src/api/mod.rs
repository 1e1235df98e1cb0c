//! CDN77 API module

pub mod client;
pub mod response;

pub use client::{Cdn77Client, CdnApi};
