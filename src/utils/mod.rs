//! Cross-cutting helpers: platform resolution and filesystem conventions.

pub mod fs;
pub mod platform;
