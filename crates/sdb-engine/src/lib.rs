pub mod placeholder;
pub mod service;

pub use placeholder::PlaceholderEngine;
pub use service::{ServiceConfig, ServiceEngine};
