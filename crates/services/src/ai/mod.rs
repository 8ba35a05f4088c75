mod client;

pub use client::{AiClient, AiConfig};
