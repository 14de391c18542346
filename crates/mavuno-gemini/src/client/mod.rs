//! Gemini `generateContent` client.

mod gemini_client;
mod wire;

pub use gemini_client::{GeminiClient, strip_json_fences};
