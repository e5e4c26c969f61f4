pub mod client;
pub mod error;
pub mod types;

pub use client::{ContentGenerator, GeminiClient};
pub use error::GeminiError;
pub use types::{FunctionDeclaration, GenerateContentRequest, GenerateContentResponse, Tool};
