use std::path::PathBuf;

use thiserror::Error;

use crate::gemini::GeminiError;
use crate::pdfco::PdfCoError;

#[derive(Debug, Error)]
pub enum PdfAssistError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("{0} is not set. Export it or add it to pdfassist.toml.")]
    MissingApiKey(&'static str),

    #[error("Not a usable input file: {}", .0.display())]
    InvalidInput(PathBuf),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("PDF.co error: {0}")]
    PdfCo(#[from] PdfCoError),

    #[error("Gemini error: {0}")]
    Gemini(#[from] GeminiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
