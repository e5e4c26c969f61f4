//! Tipos de erro para o cliente da API Gemini.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a API Gemini.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// O servidor retornou HTTP 429 (rate limit).
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Erro retornado pela API (ex.: 400 requisição inválida, 403 chave inválida).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A resposta chegou, mas não contém o que foi pedido
    /// (sem candidatos, sem texto, JSON fora do schema).
    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// Falha de rede subjacente.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
