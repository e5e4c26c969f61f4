//! Tipos de erro para o cliente da API PDF.co.
//!
//! Define [`PdfCoError`] com uma variante para cada etapa do ciclo de vida
//! de um job (upload, submissão, falha reportada, timeout de polling) e
//! variantes separadas para falhas de transporte. Usa `thiserror` para
//! derivar `Display` e `Error`.

use thiserror::Error;

/// Erros que podem ocorrer ao conduzir um job na API PDF.co.
///
/// As quatro primeiras variantes correspondem às etapas do protocolo:
/// - [`Upload`](PdfCoError::Upload) — handshake de URL pré-assinada ou PUT falhou
/// - [`Submission`](PdfCoError::Submission) — operação desconhecida ou rejeitada
/// - [`JobFailed`](PdfCoError::JobFailed) — o serviço reportou falha no job
/// - [`JobTimeout`](PdfCoError::JobTimeout) — orçamento de polling esgotado
#[derive(Debug, Error)]
pub enum PdfCoError {
    /// Falha em qualquer uma das duas etapas do upload.
    #[error("upload failed: {0}")]
    Upload(String),

    /// A operação não é reconhecida, os parâmetros são inválidos
    /// ou o serviço rejeitou a requisição.
    #[error("submission rejected: {0}")]
    Submission(String),

    /// O serviço reportou explicitamente que o job falhou.
    #[error("job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// O status não chegou a um estado terminal dentro do orçamento de tentativas.
    #[error("job {job_id} timed out after {attempts} status checks")]
    JobTimeout { job_id: String, attempts: u32 },

    /// O download do resultado de um job concluído falhou.
    #[error("failed to fetch result {url}: {reason}")]
    ResultFetch { url: String, reason: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout do socket).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// O corpo da resposta não tem o formato esperado.
    #[error("failed to decode response: {0}")]
    Decode(String),
}
