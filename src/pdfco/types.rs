//! Tipos de dados para requisições e respostas da API PDF.co.
//!
//! Os corpos de resposta compartilham os campos opcionais `error` e
//! `message`; quando `error` é `true` o restante do corpo não é confiável.

use serde::{Deserialize, Serialize};

/// Arquivo já enviado ao armazenamento temporário do serviço.
///
/// `url` é a referência de leitura usada como entrada de uma operação;
/// `name` é o nome original, usado para derivar o nome do resultado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub url: String,
}

/// Resposta de `GET /file/upload/get-presigned-url`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlResponse {
    /// Destino de escrita única para o `PUT` dos bytes.
    #[serde(default)]
    pub presigned_url: Option<String>,
    /// Referência de leitura durável do arquivo enviado.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Resposta de um endpoint de operação chamado com `async: true`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Resposta de `GET /job/check`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobCheckResponse {
    #[serde(default)]
    pub status: String,
    /// Preenchido apenas quando `status` é `success`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Status remoto de um job, já interpretado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// Ainda processando (`working`, ou qualquer string não reconhecida).
    Working(String),
    /// Concluído; `url` aponta para o resultado.
    Success { url: String },
    /// `failed` ou `aborted`, ou `error: true` no corpo.
    Failed { reason: String },
}

impl JobCheckResponse {
    /// Interpreta o corpo bruto em um [`RemoteStatus`].
    ///
    /// Um `success` sem `url` é tratado como falha: o resultado nunca é
    /// exposto sem uma referência utilizável.
    pub fn into_status(self) -> RemoteStatus {
        if self.error {
            return RemoteStatus::Failed {
                reason: self
                    .message
                    .unwrap_or_else(|| "service reported an error".to_string()),
            };
        }
        match self.status.as_str() {
            "success" => match self.url.filter(|u| !u.is_empty()) {
                Some(url) => RemoteStatus::Success { url },
                None => RemoteStatus::Failed {
                    reason: "job succeeded without a result url".to_string(),
                },
            },
            "failed" | "aborted" => RemoteStatus::Failed {
                reason: self
                    .message
                    .unwrap_or_else(|| format!("job {}", self.status)),
            },
            _ => RemoteStatus::Working(self.status.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(json: &str) -> RemoteStatus {
        serde_json::from_str::<JobCheckResponse>(json)
            .unwrap()
            .into_status()
    }

    #[test]
    fn presigned_response_from_api_format() {
        let json = r#"{
            "presignedUrl": "https://bucket.example/put?sig=1",
            "url": "https://bucket.example/get/a.pdf",
            "error": false,
            "status": 200,
            "name": "a.pdf"
        }"#;
        let resp: PresignedUrlResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.presigned_url.as_deref(), Some("https://bucket.example/put?sig=1"));
        assert_eq!(resp.url.as_deref(), Some("https://bucket.example/get/a.pdf"));
        assert!(!resp.error);
    }

    #[test]
    fn submit_response_reads_job_id() {
        let resp: SubmitResponse =
            serde_json::from_str(r#"{"jobId":"J-1","error":false,"status":200}"#).unwrap();
        assert_eq!(resp.job_id.as_deref(), Some("J-1"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(check(r#"{"status":"working"}"#), RemoteStatus::Working("working".into()));
        assert_eq!(check(r#"{"status":"unknown"}"#), RemoteStatus::Working("unknown".into()));
        assert_eq!(
            check(r#"{"status":"success","url":"https://r.example/out.pdf"}"#),
            RemoteStatus::Success { url: "https://r.example/out.pdf".into() }
        );
        assert!(matches!(check(r#"{"status":"failed"}"#), RemoteStatus::Failed { .. }));
        assert!(matches!(check(r#"{"status":"aborted"}"#), RemoteStatus::Failed { .. }));
    }

    #[test]
    fn success_without_url_is_not_exposed() {
        assert!(matches!(
            check(r#"{"status":"success"}"#),
            RemoteStatus::Failed { .. }
        ));
    }

    #[test]
    fn error_flag_wins_over_status() {
        assert_eq!(
            check(r#"{"status":"success","url":"x","error":true,"message":"bad key"}"#),
            RemoteStatus::Failed { reason: "bad key".into() }
        );
    }
}
