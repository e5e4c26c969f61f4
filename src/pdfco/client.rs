use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use super::error::PdfCoError;
use super::operation::{Operation, OperationParams};
use super::types::{
    JobCheckResponse, PresignedUrlResponse, RemoteStatus, SubmitResponse, UploadedFile,
};
use crate::job::Job;
use crate::poller::JobStatusSource;

pub const API_URL: &str = "https://api.pdf.co/v1";

pub struct PdfCoClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl PdfCoClient {
    /// Create a client for the API at `base_url` (the production URL is [`API_URL`]).
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, PdfCoError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upload a file in two steps: ask for a presigned destination, then
    /// `PUT` the bytes there. Returns the read URL to use as operation input.
    pub async fn upload_file(&self, name: &str, bytes: Vec<u8>) -> Result<UploadedFile, PdfCoError> {
        let response = self
            .client
            .get(format!("{}/file/upload/get-presigned-url", self.base_url))
            .query(&[("name", name)])
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PdfCoError::Upload(format!(
                "presigned url request returned {}: {message}",
                status.as_u16()
            )));
        }

        let presigned = response
            .json::<PresignedUrlResponse>()
            .await
            .map_err(|e| PdfCoError::Decode(e.to_string()))?;
        if presigned.error {
            return Err(PdfCoError::Upload(
                presigned
                    .message
                    .unwrap_or_else(|| "presigned url request rejected".to_string()),
            ));
        }
        let (Some(presigned_url), Some(url)) = (presigned.presigned_url, presigned.url) else {
            return Err(PdfCoError::Upload(
                "presigned url response is missing presignedUrl or url".to_string(),
            ));
        };

        let content_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .to_string();
        debug!(name, %content_type, size = bytes.len(), "uploading file");

        let put = self
            .client
            .put(&presigned_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        if !put.status().is_success() {
            return Err(PdfCoError::Upload(format!(
                "file transfer returned {}",
                put.status().as_u16()
            )));
        }

        info!(name, %url, "file uploaded");
        Ok(UploadedFile {
            name: name.to_string(),
            url,
        })
    }

    /// Parse the operation name, then submit it. Unknown names fail before
    /// any request is sent.
    pub async fn submit_named(
        &self,
        operation: &str,
        inputs: &[UploadedFile],
        params: &OperationParams,
    ) -> Result<Job, PdfCoError> {
        let operation: Operation = operation.parse()?;
        self.submit(operation, inputs, params).await
    }

    /// Submit an operation in asynchronous mode and return the new job.
    pub async fn submit(
        &self,
        operation: Operation,
        inputs: &[UploadedFile],
        params: &OperationParams,
    ) -> Result<Job, PdfCoError> {
        let body = operation.build_body(inputs, params)?;

        let response = self
            .client
            .post(format!("{}{}", self.base_url, operation.endpoint()))
            .header("x-api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<SubmitResponse>(&text);

        if !status.is_success() {
            let message = parsed.ok().and_then(|r| r.message).unwrap_or(text);
            return Err(PdfCoError::Submission(format!(
                "{operation} returned {}: {message}",
                status.as_u16()
            )));
        }

        let parsed = parsed.map_err(|e| PdfCoError::Decode(e.to_string()))?;
        if parsed.error {
            return Err(PdfCoError::Submission(
                parsed
                    .message
                    .unwrap_or_else(|| format!("{operation} rejected by service")),
            ));
        }
        let job_id = parsed
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PdfCoError::Submission(format!("{operation} returned no job id")))?;

        info!(%operation, %job_id, "job submitted");
        Ok(Job::new(
            job_id,
            operation,
            inputs.iter().map(|f| f.url.clone()).collect(),
            params.clone(),
        ))
    }

    /// Query the service once for a job's status.
    pub async fn check_job(&self, job_id: &str) -> Result<RemoteStatus, PdfCoError> {
        let response = self
            .client
            .get(format!("{}/job/check", self.base_url))
            .query(&[("jobid", job_id)])
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<JobCheckResponse>(&text)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or(text);
            warn!(%job_id, status = status.as_u16(), "status check rejected");
            return Ok(RemoteStatus::Failed {
                reason: format!("status check returned {}: {message}", status.as_u16()),
            });
        }

        let body: JobCheckResponse =
            serde_json::from_str(&text).map_err(|e| PdfCoError::Decode(e.to_string()))?;
        Ok(body.into_status())
    }

    /// Fetch the bytes behind a result URL.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, PdfCoError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PdfCoError::ResultFetch {
                url: url.to_string(),
                reason: format!("status {}", status.as_u16()),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch a text result, replacing invalid UTF-8 sequences.
    pub async fn fetch_text(&self, url: &str) -> Result<String, PdfCoError> {
        let bytes = self.download(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl JobStatusSource for PdfCoClient {
    async fn check_job(&self, job_id: &str) -> Result<RemoteStatus, PdfCoError> {
        PdfCoClient::check_job(self, job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> PdfCoClient {
        PdfCoClient::with_base_url("test-key".into(), server.uri()).unwrap()
    }

    fn uploaded(name: &str) -> UploadedFile {
        UploadedFile {
            name: name.into(),
            url: format!("https://files.example/{name}"),
        }
    }

    #[tokio::test]
    async fn upload_runs_presign_then_put() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file/upload/get-presigned-url"))
            .and(query_param("name", "report.pdf"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "presignedUrl": format!("{}/bucket/put/report.pdf", server.uri()),
                "url": "https://files.example/report.pdf",
                "error": false
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/bucket/put/report.pdf"))
            .and(header("content-type", "application/pdf"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let file = client
            .upload_file("report.pdf", b"%PDF-1.7".to_vec())
            .await
            .unwrap();
        assert_eq!(file.url, "https://files.example/report.pdf");
        assert_eq!(file.name, "report.pdf");
    }

    #[tokio::test]
    async fn upload_error_flag_is_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file/upload/get-presigned-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": true,
                "message": "quota exceeded"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .upload_file("a.pdf", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, PdfCoError::Upload(msg) if msg == "quota exceeded"));
    }

    #[tokio::test]
    async fn presigned_server_error_is_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file/upload/get-presigned-url"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .upload_file("a.pdf", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(
            matches!(&err, PdfCoError::Upload(msg) if msg.contains("500") && msg.contains("internal error")),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn failed_transfer_is_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file/upload/get-presigned-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "presignedUrl": format!("{}/bucket/put", server.uri()),
                "url": "https://files.example/a.pdf"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .upload_file("a.pdf", vec![0])
            .await
            .unwrap_err();
        assert!(matches!(err, PdfCoError::Upload(_)));
    }

    #[tokio::test]
    async fn submit_rotate_sends_angle_and_async_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pdf/rotate"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(json!({
                "url": "https://files.example/a.pdf",
                "angle": 90,
                "async": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": "JOB-42",
                "error": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let job = client_for(&server)
            .await
            .submit_named("rotate", &[uploaded("a.pdf")], &OperationParams::default())
            .await
            .unwrap();
        assert_eq!(job.id, "JOB-42");
        assert_eq!(job.operation, Operation::Rotate);
        assert_eq!(job.status(), JobStatus::Submitted);
    }

    #[tokio::test]
    async fn every_operation_returns_a_job_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "J" })))
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        let inputs = [uploaded("a.pdf"), uploaded("b.pdf")];
        let params = OperationParams {
            password: Some("pw".into()),
            ..Default::default()
        };

        for op in Operation::ALL {
            let job = client.submit(op, &inputs, &params).await.unwrap();
            assert!(!job.id.is_empty(), "{op} returned an empty id");
        }
    }

    #[tokio::test]
    async fn unknown_operation_fails_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .submit_named("shred", &[uploaded("a.pdf")], &OperationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfCoError::Submission(_)));
    }

    #[tokio::test]
    async fn service_rejection_is_submission_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pdf/optimize"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": true,
                "message": "invalid url"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .submit(Operation::Compress, &[uploaded("a.pdf")], &OperationParams::default())
            .await
            .unwrap_err();
        match err {
            PdfCoError::Submission(msg) => assert!(msg.contains("invalid url")),
            other => panic!("expected Submission, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_job_id_is_submission_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": false })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .submit(Operation::Compress, &[uploaded("a.pdf")], &OperationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfCoError::Submission(_)));
    }

    #[tokio::test]
    async fn check_job_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job/check"))
            .and(query_param("jobid", "J-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "url": "https://results.example/out.pdf"
            })))
            .mount(&server)
            .await;

        let status = client_for(&server).await.check_job("J-1").await.unwrap();
        assert_eq!(
            status,
            RemoteStatus::Success {
                url: "https://results.example/out.pdf".into()
            }
        );
    }

    #[tokio::test]
    async fn check_job_http_error_is_reported_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job/check"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": true,
                "message": "invalid api key"
            })))
            .mount(&server)
            .await;

        let status = client_for(&server).await.check_job("J-1").await.unwrap();
        match status {
            RemoteStatus::Failed { reason } => assert!(reason.contains("invalid api key")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_text_reads_result_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/results/scan.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("page one text"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let text = client
            .fetch_text(&format!("{}/results/scan.txt", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "page one text");

        let err = client
            .download(&format!("{}/results/missing.txt", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfCoError::ResultFetch { .. }));
    }
}
