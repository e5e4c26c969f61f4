use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use tracing::{info, warn};

use crate::assistant::DocumentContext;
use crate::error::PdfAssistError;
use crate::extract::extract_pdf_text;
use crate::job::{JobReport, JobStatus};
use crate::pdfco::{Operation, OperationParams, PdfCoClient, UploadedFile};
use crate::poller::{Poller, Sleeper, TokioSleeper};

/// A finished conversion: the job summary plus where to fetch the output.
#[derive(Debug, Clone)]
pub struct ProcessedJob {
    pub report: JobReport,
    pub result_url: String,
}

/// Runs the full upload → submit → poll chain for a tool invocation.
pub struct JobProcessor<S = TokioSleeper> {
    client: PdfCoClient,
    poller: Poller<S>,
}

impl<S: Sleeper> JobProcessor<S> {
    pub fn new(client: PdfCoClient, poller: Poller<S>) -> Self {
        Self { client, poller }
    }

    pub fn client(&self) -> &PdfCoClient {
        &self.client
    }

    pub fn poller(&self) -> &Poller<S> {
        &self.poller
    }

    /// Read a local file and upload it under its own file name.
    pub async fn upload_path(&self, path: &Path) -> Result<UploadedFile, PdfAssistError> {
        let name = file_name(path)?;
        let bytes = tokio::fs::read(path).await?;
        Ok(self.client.upload_file(name, bytes).await?)
    }

    /// Upload every input concurrently, submit `tool`, and poll to completion.
    pub async fn process_files(
        &self,
        tool: &str,
        paths: &[PathBuf],
        params: &OperationParams,
        on_attempt: impl FnMut(u32, JobStatus),
    ) -> Result<ProcessedJob, PdfAssistError> {
        let operation: Operation = tool.parse()?;

        // Validate against local names before spending any uploads.
        let local: Vec<UploadedFile> = paths
            .iter()
            .map(|p| {
                file_name(p).map(|name| UploadedFile {
                    name: name.to_string(),
                    url: String::new(),
                })
            })
            .collect::<Result<_, _>>()?;
        operation.build_body(&local, params)?;

        let uploads = try_join_all(paths.iter().map(|p| self.upload_path(p))).await?;
        info!(%operation, files = uploads.len(), "inputs uploaded");

        let mut job = self.client.submit_named(tool, &uploads, params).await?;
        let outcome = self
            .poller
            .poll_with_progress(&self.client, &mut job, on_attempt)
            .await;
        let report = JobReport::from_job(&job);

        match outcome {
            Ok(result_url) => Ok(ProcessedJob { report, result_url }),
            Err(e) => {
                warn!(job_id = %report.job_id, status = %report.status, error = %e, "job did not succeed");
                Err(e.into())
            }
        }
    }

    /// Extract a document's text with the service's OCR conversion,
    /// falling back to local extraction when the remote job fails.
    pub async fn extract_text(
        &self,
        path: &Path,
        ocr_language: Option<String>,
    ) -> Result<String, PdfAssistError> {
        let remote = match self.ocr_text(path, ocr_language).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };
        warn!(path = %path.display(), error = %remote, "OCR failed, extracting locally");

        let bytes = tokio::fs::read(path).await?;
        extract_pdf_text(bytes).await.map_err(|local| {
            PdfAssistError::Extraction(format!(
                "all methods failed (ocr: {remote}; local: {local})"
            ))
        })
    }

    async fn ocr_text(
        &self,
        path: &Path,
        ocr_language: Option<String>,
    ) -> Result<String, PdfAssistError> {
        let params = OperationParams {
            ocr_language,
            ..Default::default()
        };
        let upload = self.upload_path(path).await?;
        let mut job = self
            .client
            .submit(Operation::PdfToText, &[upload], &params)
            .await?;
        let result_url = self.poller.poll(&self.client, &mut job).await?;
        Ok(self.client.fetch_text(&result_url).await?)
    }

    /// A PDF's text, ready to ground questions and summaries.
    pub async fn load_pdf_document(&self, path: &Path) -> Result<DocumentContext, PdfAssistError> {
        let file_name = file_name(path)?.to_string();
        let text = self.extract_text(path, None).await?;
        Ok(DocumentContext { file_name, text })
    }

    /// Save a result to `dest`, returning the number of bytes written.
    pub async fn download_result(&self, url: &str, dest: &Path) -> Result<usize, PdfAssistError> {
        let bytes = self.client.download(url).await?;
        tokio::fs::write(dest, &bytes).await?;
        info!(dest = %dest.display(), size = bytes.len(), "result saved");
        Ok(bytes.len())
    }
}

fn file_name(path: &Path) -> Result<&str, PdfAssistError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PdfAssistError::InvalidInput(path.to_path_buf()))
}
