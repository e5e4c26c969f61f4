use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::error::PdfCoError;
use super::types::UploadedFile;

/// Default page range for `split`: every page from the first.
pub const DEFAULT_SPLIT_PAGES: &str = "1-";
/// Default page range for `pdf-to-jpg` (zero-based on the service side).
pub const DEFAULT_IMAGE_PAGES: &str = "0-";
pub const DEFAULT_ROTATE_ANGLE: i32 = 90;
pub const DEFAULT_WATERMARK_TEXT: &str = "SAMPLE";
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// The fixed set of conversion operations the service is asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Merge,
    Split,
    Compress,
    PdfToWord,
    WordToPdf,
    ExcelToPdf,
    PdfToJpg,
    PdfToText,
    Protect,
    Unlock,
    Rotate,
    Watermark,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::Merge,
        Operation::Split,
        Operation::Compress,
        Operation::PdfToWord,
        Operation::WordToPdf,
        Operation::ExcelToPdf,
        Operation::PdfToJpg,
        Operation::PdfToText,
        Operation::Protect,
        Operation::Unlock,
        Operation::Rotate,
        Operation::Watermark,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Merge => "merge",
            Operation::Split => "split",
            Operation::Compress => "compress",
            Operation::PdfToWord => "pdf-to-word",
            Operation::WordToPdf => "word-to-pdf",
            Operation::ExcelToPdf => "excel-to-pdf",
            Operation::PdfToJpg => "pdf-to-jpg",
            Operation::PdfToText => "pdf-to-text",
            Operation::Protect => "protect",
            Operation::Unlock => "unlock",
            Operation::Rotate => "rotate",
            Operation::Watermark => "watermark",
        }
    }

    /// Endpoint path relative to the API base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Operation::Merge => "/pdf/merge",
            Operation::Split => "/pdf/split",
            Operation::Compress => "/pdf/optimize",
            Operation::PdfToWord => "/pdf/convert/to/doc",
            Operation::WordToPdf => "/pdf/convert/from/doc",
            Operation::ExcelToPdf => "/pdf/convert/from/xlsx",
            Operation::PdfToJpg => "/pdf/convert/to/jpg",
            Operation::PdfToText => "/pdf/convert/to/text-simple",
            Operation::Protect => "/pdf/security/add",
            Operation::Unlock => "/pdf/security/remove",
            Operation::Rotate => "/pdf/rotate",
            Operation::Watermark => "/pdf/edit/add",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::Merge => "Combine multiple PDF files into one.",
            Operation::Split => "Extract specific pages or page ranges from a PDF.",
            Operation::Compress => "Reduce the file size of a PDF.",
            Operation::PdfToWord => "Convert a PDF to a Word document (.doc).",
            Operation::WordToPdf => "Convert a Word document (.doc or .docx) to a PDF.",
            Operation::ExcelToPdf => "Convert an Excel spreadsheet (.xlsx) to a PDF.",
            Operation::PdfToJpg => "Convert PDF pages to JPG images.",
            Operation::PdfToText => "Extract the text of a PDF, running OCR on scanned pages.",
            Operation::Protect => "Add a password to a PDF.",
            Operation::Unlock => "Remove a password from a PDF.",
            Operation::Rotate => "Rotate pages in a PDF.",
            Operation::Watermark => "Add a text watermark to a PDF.",
        }
    }

    /// Minimum number of uploaded inputs the operation accepts.
    pub fn min_inputs(self) -> usize {
        match self {
            Operation::Merge => 2,
            _ => 1,
        }
    }

    /// Check parameters and inputs, then build the JSON body for the
    /// operation's endpoint. The body always requests asynchronous mode.
    pub fn build_body(
        self,
        inputs: &[UploadedFile],
        params: &OperationParams,
    ) -> Result<Value, PdfCoError> {
        let first = inputs.first().ok_or_else(|| {
            PdfCoError::Submission(format!("{self} requires at least one input file"))
        })?;
        if inputs.len() < self.min_inputs() {
            return Err(PdfCoError::Submission(format!(
                "{self} requires at least {} input files, got {}",
                self.min_inputs(),
                inputs.len()
            )));
        }

        let mut body = match self {
            Operation::Merge => {
                let urls: Vec<&str> = inputs.iter().map(|f| f.url.as_str()).collect();
                json!({ "url": urls.join(","), "name": "merged_files.pdf" })
            }
            Operation::Split => json!({
                "url": first.url,
                "pages": page_range(self, params, DEFAULT_SPLIT_PAGES)?,
                "name": format!("split_{}", first.name),
            }),
            Operation::Compress => json!({
                "url": first.url,
                "name": format!("compressed_{}", first.name),
            }),
            Operation::PdfToWord => json!({ "url": first.url, "name": result_name(self, "doc") }),
            Operation::WordToPdf | Operation::ExcelToPdf => {
                json!({ "url": first.url, "name": result_name(self, "pdf") })
            }
            Operation::PdfToJpg => json!({
                "url": first.url,
                "pages": page_range(self, params, DEFAULT_IMAGE_PAGES)?,
                "name": result_name(self, "jpg"),
            }),
            Operation::PdfToText => {
                let stem = Path::new(&first.name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                json!({
                    "url": first.url,
                    "ocrLanguage": params.ocr_language.as_deref().unwrap_or(DEFAULT_OCR_LANGUAGE),
                    "name": format!("{stem}.txt"),
                })
            }
            Operation::Protect => {
                let password = required_password(self, params)?;
                json!({
                    "url": first.url,
                    "userPassword": password,
                    "ownerPassword": password,
                    "name": format!("protected_{}", first.name),
                })
            }
            Operation::Unlock => json!({
                "url": first.url,
                "password": required_password(self, params)?,
                "name": format!("unlocked_{}", first.name),
            }),
            Operation::Rotate => {
                let angle = params.angle.unwrap_or(DEFAULT_ROTATE_ANGLE);
                if angle % 90 != 0 {
                    return Err(PdfCoError::Submission(format!(
                        "rotate angle must be a multiple of 90, got {angle}"
                    )));
                }
                json!({
                    "url": first.url,
                    "angle": angle,
                    "name": format!("rotated_{}", first.name),
                })
            }
            Operation::Watermark => json!({
                "url": first.url,
                "name": format!("watermarked_{}", first.name),
                "text": [{
                    "text": params.text.as_deref().unwrap_or(DEFAULT_WATERMARK_TEXT),
                    "x": 50,
                    "y": 50,
                    "size": 24,
                    "color": "FF0000",
                }],
            }),
        };

        if let Value::Object(map) = &mut body {
            map.insert("async".to_string(), Value::Bool(true));
        }
        Ok(body)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = PdfCoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == wanted)
            .ok_or_else(|| PdfCoError::Submission(format!("unknown operation: {s}")))
    }
}

/// Operation-specific knobs. Each operation reads only the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_language: Option<String>,
}

impl OperationParams {
    /// Read parameters from loosely typed JSON arguments (e.g. a model's
    /// function-call args). Unknown keys are ignored; numeric strings are
    /// accepted for the angle.
    pub fn from_args(args: &Map<String, Value>) -> Self {
        let string = |key: &str| {
            args.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let angle = args.get("angle").and_then(|v| match v {
            Value::Number(n) => n.as_f64().map(|f| f.round() as i32),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        Self {
            pages: string("pages"),
            angle,
            password: string("password"),
            text: string("text"),
            ocr_language: None,
        }
    }
}

fn result_name(op: Operation, extension: &str) -> String {
    format!("{}_result.{extension}", op.name())
}

fn page_range<'a>(
    op: Operation,
    params: &'a OperationParams,
    default: &'a str,
) -> Result<&'a str, PdfCoError> {
    match params.pages.as_deref() {
        Some(pages) if pages.trim().is_empty() => Err(PdfCoError::Submission(format!(
            "{op} requires a non-empty page range"
        ))),
        Some(pages) => Ok(pages.trim()),
        None => Ok(default),
    }
}

fn required_password(op: Operation, params: &OperationParams) -> Result<&str, PdfCoError> {
    params
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| PdfCoError::Submission(format!("{op} requires a password")))
}
