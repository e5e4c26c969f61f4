//! Document assistance on top of the Gemini API.
//!
//! Every feature that needs structured output asks for it through a
//! response schema and parses the JSON; nothing here splits prose on
//! markers. Summaries degrade to fixed fallback text when the model call
//! fails; questions and speech propagate their errors.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::config::PdfAssistConfig;
use crate::error::PdfAssistError;
use crate::gemini::types::GenerationConfig;
use crate::gemini::{
    ContentGenerator, FunctionDeclaration, GeminiError, GenerateContentRequest, Tool,
};
use crate::pdfco::{Operation, OperationParams};

const MAX_CHAT_CONTEXT_CHARS: usize = 1_000_000;
const MAX_SUMMARY_INPUT_CHARS: usize = 4_000;
const MAX_ANALYSIS_INPUT_CHARS: usize = 15_000;
/// Below this many characters a document is treated as scanned/image-only.
const MIN_TEXT_CHARS: usize = 100;

/// A conversion the user asked for in natural language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolIntent {
    pub operation: Operation,
    pub params: OperationParams,
    pub needs_files: usize,
    pub message: String,
}

impl ToolIntent {
    pub fn new(operation: Operation, params: OperationParams) -> Self {
        let mut message = match operation {
            Operation::Merge => {
                "Great! I can help you **merge** your files. Please upload at least 2 files."
                    .to_string()
            }
            _ => format!("Great! I can help you **{operation}** your file."),
        };
        match operation {
            Operation::Split => {
                let pages = params
                    .pages
                    .as_deref()
                    .unwrap_or(crate::pdfco::operation::DEFAULT_SPLIT_PAGES);
                message.push_str(&format!(" You want to split pages: \"{pages}\"."));
            }
            Operation::Protect | Operation::Unlock => {
                if params.password.is_some() {
                    message.push_str(" The password is set.");
                } else {
                    message.push_str(" You can set a password in the options if needed.");
                }
            }
            Operation::Rotate => {
                let angle = params
                    .angle
                    .unwrap_or(crate::pdfco::operation::DEFAULT_ROTATE_ANGLE);
                message.push_str(&format!(" We'll rotate by {angle} degrees."));
            }
            _ => {}
        }
        message.push_str("\n\nPlease upload the file(s) you'd like to process.");

        Self {
            operation,
            params,
            needs_files: operation.min_inputs(),
            message,
        }
    }
}

/// How long an answer should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerStyle {
    #[default]
    Detailed,
    Simple,
}

/// Extracted document text and where it came from.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub file_name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub page: u32,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnswer {
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default = "default_true")]
    pub found_in_document: bool,
}

fn default_true() -> bool {
    true
}

/// Key facts pulled out of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartSummary {
    pub document_type: String,
    pub key_dates: String,
    pub numbers_and_amounts: String,
    pub people_and_orgs: String,
    pub flags: String,
    pub summary_text: String,
    #[serde(default)]
    pub is_scanned: bool,
}

impl SmartSummary {
    fn fallback(is_scanned: bool) -> Self {
        Self {
            document_type: "Document".to_string(),
            key_dates: "N/A".to_string(),
            numbers_and_amounts: "N/A".to_string(),
            people_and_orgs: "N/A".to_string(),
            flags: "Analysis could not be completed.".to_string(),
            summary_text: "Could not generate a summary for this document.".to_string(),
            is_scanned,
        }
    }
}

/// Synthesised speech as returned by the model.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl SpeechAudio {
    /// Sample rate announced in an `audio/L16;...;rate=N` mime type.
    fn pcm_rate(&self) -> Option<u32> {
        if !self.mime_type.to_ascii_lowercase().starts_with("audio/l16") {
            return None;
        }
        self.mime_type
            .split(';')
            .filter_map(|p| p.trim().strip_prefix("rate="))
            .find_map(|r| r.parse().ok())
    }

    /// Bytes ready to be written to disk: raw 16-bit mono PCM gets a WAV
    /// header, anything else is passed through.
    pub fn into_file_bytes(self) -> Vec<u8> {
        let Some(rate) = self.pcm_rate() else {
            return self.data;
        };
        // RIFF sizes are 32-bit; audio that does not fit stays raw.
        let sizes = u32::try_from(self.data.len()).ok().and_then(|len| {
            Some((len, len.checked_add(36)?, rate.checked_mul(2)?))
        });
        let Some((data_len, riff_len, byte_rate)) = sizes else {
            return self.data;
        };
        let mut out = Vec::with_capacity(44 + self.data.len());
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&riff_len.to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&self.data);
        out
    }
}

/// Gemini-backed assistant. Owns its generator; models come from config.
pub struct Assistant<G> {
    generator: G,
    chat_model: String,
    fast_model: String,
    speech_model: String,
    speech_voice: String,
}

impl<G: ContentGenerator> Assistant<G> {
    pub fn new(generator: G, config: &PdfAssistConfig) -> Self {
        Self {
            generator,
            chat_model: config.chat_model.clone(),
            fast_model: config.fast_model.clone(),
            speech_model: config.speech_model.clone(),
            speech_voice: config.speech_voice.clone(),
        }
    }

    /// Work out which conversion a free-text request is asking for.
    /// Returns `None` when the model proposes no tool or the call fails.
    pub async fn detect_tool(&self, prompt: &str) -> Option<ToolIntent> {
        match self.try_detect_tool(prompt).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "tool detection failed");
                None
            }
        }
    }

    async fn try_detect_tool(&self, prompt: &str) -> Result<Option<ToolIntent>, PdfAssistError> {
        let mut req = GenerateContentRequest::user_text(prompt);
        req.tools = vec![Tool {
            function_declarations: tool_declarations(),
        }];

        let response = self
            .generator
            .generate_content(&self.fast_model, &req)
            .await?;
        let Some(call) = response.function_calls().into_iter().next() else {
            return Ok(None);
        };

        let operation: Operation = call.name.parse()?;
        Ok(Some(ToolIntent::new(
            operation,
            OperationParams::from_args(&call.args),
        )))
    }

    /// Answer a question, grounded in the document when one is given.
    pub async fn ask(
        &self,
        question: &str,
        document: Option<&DocumentContext>,
        style: AnswerStyle,
    ) -> Result<DocumentAnswer, PdfAssistError> {
        let (prompt, mut instruction) = match document {
            Some(doc) => (
                format!(
                    "Document context:\n{}\n\nUser query: {question}",
                    truncate_chars(&doc.text, MAX_CHAT_CONTEXT_CHARS)
                ),
                format!(
                    "You are an expert AI document assistant named PDF Assist. Answer user \
                     questions based *only* on the provided document text from the file named \
                     \"{}\".\n\
                     - Your response must be accurate.\n\
                     - Ground every part of your answer in the document.\n\
                     - For each piece of information, add a citation with the page number and a \
                     short, relevant quote from that page.\n\
                     - If the document does not contain the answer, set foundInDocument to false, \
                     say so, and do not provide any external information.\n\
                     - Avoid conversational fluff.",
                    doc.file_name
                ),
            ),
            None => (
                question.to_string(),
                "You are PDF Assist, a helpful assistant for questions about PDF documents \
                 and document workflows. Leave citations empty."
                    .to_string(),
            ),
        };
        instruction.push_str(match style {
            AnswerStyle::Simple => "\n- Keep your answer to 1-2 sentences.",
            AnswerStyle::Detailed => "\n- Provide a comprehensive, detailed answer.",
        });

        let req = GenerateContentRequest::user_text(prompt)
            .with_system_instruction(instruction)
            .with_response_schema(answer_schema());
        let response = self
            .generator
            .generate_content(&self.chat_model, &req)
            .await?;
        let text = response
            .text()
            .ok_or_else(|| GeminiError::InvalidResponse("answer has no text".to_string()))?;

        let answer: DocumentAnswer = serde_json::from_str(&text)?;
        Ok(answer)
    }

    /// Three or four key points about the document.
    pub async fn summarize(&self, text: &str) -> Vec<String> {
        if is_scanned(text) {
            return vec![
                "This appears to be a scanned or image-only document.".to_string(),
                "Analysis is limited.".to_string(),
            ];
        }
        match self.try_summarize(text).await {
            Ok(points) if !points.is_empty() => points,
            Ok(_) => vec!["Could not generate a summary for this document.".to_string()],
            Err(e) => {
                warn!(error = %e, "summary failed");
                vec!["Could not generate a summary for this document.".to_string()]
            }
        }
    }

    async fn try_summarize(&self, text: &str) -> Result<Vec<String>, PdfAssistError> {
        #[derive(Deserialize)]
        struct Points {
            points: Vec<String>,
        }

        let prompt = format!(
            "Generate a concise, structured summary of the following document as 3-4 key \
             points. Text: {}",
            truncate_chars(text, MAX_SUMMARY_INPUT_CHARS)
        );
        let req = GenerateContentRequest::user_text(prompt).with_response_schema(json!({
            "type": "OBJECT",
            "properties": {
                "points": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["points"]
        }));
        let response = self
            .generator
            .generate_content(&self.fast_model, &req)
            .await?;
        let body = response
            .text()
            .ok_or_else(|| GeminiError::InvalidResponse("summary has no text".to_string()))?;
        let points: Points = serde_json::from_str(&body)?;

        Ok(points
            .points
            .into_iter()
            .map(|p| p.trim().trim_start_matches(['*', '-']).trim().to_string())
            .filter(|p| !p.is_empty())
            .collect())
    }

    /// Document type, dates, amounts, parties, flags and a one-paragraph summary.
    pub async fn smart_summary(&self, text: &str, file_name: &str) -> SmartSummary {
        let scanned = is_scanned(text);
        match self.try_smart_summary(text, file_name).await {
            Ok(mut summary) => {
                summary.is_scanned = scanned;
                summary
            }
            Err(e) => {
                warn!(error = %e, file_name, "structured summary failed");
                SmartSummary::fallback(scanned)
            }
        }
    }

    async fn try_smart_summary(
        &self,
        text: &str,
        file_name: &str,
    ) -> Result<SmartSummary, PdfAssistError> {
        let prompt = format!(
            "Analyze the following document text from a file named \"{file_name}\". Extract \
             key information and provide a summary. Text: \n\n```\n{}\n```",
            truncate_chars(text, MAX_ANALYSIS_INPUT_CHARS)
        );
        let req = GenerateContentRequest::user_text(prompt).with_response_schema(smart_summary_schema());
        let response = self
            .generator
            .generate_content(&self.chat_model, &req)
            .await?;
        let body = response
            .text()
            .ok_or_else(|| GeminiError::InvalidResponse("summary has no text".to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Read text aloud with the configured voice.
    pub async fn speak(&self, text: &str) -> Result<SpeechAudio, PdfAssistError> {
        let mut req = GenerateContentRequest::user_text(text);
        req.generation_config = Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(json!({
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": self.speech_voice } }
            })),
            ..Default::default()
        });

        let response = self
            .generator
            .generate_content(&self.speech_model, &req)
            .await?;
        let inline = response
            .inline_data()
            .ok_or_else(|| GeminiError::InvalidResponse("no audio in response".to_string()))?;
        let data = BASE64
            .decode(inline.data.as_bytes())
            .map_err(|e| GeminiError::InvalidResponse(format!("audio is not base64: {e}")))?;
        if data.is_empty() {
            return Err(GeminiError::InvalidResponse("audio is empty".to_string()).into());
        }

        Ok(SpeechAudio {
            mime_type: inline.mime_type.clone(),
            data,
        })
    }
}

fn is_scanned(text: &str) -> bool {
    text.trim().chars().count() < MIN_TEXT_CHARS
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn string_param(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

/// One function declaration per operation, with its tunable arguments.
fn tool_declarations() -> Vec<FunctionDeclaration> {
    Operation::ALL
        .into_iter()
        .map(|op| {
            let properties = match op {
                Operation::Split => Some(json!({ "pages": string_param("e.g., \"1-3, 5\"") })),
                Operation::Unlock => Some(json!({
                    "password": string_param("The password to unlock the PDF.")
                })),
                Operation::Protect => Some(json!({
                    "password": string_param("The password to protect the PDF.")
                })),
                Operation::Rotate => Some(json!({
                    "angle": {
                        "type": "NUMBER",
                        "description": "The angle to rotate by (e.g., 90, 180, 270)."
                    }
                })),
                Operation::Watermark => Some(json!({ "text": string_param("The watermark text.") })),
                _ => None,
            };
            FunctionDeclaration {
                name: op.name().to_string(),
                description: op.description().to_string(),
                parameters: properties.map(|p| json!({ "type": "OBJECT", "properties": p })),
            }
        })
        .collect()
}

fn answer_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "answer": { "type": "STRING" },
            "citations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "page": { "type": "INTEGER" },
                        "quote": { "type": "STRING" }
                    },
                    "required": ["page", "quote"]
                }
            },
            "foundInDocument": { "type": "BOOLEAN" }
        },
        "required": ["answer", "citations", "foundInDocument"]
    })
}

fn smart_summary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "documentType": string_param("Classify the document type (e.g., 'Contract', 'Invoice', 'Report'). If unknown, use 'General Document'."),
            "keyDates": string_param("Extract key dates. If none, use 'N/A'."),
            "numbersAndAmounts": string_param("Extract important numbers or monetary amounts. If none, use 'N/A'."),
            "peopleAndOrgs": string_param("List people or organizations mentioned. If none, use 'N/A'."),
            "flags": string_param("Identify any potential warnings or items needing attention (e.g., 'Missing Signature'). If none, use 'None'."),
            "summaryText": string_param("Provide a concise, one-paragraph summary of the document's main purpose.")
        },
        "required": ["documentType", "keyDates", "numbersAndAmounts", "peopleAndOrgs", "flags", "summaryText"]
    })
}
