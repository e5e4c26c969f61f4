//! Interface de linha de comando do pdfassist baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] e flags globais
//! (--config, --max-attempts, --interval-ms, --verbose).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::assistant::AnswerStyle;
use crate::pdfco::OperationParams;

/// pdfassist — ferramentas de PDF via PDF.co e assistente de documentos via Gemini.
#[derive(Debug, Parser)]
#[command(name = "pdfassist", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./pdfassist.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Número máximo de consultas de status antes do timeout.
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Intervalo entre consultas de status, em milissegundos.
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Estilo de resposta aceito pela CLI, mapeado para [`AnswerStyle`].
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StyleArg {
    /// Resposta completa e detalhada.
    Detailed,
    /// Uma ou duas frases.
    Simple,
}

impl From<StyleArg> for AnswerStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Detailed => AnswerStyle::Detailed,
            StyleArg::Simple => AnswerStyle::Simple,
        }
    }
}

/// Parâmetros específicos de cada operação.
#[derive(Debug, Clone, Default, Args)]
pub struct ToolOptions {
    /// Intervalo de páginas (split, pdf-to-jpg), ex.: "1-3, 5".
    #[arg(long)]
    pub pages: Option<String>,

    /// Ângulo de rotação em graus (rotate).
    #[arg(long, allow_negative_numbers = true)]
    pub angle: Option<i32>,

    /// Senha (protect, unlock).
    #[arg(long, env = "PDFASSIST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Texto da marca d'água (watermark).
    #[arg(long)]
    pub text: Option<String>,

    /// Idioma do OCR (pdf-to-text), ex.: "eng", "deu".
    #[arg(long)]
    pub ocr_language: Option<String>,
}

impl ToolOptions {
    pub fn to_params(&self) -> OperationParams {
        OperationParams {
            pages: self.pages.clone(),
            angle: self.angle,
            password: self.password.clone(),
            text: self.text.clone(),
            ocr_language: self.ocr_language.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa uma ferramenta: upload, submissão e polling até o resultado.
    Process {
        /// Nome da ferramenta (veja `pdfassist tools`).
        tool: String,

        /// Arquivos de entrada.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: ToolOptions,

        /// Salva o resultado neste caminho em vez de só mostrar a URL.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Mostra o relatório do job em JSON ao final.
        #[arg(long)]
        report: bool,
    },

    /// Lista as ferramentas disponíveis.
    Tools,

    /// Envia um arquivo e mostra a URL de leitura.
    Upload {
        file: PathBuf,
    },

    /// Consulta uma única vez o status de um job.
    Check {
        job_id: String,
    },

    /// Extrai o texto de um PDF via OCR.
    Ocr {
        file: PathBuf,

        /// Idioma do OCR, ex.: "eng".
        #[arg(long)]
        language: Option<String>,
    },

    /// Detecta qual ferramenta um pedido em linguagem natural descreve.
    Detect {
        prompt: String,
    },

    /// Faz uma pergunta, opcionalmente sobre um documento.
    Ask {
        question: String,

        /// Documento de contexto (PDF passa por OCR; outros são lidos como texto).
        #[arg(long, short)]
        document: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "detailed")]
        style: StyleArg,
    },

    /// Resume um documento.
    Summarize {
        file: PathBuf,

        /// Resumo estruturado (tipo, datas, valores, partes, alertas).
        #[arg(long)]
        smart: bool,
    },

    /// Converte texto em fala e salva o áudio.
    Speak {
        text: String,

        #[arg(long, short, default_value = "speech.wav")]
        output: PathBuf,
    },
}
