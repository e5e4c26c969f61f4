//! Interface de terminal do pdfassist — spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`JobProgress`] acompanha visualmente
//! o upload, a submissão e o polling de um job no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use crate::job::{JobReport, JobStatus};

/// Falha que já foi exibida ao usuário por [`JobProgress::fail`].
///
/// `main` não repete a mensagem de erros deste tipo.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Reported(pub String);

/// Indica se o erro (ou a causa dele) já foi exibido.
pub fn is_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Reported>().is_some()
}

/// Indicador visual de progresso para um job no terminal.
///
/// Exibe um spinner animado durante o processamento e mensagens
/// coloridas para sucesso (verde) e falha (vermelho).
pub struct JobProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl JobProgress {
    /// Inicia o spinner com a descrição da etapa inicial.
    pub fn start(description: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        // O template é constante; se for rejeitado, fica o estilo padrão.
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(description.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }

    /// Atualiza a mensagem do spinner.
    pub fn stage(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Reflete uma consulta de status: tentativa atual, orçamento e status.
    pub fn attempt(&self, attempt: u32, max: u32, status: JobStatus) {
        let status = match status {
            JobStatus::Succeeded => self.green.apply_to(status.to_string()),
            JobStatus::Failed | JobStatus::TimedOut => self.red.apply_to(status.to_string()),
            JobStatus::Submitted | JobStatus::InProgress => self.yellow.apply_to(status.to_string()),
        };
        self.pb.set_message(format!("{status} (check {attempt}/{max})"));
    }

    /// Finaliza o spinner com sucesso e mostra o resultado.
    pub fn succeed(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    /// Finaliza o spinner com a mesma mensagem genérica para qualquer falha;
    /// o detalhe vai em seguida, esmaecido. Devolve o erro já marcado
    /// como exibido.
    pub fn fail(&self, detail: &str) -> Reported {
        self.pb.finish_and_clear();
        eprintln!(
            "  {} Something went wrong while processing your file. Please try again.",
            self.red.apply_to("✗")
        );
        eprintln!("    {}", self.dim.apply_to(detail));
        Reported(detail.to_string())
    }

    /// Imprime o relatório do job formatado em JSON.
    pub fn print_report(&self, report: &JobReport) {
        let status_style = match report.status {
            JobStatus::Succeeded => &self.green,
            JobStatus::Failed | JobStatus::TimedOut => &self.red,
            _ => &self.yellow,
        };
        println!();
        println!("{}", status_style.apply_to("─── Job Report ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn failure_shown_by_spinner_is_not_printed_again() {
        let progress = JobProgress::start("Uploading 1 file(s) for compress...");
        let err: anyhow::Error = progress.fail("job J-1 failed: corrupt input").into();
        assert!(is_reported(&err));
        assert_eq!(err.to_string(), "job J-1 failed: corrupt input");
    }

    #[test]
    fn context_keeps_the_reported_marker() {
        let err = Err::<(), _>(Reported("detail".into()))
            .context("while reading")
            .unwrap_err();
        assert!(is_reported(&err));
    }

    #[test]
    fn other_errors_are_printed() {
        let err = anyhow::Error::from(std::io::Error::other("disk full"));
        assert!(!is_reported(&err));
    }
}
