//! Client side of the normrag query service.
//!
//! [`ApiClient`] posts questions to `{base}/ask`; [`render_answer`] formats
//! the reply for the terminal. Failures are classified so the UI can tell a
//! server that is down from one that answered with an error.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use thiserror::Error;

/// Used when neither `--api-url` nor `API_URL` is given.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Built-in example questions: short label, full question.
pub const EXAMPLE_QUESTIONS: [(&str, &str); 4] = [
    (
        "Procedimentos obrigatórios",
        "Quais procedimentos são obrigatórios segundo a norma?",
    ),
    (
        "Calibração de equipamentos",
        "Quando devo calibrar equipamentos de medição?",
    ),
    (
        "Retenção de registros",
        "Por quanto tempo devo reter registros de ensaio?",
    ),
    (
        "Manuseio de amostras",
        "Onde encontro informações sobre manuseio de amostras?",
    ),
];

/// Example question by 1-based number.
pub fn example_question(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|i| EXAMPLE_QUESTIONS.get(i))
        .map(|(_, question)| *question)
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Por favor, digite uma consulta.")]
    EmptyQuestion,
    #[error("Erro ao conectar à API: {0}")]
    Connect(String),
    #[error("Tempo esgotado aguardando a API: {0}")]
    Timeout(String),
    #[error("Erro na API ({status})")]
    Api { status: u16, body: String },
    #[error("Erro inesperado: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() {
            ClientError::Connect(err.to_string())
        } else {
            ClientError::Other(err.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

/// The parts of the `/ask` reply the terminal shows.
#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub context_used: Vec<String>,
    #[serde(default)]
    pub documents_retrieved: usize,
    #[serde(default)]
    pub generation_error: Option<String>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Other(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one question. Blank input never reaches the network.
    pub async fn ask(&self, question: &str) -> Result<AskResponse, ClientError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ClientError::EmptyQuestion);
        }

        let url = format!("{}/ask", self.base_url);
        tracing::debug!(%url, "sending question");
        let response = self
            .http
            .post(&url)
            .json(&AskRequest { question })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<AskResponse>().await?)
    }
}

/// Answer followed by each retrieved snippet as `Documento i:`.
pub fn render_answer(response: &AskResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📝 Resposta do Sistema");
    let _ = writeln!(out, "{}", response.answer);

    if !response.context_used.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "📚 Documentos Recuperados (Contexto Utilizado)");
        let _ = writeln!(
            out,
            "Trechos da norma ISO/IEC 17025 utilizados para gerar a resposta:"
        );
        for (i, context) in response.context_used.iter().enumerate() {
            let _ = writeln!(out, "Documento {}:", i + 1);
            let _ = writeln!(out, "🔹 {context}...");
            let _ = writeln!(out, "---");
        }
    }
    out
}

/// Error text for the terminal, with a hint when the server looks down.
pub fn render_error(err: &ClientError, base_url: &str) -> String {
    match err {
        ClientError::Connect(_) | ClientError::Timeout(_) => {
            format!("{err}\nVerifique se a API está rodando em {base_url}")
        }
        ClientError::Api { body, .. } if !body.is_empty() => format!("{err}: {body}"),
        _ => err.to_string(),
    }
}
