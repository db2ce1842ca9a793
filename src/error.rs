use thiserror::Error;

use crate::models::ResponseError;

pub const GENERATION_FAILED_MESSAGE: &str =
    "Gagal membuat RPP. Pastikan koneksi internet lancar dan coba lagi.";
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "API Key belum dikonfigurasi. Hubungi administrator aplikasi.";
pub const EXPORT_FAILED_MESSAGE: &str = "Gagal download Word";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API key is missing")]
    MissingCredential,

    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generation service returned no text")]
    EmptyResponse,

    #[error("generated content does not match the lesson plan schema: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("generated content failed validation: {0}")]
    Schema(#[from] ResponseError),

    #[error("generation task stopped before finishing: {0}")]
    Interrupted(String),
}

impl GenerationError {
    /// The single localized message shown to the user. Details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::MissingCredential => MISSING_CREDENTIAL_MESSAGE,
            _ => GENERATION_FAILED_MESSAGE,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("export task failed: {0}")]
    Task(String),
}
