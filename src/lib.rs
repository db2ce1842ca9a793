pub mod config;
pub mod coordinator;
pub mod error;
pub mod form;
pub mod generation;
pub mod logger;
pub mod models;
pub mod render;
pub mod templates;
pub mod web;

pub use coordinator::{Coordinator, CoordinatorState, SessionStore};
pub use error::{ExportError, GenerationError};
pub use generation::{GeminiClient, LessonGenerator};
pub use models::{RPPRequest, RPPResponse};
pub use render::LessonDocument;
