//! Per-session page state: the form, a generation in flight, or a result.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::GenerationError;
use crate::form::FormInput;
use crate::generation::LessonGenerator;
use crate::models::{RPPRequest, RPPResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorState {
    Form {
        error: Option<String>,
        /// Values to repopulate the form with.
        draft: FormInput,
    },
    Loading {
        request: RPPRequest,
    },
    Result {
        request: RPPRequest,
        response: RPPResponse,
    },
}

impl Default for CoordinatorState {
    fn default() -> Self {
        CoordinatorState::Form {
            error: None,
            draft: FormInput::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("a lesson plan is already being generated")]
    Busy,

    #[error("a result is being shown; reset first")]
    ResultShown,

    #[error("no generation is in flight")]
    NotLoading,
}

#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    state: CoordinatorState,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, CoordinatorState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            CoordinatorState::Form { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<(&RPPRequest, &RPPResponse)> {
        match &self.state {
            CoordinatorState::Result { request, response } => Some((request, response)),
            _ => None,
        }
    }

    fn ensure_form(&self) -> Result<(), CoordinatorError> {
        match self.state {
            CoordinatorState::Form { .. } => Ok(()),
            CoordinatorState::Loading { .. } => Err(CoordinatorError::Busy),
            CoordinatorState::Result { .. } => Err(CoordinatorError::ResultShown),
        }
    }

    /// Form → Loading. Clears any previous error.
    pub fn begin(&mut self, request: RPPRequest) -> Result<(), CoordinatorError> {
        self.ensure_form()?;
        self.state = CoordinatorState::Loading { request };
        Ok(())
    }

    /// Loading → Result on success, Loading → Form with the user-facing
    /// message and the submitted values on failure.
    pub fn complete(
        &mut self,
        outcome: Result<RPPResponse, GenerationError>,
    ) -> Result<(), CoordinatorError> {
        let request = match &self.state {
            CoordinatorState::Loading { request } => request.clone(),
            _ => return Err(CoordinatorError::NotLoading),
        };

        self.state = match outcome {
            Ok(response) => CoordinatorState::Result { request, response },
            Err(err) => {
                tracing::error!(error = %err, subject = %request.subject, "Lesson plan generation failed");
                CoordinatorState::Form {
                    error: Some(err.user_message().to_string()),
                    draft: FormInput::from_request(&request),
                }
            }
        };
        Ok(())
    }

    /// Submission that never reached the generator.
    pub fn reject(&mut self, message: impl Into<String>, draft: FormInput) -> Result<(), CoordinatorError> {
        self.ensure_form()?;
        self.state = CoordinatorState::Form {
            error: Some(message.into()),
            draft,
        };
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state = CoordinatorState::default();
    }

    /// begin, generate, complete. For callers that own the coordinator
    /// outright; the web layer drives the steps itself so no lock is held
    /// while the generator runs.
    pub async fn submit(
        &mut self,
        generator: &dyn LessonGenerator,
        request: RPPRequest,
    ) -> Result<(), CoordinatorError> {
        self.begin(request.clone())?;
        let outcome = generator.generate(&request).await;
        self.complete(outcome)
    }
}

/// How long an idle session is kept. Matches the session cookie lifetime.
pub const SESSION_TTL: Duration = Duration::days(1);

struct Session {
    coordinator: Coordinator,
    last_seen: OffsetDateTime,
}

impl Session {
    fn new(now: OffsetDateTime) -> Self {
        Self {
            coordinator: Coordinator::new(),
            last_seen: now,
        }
    }
}

/// In-memory coordinators keyed by session id. Idle sessions are pruned
/// after the TTL; a session with a generation in flight is never pruned.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Copy of the session's coordinator. Touches the session if it exists.
    pub async fn snapshot(&self, id: Uuid) -> Coordinator {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&id) {
            Some(session) => {
                session.last_seen = OffsetDateTime::now_utc();
                session.coordinator.clone()
            }
            None => Coordinator::new(),
        }
    }

    /// Runs `f` against the session's coordinator, creating it if needed.
    pub async fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut Coordinator) -> T) -> T {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.lock().await;
        self.prune(&mut sessions, now);

        let session = sessions.entry(id).or_insert_with(|| Session::new(now));
        session.last_seen = now;
        f(&mut session.coordinator)
    }

    /// Drops the session so the next visit starts from an empty form.
    /// Ignored while a generation is in flight.
    pub async fn reset(&self, id: Uuid) -> Result<(), CoordinatorError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.get(&id).is_some_and(|s| s.coordinator.is_loading()) {
            return Err(CoordinatorError::Busy);
        }
        sessions.remove(&id);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn prune(&self, sessions: &mut HashMap<Uuid, Session>, now: OffsetDateTime) {
        let before = sessions.len();
        sessions.retain(|_, s| s.coordinator.is_loading() || now - s.last_seen <= self.ttl);
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
    }
}
