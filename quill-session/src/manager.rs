//! Multi-session management: creation, switching, deletion, persistence.

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::session::Session;

/// Errors from session bookkeeping.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(Uuid),

    #[error("failed to import session: {0}")]
    Import(String),
}

/// Ordered collection of sessions with one current session.
///
/// Invariant: there is always at least one session, and the current id
/// always refers to one of them.
pub struct SessionManager {
    sessions: Vec<Session>,
    current: Uuid,
    counter: usize,
}

impl SessionManager {
    /// Manager with an initial "Session 1".
    pub fn new() -> Self {
        let initial = Session::new("Session 1");
        let current = initial.id;
        Self { sessions: vec![initial], current, counter: 1 }
    }

    /// Create a session; auto-names it "Session N" when no name is given.
    pub fn create_session(&mut self, name: Option<String>) -> &Session {
        self.counter += 1;
        let name = name.unwrap_or_else(|| format!("Session {}", self.counter));
        let session = Session::new(name);
        info!(session = %session.id, name = session.name.as_str(), "created session");
        self.sessions.push(session);
        self.sessions.last().expect("just pushed")
    }

    /// Make another session current.
    pub fn switch(&mut self, id: Uuid) -> Result<(), SessionError> {
        if self.get(id).is_none() {
            return Err(SessionError::NotFound(id));
        }
        self.current = id;
        Ok(())
    }

    /// Delete a session; unknown ids are ignored.
    ///
    /// Deleting the current session switches to the first remaining one,
    /// or creates a fresh session when it was the last.
    pub fn delete(&mut self, id: Uuid) {
        let was_current = self.current == id;
        self.sessions.retain(|s| s.id != id);

        if self.sessions.is_empty() {
            let replacement = Session::new("Session 1");
            self.current = replacement.id;
            self.counter = 1;
            self.sessions.push(replacement);
        } else if was_current {
            self.current = self.sessions[0].id;
        }
    }

    /// Rename a session.
    pub fn rename(&mut self, id: Uuid, name: impl Into<String>) -> Result<(), SessionError> {
        let session = self.get_mut(id).ok_or(SessionError::NotFound(id))?;
        session.name = name.into();
        Ok(())
    }

    /// Look up a session by id.
    pub fn get(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// The current session.
    pub fn current(&self) -> &Session {
        self.sessions.iter().find(|s| s.id == self.current).unwrap_or(&self.sessions[0])
    }

    /// The current session, mutably.
    pub fn current_mut(&mut self) -> &mut Session {
        let current = self.current;
        let index =
            self.sessions.iter().position(|s| s.id == current).unwrap_or_default();
        &mut self.sessions[index]
    }

    /// All sessions, in creation order.
    pub fn list(&self) -> &[Session] {
        &self.sessions
    }

    /// Number of sessions.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Copy a session under a fresh id with a " (Copy)" suffix. The
    /// transcript and system prompt are copied; the retriever is not.
    pub fn duplicate(&mut self, id: Uuid) -> Option<&Session> {
        let original = self.get(id)?;
        let mut copy = Session::new(format!("{} (Copy)", original.name));
        copy.messages = original.messages.clone();
        copy.system_prompt = original.system_prompt.clone();
        self.sessions.push(copy);
        self.sessions.last()
    }

    /// Serialize a session to pretty JSON.
    pub fn export(&self, id: Uuid) -> Result<String, SessionError> {
        let session = self.get(id).ok_or(SessionError::NotFound(id))?;
        serde_json::to_string_pretty(session).map_err(|e| SessionError::Import(e.to_string()))
    }

    /// Import a session from JSON, under a fresh id to avoid collisions.
    pub fn import(&mut self, json: &str) -> Result<&Session, SessionError> {
        let mut session: Session =
            serde_json::from_str(json).map_err(|e| SessionError::Import(e.to_string()))?;
        session.id = Uuid::new_v4();
        info!(session = %session.id, name = session.name.as_str(), "imported session");
        self.sessions.push(session);
        Ok(self.sessions.last().expect("just pushed"))
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
