//! Name directory
//!
//! Maps display names to sessions for uniqueness checks and whisper
//! targeting. Kept in lockstep with room membership by the server.

use std::collections::HashMap;

use crate::error::AppError;
use crate::types::SessionId;

#[derive(Debug, Default)]
pub struct Directory {
    names: HashMap<String, SessionId>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `name` could be registered by `session_id`
    pub fn check(&self, name: &str, session_id: SessionId) -> Result<(), AppError> {
        match self.names.get(name) {
            Some(holder) if *holder != session_id => Err(AppError::DuplicateName(name.to_string())),
            _ => Ok(()),
        }
    }

    /// Map `name` to `session_id`
    ///
    /// Fails with `DuplicateName` if another session holds the name.
    pub fn register(&mut self, name: &str, session_id: SessionId) -> Result<(), AppError> {
        self.check(name, session_id)?;
        self.names.insert(name.to_string(), session_id);
        Ok(())
    }

    /// Remove `name` if it is held by `session_id`
    ///
    /// Returns true if a mapping was removed.
    pub fn unregister(&mut self, name: &str, session_id: SessionId) -> bool {
        if self.names.get(name) != Some(&session_id) {
            return false;
        }
        self.names.remove(name);
        true
    }

    /// Session currently holding `name`
    pub fn lookup(&self, name: &str) -> Result<SessionId, AppError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| AppError::TargetNotFound(name.to_string()))
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut directory = Directory::new();
        let alice = SessionId::new();

        directory.register("Alice", alice).unwrap();
        assert_eq!(directory.lookup("Alice").unwrap(), alice);
        assert!(matches!(
            directory.lookup("Bob"),
            Err(AppError::TargetNotFound(name)) if name == "Bob"
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut directory = Directory::new();
        let first = SessionId::new();
        let second = SessionId::new();

        directory.register("Alice", first).unwrap();
        assert!(matches!(
            directory.register("Alice", second),
            Err(AppError::DuplicateName(_))
        ));

        // The original holder is untouched
        assert_eq!(directory.lookup("Alice").unwrap(), first);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_reregister_same_session() {
        let mut directory = Directory::new();
        let alice = SessionId::new();

        directory.register("Alice", alice).unwrap();
        assert!(directory.register("Alice", alice).is_ok());
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_unregister_frees_name() {
        let mut directory = Directory::new();
        let first = SessionId::new();
        let second = SessionId::new();

        directory.register("Alice", first).unwrap();
        assert!(directory.unregister("Alice", first));
        assert!(!directory.unregister("Alice", first));

        directory.register("Alice", second).unwrap();
        assert_eq!(directory.lookup("Alice").unwrap(), second);
    }

    #[test]
    fn test_unregister_ignores_other_holder() {
        let mut directory = Directory::new();
        let holder = SessionId::new();
        directory.register("Alice", holder).unwrap();

        assert!(!directory.unregister("Alice", SessionId::new()));
        assert_eq!(directory.lookup("Alice").unwrap(), holder);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut directory = Directory::new();
        directory.register("alice", SessionId::new()).unwrap();
        assert!(directory.register("Alice", SessionId::new()).is_ok());
    }
}
