//! Goal value object

use serde::{Deserialize, Serialize};

/// The stated goal a conversation must resolve (Value Object)
///
/// Immutable after conversation creation; every participant turn is framed
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    content: String,
}

impl Goal {
    /// Create a new goal
    ///
    /// # Panics
    /// Panics if the content is empty or only whitespace
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        assert!(!content.trim().is_empty(), "Goal cannot be empty");
        Self { content }
    }

    /// Try to create a new goal, returning None if invalid
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self { content })
        }
    }

    /// Get the goal content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl From<&str> for Goal {
    fn from(s: &str) -> Self {
        Goal::new(s)
    }
}

impl From<String> for Goal {
    fn from(s: String) -> Self {
        Goal::new(s)
    }
}
