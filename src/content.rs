use std::error::Error;
use std::fmt;

/// A project's text content as handed to the session engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContent {
    pub id: i64,
    pub title: String,
    pub content: String,
}

/// Failure to produce typable content for a project.
#[derive(Debug)]
pub enum ContentError {
    /// No project exists with the requested id.
    NotFound(i64),
    /// The project exists but its content yields no words.
    Empty,
    /// The backing store failed.
    Storage(String),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::NotFound(id) => write!(f, "no project with id {}", id),
            ContentError::Empty => write!(f, "project has no typable content"),
            ContentError::Storage(msg) => write!(f, "content store error: {}", msg),
        }
    }
}

impl Error for ContentError {}

/// Source of project text, consumed by the session engine at load time.
pub trait ContentRepository {
    fn fetch_content(&self, project_id: i64) -> Result<ProjectContent, ContentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_failure() {
        assert_eq!(
            ContentError::NotFound(7).to_string(),
            "no project with id 7"
        );
        assert_eq!(
            ContentError::Empty.to_string(),
            "project has no typable content"
        );
        assert!(ContentError::Storage("disk full".into())
            .to_string()
            .contains("disk full"));
    }
}
