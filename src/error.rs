//! Error types for ego graph queries.

use thiserror::Error;

use crate::models::BandId;

/// Everything that can abort a load or a query.
#[derive(Debug, Error)]
pub enum EgoError {
    /// Similarity source unreadable, inconsistent or carrying invalid weights.
    #[error("data source error: {0}")]
    DataSource(String),

    /// Center band id is not a node of the similarity graph.
    #[error("band id {0} not found in similarity graph")]
    NodeNotFound(BandId),

    /// A display name resolved to zero or several bands.
    #[error("band name '{name}' {}", describe_matches(.matches, .suggestions))]
    AmbiguousOrMissingName {
        name: String,
        matches: Vec<BandId>,
        suggestions: Vec<String>,
    },

    /// Rejected before any graph work starts.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EgoError>;

// Any SQLite failure while loading means the source is unusable.
impl From<rusqlite::Error> for EgoError {
    fn from(e: rusqlite::Error) -> Self {
        EgoError::DataSource(e.to_string())
    }
}

impl EgoError {
    /// HTTP-style status used by the request adapter.
    pub fn status_code(&self) -> u16 {
        match self {
            EgoError::InvalidParameter(_) | EgoError::AmbiguousOrMissingName { .. } => 400,
            EgoError::NodeNotFound(_) => 404,
            EgoError::DataSource(_)
            | EgoError::Config(_)
            | EgoError::Io(_)
            | EgoError::Serde(_) => 500,
        }
    }
}

fn describe_matches(matches: &[BandId], suggestions: &[String]) -> String {
    if matches.len() > 1 {
        let ids: Vec<String> = matches.iter().map(|id| id.to_string()).collect();
        return format!("is ambiguous (matches band ids {})", ids.join(", "));
    }
    if suggestions.is_empty() {
        "was not found".to_string()
    } else {
        format!("was not found (did you mean: {}?)", suggestions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_name_message_lists_suggestions() {
        let err = EgoError::AmbiguousOrMissingName {
            name: "Metalica".to_string(),
            matches: vec![],
            suggestions: vec!["Metallica".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "band name 'Metalica' was not found (did you mean: Metallica?)"
        );
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_ambiguous_name_message_lists_ids() {
        let err = EgoError::AmbiguousOrMissingName {
            name: "Death".to_string(),
            matches: vec![141, 3540],
            suggestions: vec![],
        };
        assert!(err.to_string().contains("is ambiguous (matches band ids 141, 3540)"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(EgoError::NodeNotFound(7).status_code(), 404);
        assert_eq!(EgoError::InvalidParameter("radius".into()).status_code(), 400);
        assert_eq!(EgoError::DataSource("corrupt".into()).status_code(), 500);
    }

    #[test]
    fn test_rusqlite_error_is_data_source() {
        let err: EgoError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, EgoError::DataSource(_)));
    }
}
