use thiserror::Error;

use crate::verify::Finding;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid bootstrap plan: {message}")]
    InvalidPlan { message: String },

    #[error("Authentication against '{namespace}' rejected: {message}")]
    Authentication { namespace: String, message: String },

    #[error("User '{username}' already exists in '{database}'")]
    UserExists { username: String, database: String },

    #[error("Collection '{database}.{collection}' already exists")]
    CollectionExists { database: String, collection: String },

    #[error("{op} failed: {message}")]
    Engine { op: &'static str, message: String },

    #[error("Post-check failed with {} finding(s): {}", .findings.len(), join_findings(.findings))]
    PostCheck { findings: Vec<Finding> },
}

impl BootstrapError {
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan {
            message: message.into(),
        }
    }

    pub fn engine(op: &'static str, message: impl Into<String>) -> Self {
        Self::Engine {
            op,
            message: message.into(),
        }
    }
}

fn join_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_names_the_operation() {
        let err = BootstrapError::engine("createIndex", "boom");
        assert_eq!(err.to_string(), "createIndex failed: boom");
    }

    #[test]
    fn post_check_lists_every_finding() {
        let err = BootstrapError::PostCheck {
            findings: vec![
                Finding::MissingCollection {
                    collection: "runs".to_string(),
                },
                Finding::MissingUser {
                    username: "apiuser".to_string(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("Post-check failed with 2 finding(s)"));
        assert!(text.contains("collection 'runs' is missing"));
        assert!(text.contains("user 'apiuser' is missing"));
    }
}
