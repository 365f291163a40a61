//! Membership request types.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::UserId;

/// Who initiated a pending membership negotiation.
///
/// `Request` is user-initiated ("I want to join"); `Invitation` is
/// manager-initiated ("you are invited"). The tag determines the semantics
/// of every subsequent transition on the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Workflow {
    Request,
    Invitation,
}

/// Error type for parsing Workflow from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWorkflowError(pub String);

impl std::fmt::Display for ParseWorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid workflow: {}", self.0)
    }
}

impl std::error::Error for ParseWorkflowError {}

impl FromStr for Workflow {
    type Err = ParseWorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request" => Ok(Workflow::Request),
            "invitation" => Ok(Workflow::Invitation),
            _ => Err(ParseWorkflowError(s.to_string())),
        }
    }
}

impl Workflow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Workflow::Request => "request",
            Workflow::Invitation => "invitation",
        }
    }
}

/// Pending membership request record.
///
/// At most one pending request exists per user and collaboration;
/// `created_at` doubles as the request's age for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipRequest {
    pub user: UserId,
    pub workflow: Workflow,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_parse() {
        assert_eq!("request".parse::<Workflow>().unwrap(), Workflow::Request);
        assert_eq!(
            "invitation".parse::<Workflow>().unwrap(),
            Workflow::Invitation
        );
    }

    #[test]
    fn test_workflow_parse_invalid() {
        assert!("invite".parse::<Workflow>().is_err());
        assert!("Request".parse::<Workflow>().is_err()); // Case sensitive
        assert!("".parse::<Workflow>().is_err());
    }

    #[test]
    fn test_workflow_roundtrip() {
        for workflow in [Workflow::Request, Workflow::Invitation] {
            let parsed: Workflow = workflow.as_str().parse().unwrap();
            assert_eq!(workflow, parsed);
        }
    }

    #[test]
    fn test_parse_workflow_error_display() {
        let err = ParseWorkflowError("unknown".to_string());
        assert!(err.to_string().contains("unknown"));
    }
}
