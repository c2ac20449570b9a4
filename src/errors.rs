use std::fmt;

/// Errors surfaced by subscription lookups.
///
/// The service's "no subscriptions found" fault is deliberately absent here:
/// it is a normal outcome and is reported as `LookupResult::NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Invalid caller input (empty email, zip code or customer number).
    BadRequest(String),
    /// The service answered with a SOAP fault other than the not-found sentinel.
    RemoteFault {
        /// Leading segment of the fault message, up to the first colon.
        code: String,
        /// Full fault message as sent by the service.
        message: String,
    },
    /// Transport failure or a non-success HTTP status without a readable fault.
    ExternalApiError(String),
    /// The service answered with a body that is neither a fault nor a result.
    InvalidResponse(String),
    /// Client construction or envelope writing failed.
    InternalError(String),
}

impl fmt::Display for LookupError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            LookupError::RemoteFault { code, message } => {
                write!(f, "Remote fault {}: {}", code, message)
            }
            LookupError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            LookupError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            LookupError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {}

impl From<reqwest::Error> for LookupError {
    /// Converts a `reqwest::Error` into a `LookupError`.
    fn from(err: reqwest::Error) -> Self {
        LookupError::ExternalApiError(err.to_string())
    }
}

impl From<quick_xml::Error> for LookupError {
    /// Converts a `quick_xml::Error` raised while reading a response body.
    fn from(err: quick_xml::Error) -> Self {
        LookupError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_fault_display_keeps_code_and_message() {
        let err = LookupError::RemoteFault {
            code: "WEB-INVALID-LOGIN".to_string(),
            message: "WEB-INVALID-LOGIN: wrong password".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote fault WEB-INVALID-LOGIN: WEB-INVALID-LOGIN: wrong password"
        );
    }

    #[test]
    fn test_bad_request_display() {
        let err = LookupError::BadRequest("email must not be empty".to_string());
        assert_eq!(err.to_string(), "Bad request: email must not be empty");
    }
}
