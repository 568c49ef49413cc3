use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    NotFound,
    Validation,
    PermissionDenied,
    Unauthorized,
    /// Lockdown or clipboard control is unavailable on the client.
    Environment,
    SystemError,
}

impl ErrorType {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorType::NotFound => "NotFound",
            ErrorType::Validation => "ValidationError",
            ErrorType::PermissionDenied => "PermissionDenied",
            ErrorType::Unauthorized => "Unauthorized",
            ErrorType::Environment => "EnvironmentError",
            ErrorType::SystemError => "SystemError",
        }
    }
}

#[derive(Debug, Clone, ThisError)]
#[error("{} : {}", .error_type.label(), .error)]
pub struct Error {
    pub error_type: ErrorType,
    pub error: String,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(error_type: ErrorType, error: &str) -> Self {
        Self {
            error_type,
            error: error.to_string(),
        }
    }
    pub fn not_found(error: &str) -> Self {
        Self::new(ErrorType::NotFound, error)
    }
    pub fn validation(error: &str) -> Self {
        Self::new(ErrorType::Validation, error)
    }
    pub fn permission_denied(error: &str) -> Self {
        Self::new(ErrorType::PermissionDenied, error)
    }
    pub fn unauthorized(error: &str) -> Self {
        Self::new(ErrorType::Unauthorized, error)
    }
    pub fn environment(error: &str) -> Self {
        Self::new(ErrorType::Environment, error)
    }
    pub fn system_error(error: &str) -> Self {
        Self::new(ErrorType::SystemError, error)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::system_error(e.to_string().as_str())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut err_str = String::new();
        let mut fields: Vec<_> = e.field_errors().into_iter().collect();
        fields.sort_by_key(|(name, _)| *name);
        for (_, value) in fields {
            for item in value {
                if let Some(s) = item.message.as_ref() {
                    if !err_str.is_empty() {
                        err_str.push_str(" , ");
                    }
                    err_str.push_str(s)
                }
            }
        }
        Error::validation(err_str.as_str())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::validation(e.to_string().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_taxonomy_label() {
        let e = Error::permission_denied("seed problems cannot be deleted");
        assert_eq!(
            e.to_string(),
            "PermissionDenied : seed problems cannot be deleted"
        );
        assert_eq!(Error::environment("x").error_type, ErrorType::Environment);
    }
}
