use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP transport failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid measurement '{value}' for '{field}': {reason}")]
    InvalidMeasurement {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Session error: {message}")]
    SessionError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Configuration,
    Input,
    Session,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::HttpError(_) => ErrorCategory::Network,
            AppError::ApiError { .. } => ErrorCategory::Api,
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AppError::InvalidMeasurement { .. } | AppError::ValidationError { .. } => {
                ErrorCategory::Input
            }
            AppError::SessionError { .. } => ErrorCategory::Session,
            AppError::IoError(_) | AppError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Api => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Session => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Message shown to the patient or admin. API failures already carry
    /// their mapped text, everything else falls back to a generic one.
    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::HttpError(e) if e.is_timeout() => {
                "El servidor tardó demasiado en responder.".to_string()
            }
            AppError::HttpError(_) => "No se pudo conectar con el servidor.".to_string(),
            AppError::ApiError { message, .. } => message.clone(),
            AppError::InvalidMeasurement { field, .. } => {
                format!("La medida '{}' no es válida.", field)
            }
            AppError::ValidationError { message } => message.clone(),
            AppError::SessionError { .. } => {
                "Tu sesión no es válida. Inicia sesión nuevamente.".to_string()
            }
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => {
                "La configuración de la aplicación es inválida.".to_string()
            }
            AppError::IoError(_) | AppError::SerializationError(_) => {
                "Error desconocido".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Network => "Revisa tu conexión e intenta nuevamente.".to_string(),
            ErrorCategory::Api => "Envía el formulario otra vez más tarde.".to_string(),
            ErrorCategory::Configuration => {
                "Revisa el archivo de configuración y las variables de entorno.".to_string()
            }
            ErrorCategory::Input => "Completa todos los campos con valores válidos.".to_string(),
            ErrorCategory::Session => "Ejecuta 'login' para obtener una nueva sesión.".to_string(),
            ErrorCategory::System => "Revisa los permisos del directorio de trabajo.".to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_surface_their_mapped_message() {
        let err = AppError::ApiError {
            status: 500,
            message: "No se pudo completar la evaluación.".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Api);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(
            err.user_friendly_message(),
            "No se pudo completar la evaluación."
        );
    }

    #[test]
    fn input_errors_are_low_severity() {
        let err = AppError::InvalidMeasurement {
            field: "left_1".to_string(),
            value: "".to_string(),
            reason: "empty".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.user_friendly_message().contains("left_1"));
    }

    #[test]
    fn config_errors_share_a_category() {
        let missing = AppError::MissingConfigError {
            field: "api.base_url".to_string(),
        };
        let invalid = AppError::InvalidConfigValueError {
            field: "api.timeout_seconds".to_string(),
            value: "0".to_string(),
            reason: "too small".to_string(),
        };
        assert_eq!(missing.category(), invalid.category());
        assert_eq!(missing.severity(), ErrorSeverity::High);
    }
}
