use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("no price list entry for category `{category_code}` and item `{item_name}`")]
    NotFound { category_code: String, item_name: String },
    #[error("invalid calculation request: {0}")]
    InvalidRequest(String),
    #[error("invalid modifier definition `{code}`: {reason}")]
    InvalidModifier { code: String, reason: String },
    #[error("price arithmetic overflowed while computing {0}")]
    Overflow(String),
}

impl PricingError {
    pub fn not_found(category_code: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self::NotFound { category_code: category_code.into(), item_name: item_name.into() }
    }

    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow(operation.into())
    }

    pub fn for_modifier(self, code: &str) -> Self {
        match self {
            Self::InvalidModifier { reason, .. } => {
                Self::InvalidModifier { code: code.to_owned(), reason }
            }
            Self::Overflow(operation) => Self::Overflow(format!("{operation} (modifier `{code}`)")),
            other => other,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "This item cannot be priced in the selected category.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Pricing(error @ PricingError::NotFound { .. }) => Self::NotFound {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Pricing(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
