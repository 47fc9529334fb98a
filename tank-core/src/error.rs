use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum AutopilotError {
    /// An origin-relative operation ran before both origin axes resolved.
    OriginUnknown { operation: &'static str },
    InvalidConfig { field: &'static str, reason: String },
}

impl AutopilotError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::OriginUnknown { .. })
    }
}

impl fmt::Display for AutopilotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OriginUnknown { operation } => write!(
                f,
                "cannot {operation} relative to the origin: origin is not yet known"
            ),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid config field `{field}`: {reason}")
            }
        }
    }
}

impl std::error::Error for AutopilotError {}
