use crate::parse::{ParseError, ParseErrorKind};

pub type DiceResult<T> = Result<T, DiceError>;

/// The broad category of a [`DiceError`], for hosts that render errors differently.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Syntax,
    Validation,
    MissingData,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DiceError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("Unable to parse input")]
    Unparseable {
        #[source]
        source: Option<Box<DiceError>>,
    },
    #[error("{0}")]
    Syntax(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    MissingData(String),
}

impl DiceError {
    pub fn syntax(msg: impl ToString) -> Self {
        Self::Syntax(msg.to_string())
    }

    pub fn validation(msg: impl ToString) -> Self {
        Self::Validation(msg.to_string())
    }

    pub fn missing_data(msg: impl ToString) -> Self {
        Self::MissingData(msg.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(e) if e.kind == ParseErrorKind::TooDeep => ErrorKind::Validation,
            Self::Parse(_) | Self::Unparseable { .. } | Self::Syntax(_) => ErrorKind::Syntax,
            Self::Validation(_) => ErrorKind::Validation,
            Self::MissingData(_) => ErrorKind::MissingData,
        }
    }
}
