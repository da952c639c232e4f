use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown palette: {0}")]
    UnknownPalette(String),

    #[error("Unknown projection: {0}")]
    UnknownProjection(String),

    #[error("Invalid projection definition for {code}: {reason}")]
    ProjDefinition { code: String, reason: String },

    #[error("Unknown paper size: {0}")]
    UnknownPaperSize(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("Image surface borrow failed: {0}")]
    SurfaceBorrow(#[from] cairo::BorrowError),
}

pub type Result<T> = std::result::Result<T, Error>;
