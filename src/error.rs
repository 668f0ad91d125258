// One small error type for the whole program (no anyhow/thiserror).
// Every variant states *where* things went wrong.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    WindowInit(String),   // Creating the window failed
    WindowUpdate(String), // Updating the window buffer failed
    Config(String),       // Command line / environment values were unusable
    Storage(String),      // Reading or writing the credential slot failed
    Validation(String),   // Credential input rejected before it was saved
    MissingCredential,    // Submit attempted with no credential on hand
    Busy,                 // A generation request is already in flight
    Service(String),      // Network failure or non-success answer from the service
    Parse { message: Option<String> }, // Service answered without an image part
    Decode(String),       // Image bytes from the service could not be decoded
    Encode(String),       // Flattening the canvas to PNG failed
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
            Error::Config(s) => write!(f, "Configuration error: {s}"),
            Error::Storage(s) => write!(f, "Credential storage error: {s}"),
            Error::Validation(s) => write!(f, "{s}"),
            Error::MissingCredential => write!(f, "No API key has been saved yet"),
            Error::Busy => write!(f, "A drawing is already being generated"),
            Error::Service(s) => write!(f, "Generation service error: {s}"),
            Error::Parse { message: Some(m) } => {
                write!(f, "Response contained no image (service said: {m})")
            }
            Error::Parse { message: None } => write!(f, "Response contained no image"),
            Error::Decode(s) => write!(f, "Image decode error: {s}"),
            Error::Encode(s) => write!(f, "Image encode error: {s}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Text for the blocking notice shown after a failed submission.
    pub fn user_notice(&self) -> String {
        match self {
            Error::Service(s) => format!("Failed to generate image: {s}"),
            Error::Parse { .. } => "Failed to generate image. Please try again.".to_string(),
            Error::Decode(_) => "The generated image could not be read. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}
