// Picks the message and the picture out of the service's answer.
// Visual: a text-only answer becomes the "try again" notice.

use crate::error::Error;

/// One fragment of the service's answer, in the order it was received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// What the parser found: at most one message and at most one image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub message: Option<String>,
    pub image_bytes: Option<Vec<u8>>,
    pub image_mime_type: Option<String>,
}

/// A response that is usable: it carries image bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub message: Option<String>,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// First text part wins the message, first inline-data part wins the image.
pub fn parse_parts(parts: &[ResponsePart]) -> GenerationResponse {
    let mut out = GenerationResponse::default();
    for part in parts {
        match part {
            ResponsePart::Text(text) if out.message.is_none() => {
                out.message = Some(text.clone());
            }
            ResponsePart::InlineData { mime_type, data } if out.image_bytes.is_none() => {
                out.image_bytes = Some(data.clone());
                out.image_mime_type = Some(mime_type.clone());
            }
            _ => {}
        }
    }
    out
}

impl GenerationResponse {
    /// Text alone is still a failure.
    pub fn into_image(self) -> Result<GeneratedImage, Error> {
        match self.image_bytes {
            Some(bytes) => Ok(GeneratedImage {
                message: self.message,
                bytes,
                mime_type: self.image_mime_type.unwrap_or_else(|| "image/png".to_string()),
            }),
            None => Err(Error::Parse { message: self.message }),
        }
    }
}

pub fn parse(parts: &[ResponsePart]) -> Result<GeneratedImage, Error> {
    parse_parts(parts).into_image()
}
