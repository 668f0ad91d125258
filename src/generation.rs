// Request building and the single background worker that talks to the service.
// Visual: the window keeps drawing while a picture is being generated.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::response::{self, GeneratedImage, ResponsePart};

/// Appended to every prompt so the service keeps the doodle look.
pub const STYLE_SUFFIX: &str = "Keep the same minimal line doodle style.";

/// Prompt text exactly as it is sent.
pub fn compose_prompt(prompt: &str) -> String {
    format!("{}. {STYLE_SUFFIX}", prompt.trim())
}

/// Built fresh for every submission and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt_text: String,
    image_png: Vec<u8>,
}

impl GenerationRequest {
    pub fn new(prompt: &str, image_png: Vec<u8>) -> Self {
        Self { prompt_text: compose_prompt(prompt), image_png }
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn image_png(&self) -> &[u8] {
        &self.image_png
    }
}

/// The image generator, seen only through its request/response boundary.
pub trait GenerationService: Send + Sync {
    fn generate(&self, request: &GenerationRequest, credential: &str)
        -> Result<Vec<ResponsePart>, Error>;
}

/// Runs one request at a time on a worker thread; the caller polls.
pub struct GenerationClient {
    service: Arc<dyn GenerationService>,
    pending: Option<Receiver<Result<Vec<ResponsePart>, Error>>>,
}

impl GenerationClient {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service, pending: None }
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Start the request. A second dispatch while one runs is refused, not queued.
    pub fn dispatch(&mut self, request: GenerationRequest, credential: String) -> Result<(), Error> {
        if self.in_flight() {
            return Err(Error::Busy);
        }
        let (tx, rx) = mpsc::channel();
        let service = Arc::clone(&self.service);
        info!(
            prompt = request.prompt_text(),
            image_bytes = request.image_png().len(),
            "dispatching generation request"
        );
        thread::Builder::new()
            .name("generation".into())
            .spawn(move || {
                let result = service.generate(&request, &credential);
                // The receiver is gone only if the client was dropped.
                let _ = tx.send(result);
            })
            .map_err(|e| Error::Service(format!("spawn generation worker: {e}")))?;
        self.pending = Some(rx);
        Ok(())
    }

    /// Non-blocking check for the finished request. `None` while still running
    /// or when nothing was dispatched.
    pub fn poll(&mut self) -> Option<Result<GeneratedImage, Error>> {
        let rx = self.pending.as_ref()?;
        let outcome = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                warn!("generation worker exited without a result");
                Err(Error::Service("generation worker stopped unexpectedly".into()))
            }
        };
        self.pending = None;
        Some(outcome.and_then(|parts| {
            debug!(parts = parts.len(), "generation response received");
            response::parse(&parts)
        }))
    }
}
