// Glue between input, the canvas, the credential and the generation worker.
// Every user action enters here and goes through `ui_state::transition`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::compositor::{decode_background, CanvasCompositor};
use crate::coords::{CoordinateMapper, PointerInput};
use crate::credential::CredentialStore;
use crate::error::Error;
use crate::generation::{GenerationClient, GenerationRequest};
use crate::response::GeneratedImage;
use crate::stroke::StrokeRenderer;
use crate::types::{Color, DisplayRect, LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::ui_state::{initial_state, transition, Effect, UiEvent, UiState};

/// Pen colors offered by the cycle key, in order.
pub const PALETTE: [Color; 6] = [
    Color::BLACK,
    Color::rgb(0xE5, 0x39, 0x35),
    Color::rgb(0x1E, 0x88, 0xE5),
    Color::rgb(0x43, 0xA0, 0x47),
    Color::rgb(0xFB, 0x8C, 0x00),
    Color::rgb(0x8E, 0x24, 0xAA),
];

/// Startup knobs that do not belong to a single component.
pub struct AppOptions {
    pub pen_color: Color,
    pub seed_credential: Option<String>,
    pub save_dir: Option<PathBuf>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self { pen_color: Color::BLACK, seed_credential: None, save_dir: None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Dispatched,
    AlreadySubmitting,
    MissingCredential,
    EmptyPrompt,
    Ignored,
    Failed,
}

pub struct App {
    compositor: CanvasCompositor,
    mapper: CoordinateMapper,
    pen: StrokeRenderer,
    pen_color: Color,
    credentials: CredentialStore,
    client: GenerationClient,
    state: UiState,
    notice: Option<String>,
    status: Option<String>,
    save_dir: Option<PathBuf>,
}

impl App {
    pub fn new(
        mut credentials: CredentialStore,
        client: GenerationClient,
        options: AppOptions,
    ) -> Result<Self, Error> {
        let mut compositor = CanvasCompositor::new(LOGICAL_WIDTH, LOGICAL_HEIGHT);
        compositor.initialize();

        // An unreadable slot counts as empty; the next save overwrites it.
        if let Err(err) = credentials.load() {
            warn!(error = %err, "ignoring stored credential");
        }
        if credentials.get().is_none() {
            if let Some(key) = options.seed_credential.as_deref() {
                credentials.seed(key);
            }
        }
        let state = initial_state(credentials.get().is_some());
        info!(?state, "canvas ready");

        Ok(Self {
            compositor,
            mapper: CoordinateMapper::new(LOGICAL_WIDTH, LOGICAL_HEIGHT),
            pen: StrokeRenderer::new(),
            pen_color: options.pen_color,
            credentials,
            client,
            state,
            notice: None,
            status: None,
            save_dir: options.save_dir,
        })
    }

    fn apply(&mut self, event: UiEvent) -> Effect {
        let (next, effect) = transition(self.state, event);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, ?event, "ui transition");
        }
        self.state = next;
        effect
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn compositor(&self) -> &CanvasCompositor {
        &self.compositor
    }

    pub fn pen_color(&self) -> Color {
        self.pen_color
    }

    /// Takes effect on the next segment, even mid-stroke.
    #[cfg(test)]
    pub fn set_pen_color(&mut self, color: Color) {
        self.pen_color = color;
    }

    /// Next palette entry after the current pen color (first entry for a custom color).
    pub fn cycle_pen_color(&mut self) -> Color {
        let next = match PALETTE.iter().position(|&c| c == self.pen_color) {
            Some(i) => PALETTE[(i + 1) % PALETTE.len()],
            None => PALETTE[0],
        };
        self.pen_color = next;
        debug!(color = %next.to_hex(), "pen color");
        next
    }

    /// Blocking notice after a failed generation, until dismissed.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// One-line status (service message, hints).
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn credential_error(&self) -> Option<&str> {
        self.credentials.error()
    }

    pub fn has_credential(&self) -> bool {
        self.credentials.get().is_some()
    }

    // ----------------------------- pointer input -----------------------------

    /// Returns true when the platform's default gesture handling must be suppressed.
    pub fn pointer_down(&mut self, input: &PointerInput, rect: &DisplayRect) -> bool {
        if self.notice.is_some() {
            return false;
        }
        if self.apply(UiEvent::PointerDown) == Effect::BeginStroke {
            let point = self.mapper.map(input, rect);
            self.pen.pointer_down(point, input.is_touch());
        }
        self.pen.suppresses_default()
    }

    pub fn pointer_move(&mut self, input: &PointerInput, rect: &DisplayRect) -> bool {
        if self.state != UiState::Drawing {
            return false;
        }
        let point = self.mapper.map(input, rect);
        self.pen.pointer_move(self.compositor.surface_mut(), point, self.pen_color);
        self.pen.suppresses_default()
    }

    /// Release or leave. Harmless when no stroke is active.
    pub fn pointer_up(&mut self) {
        if self.apply(UiEvent::PointerUp) == Effect::EndStroke {
            let points = self.pen.pointer_up();
            debug!(points, "stroke finished");
        }
    }

    // ------------------------------- commands --------------------------------

    /// Blank white canvas, background discarded. Not offered under the modal.
    pub fn clear(&mut self) {
        if self.state == UiState::AwaitingCredential {
            return;
        }
        if self.state == UiState::Drawing {
            self.pointer_up();
        }
        self.compositor.clear();
        self.status = None;
        info!("canvas cleared");
    }

    /// Not while a failure notice is waiting to be acknowledged.
    pub fn open_settings(&mut self) {
        if self.notice.is_some() {
            return;
        }
        if self.apply(UiEvent::OpenSettings) == Effect::PromptCredential {
            self.credentials.clear_error();
        }
    }

    pub fn dismiss_settings(&mut self) {
        let has_credential = self.has_credential();
        self.apply(UiEvent::DismissSettings { has_credential });
    }

    /// Validate + persist. On error the modal stays open with an inline message.
    pub fn save_credential(&mut self, candidate: &str) -> Result<(), Error> {
        if self.state != UiState::AwaitingCredential {
            return Ok(());
        }
        self.credentials.save(candidate)?;
        self.apply(UiEvent::CredentialSaved);
        Ok(())
    }

    pub fn submit(&mut self, prompt: &str) -> SubmitOutcome {
        match self.state {
            UiState::Submitting => return SubmitOutcome::AlreadySubmitting,
            UiState::Idle => {}
            _ => return SubmitOutcome::Ignored,
        }
        if prompt.trim().is_empty() {
            self.status = Some("Type what should be added first.".into());
            return SubmitOutcome::EmptyPrompt;
        }

        let has_credential = self.has_credential();
        match self.apply(UiEvent::Submit { has_credential }) {
            Effect::Dispatch => {}
            Effect::PromptCredential => {
                info!("no API key yet, asking for one");
                return SubmitOutcome::MissingCredential;
            }
            _ => return SubmitOutcome::Ignored,
        }

        match self.start_generation(prompt) {
            Ok(()) => {
                self.status = None;
                SubmitOutcome::Dispatched
            }
            Err(err) => {
                warn!(error = %err, "could not start generation");
                self.fail(err);
                SubmitOutcome::Failed
            }
        }
    }

    fn start_generation(&mut self, prompt: &str) -> Result<(), Error> {
        let credential = self.credentials.get().ok_or(Error::MissingCredential)?.to_string();
        let png = self.compositor.flatten()?;
        let request = GenerationRequest::new(prompt, png);
        self.client.dispatch(request, credential)
    }

    /// Call once per frame. Applies a finished request and returns to Idle.
    /// Returns true when a request resolved this call.
    pub fn poll_generation(&mut self) -> bool {
        let Some(result) = self.client.poll() else {
            return false;
        };
        match result.and_then(|image| self.apply_generated(image)) {
            Ok(()) => {
                self.apply(UiEvent::GenerationResolved);
            }
            Err(err) => {
                warn!(error = %err, "generation failed");
                self.fail(err);
            }
        }
        true
    }

    fn apply_generated(&mut self, image: GeneratedImage) -> Result<(), Error> {
        // Decode before touching the canvas so a bad image changes nothing.
        let bitmap = decode_background(&image.bytes)?;
        if let Some(dir) = self.save_dir.as_deref() {
            match archive_image(dir, &image) {
                Ok(path) => info!(path = %path.display(), "saved generated image"),
                Err(err) => warn!(error = %err, "could not save generated image"),
            }
        }
        if let Some(message) = image.message.as_deref() {
            info!(reply = message, "service message");
        }
        self.compositor.set_background(bitmap);
        self.status = image.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());
        Ok(())
    }

    fn fail(&mut self, err: Error) {
        self.apply(UiEvent::GenerationResolved);
        self.notice = Some(err.user_notice());
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Write the raw generated bytes into `dir` under a timestamped name.
pub fn archive_image(dir: &Path, image: &GeneratedImage) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Storage(format!("create {}: {e}", dir.display())))?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let path = dir.join(format!("generated-{stamp}.{}", extension_for(&image.mime_type)));
    std::fs::write(&path, &image.bytes)
        .map_err(|e| Error::Storage(format!("write {}: {e}", path.display())))?;
    Ok(path)
}
