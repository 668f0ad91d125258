// What you SEE:
// • A white canvas with a prompt bar underneath.
// • Hold Left Mouse to draw. Type what should be added, press Enter, and the
//   generated picture replaces the canvas (your strokes become its input).
// • F2: API key   F4: next pen color   F5: clear   ESC: close dialog / quit.

mod app;
mod compositor;
mod config;
mod coords;
mod credential;
mod draw;
mod error;
mod gamma;
mod gemini;
mod generation;
mod hud;
mod logging;
mod response;
mod stroke;
mod types;
mod ui_state;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use minifb::{InputCallback, Key};
use tracing::{info, warn};

use app::{App, AppOptions, SubmitOutcome};
use config::{Args, Config};
use coords::{MouseEdge, MouseTracker, PointerInput};
use credential::{CredentialBackend, CredentialStore, FileBackend, MemoryBackend};
use draw::Drawer;
use error::Error;
use gemini::GeminiService;
use generation::GenerationClient;
use hud::{canvas_display_rect, HudView, FRAME_HEIGHT, FRAME_WIDTH};
use types::{Surface, OPAQUE_WHITE};
use ui_state::UiState;

/// Collects typed characters between frames.
struct TextSink(Rc<RefCell<String>>);

impl InputCallback for TextSink {
    fn add_char(&mut self, uni_char: u32) {
        if let Some(ch) = char::from_u32(uni_char).filter(|c| !c.is_control()) {
            self.0.borrow_mut().push(ch);
        }
    }
}

fn main() -> Result<(), Error> {
    let config = Config::from_args(Args::parse())?;
    logging::init(config.debug);

    /* --- Credential + generation service --- */
    let backend: Box<dyn CredentialBackend> = match &config.credential_path {
        Some(path) => {
            info!(path = %path.display(), "credential file");
            Box::new(FileBackend::new(path.clone()))
        }
        None => {
            warn!("no config directory found; the API key will not be remembered");
            Box::new(MemoryBackend::default())
        }
    };
    info!(endpoint = %config.service.endpoint, model = %config.service.model, "generation service");
    let client = GenerationClient::new(Arc::new(GeminiService::new(&config.service)?));
    let options = AppOptions {
        pen_color: config.pen_color,
        seed_credential: config.api_key.clone(),
        save_dir: config.save_dir.clone(),
    };
    let mut app = App::new(CredentialStore::new(backend), client, options)?;

    /* --- Window + reusable frame ---
       Visual: canvas on top, prompt bar below. */
    let mut drawer = Drawer::new("Co-Drawing", FRAME_WIDTH, FRAME_HEIGHT)?;
    let typed = Rc::new(RefCell::new(String::new()));
    drawer.set_text_sink(Box::new(TextSink(typed.clone())));
    let mut frame = Surface::filled(FRAME_WIDTH, FRAME_HEIGHT, OPAQUE_WHITE);

    let mut prompt = String::new();
    let mut key_input = String::new();
    let mut mouse = MouseTracker::default();
    let started = Instant::now();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() {
        /* 1) Text entry goes to the modal field or the prompt. */
        let chars = std::mem::take(&mut *typed.borrow_mut());
        let field = match (app.state(), app.notice()) {
            (_, Some(_)) => None,
            (UiState::AwaitingCredential, _) => Some(&mut key_input),
            (UiState::Submitting, _) => None,
            _ => Some(&mut prompt),
        };
        if let Some(field) = field {
            field.push_str(&chars);
            if drawer.key_pressed(Key::Backspace, true) {
                field.pop();
            }
        }

        /* 2) Commands */
        if drawer.key_pressed(Key::Enter, false) || drawer.key_pressed(Key::NumPadEnter, false) {
            if app.notice().is_some() {
                app.dismiss_notice();
            } else if app.state() == UiState::AwaitingCredential {
                if app.save_credential(&key_input).is_ok() {
                    key_input.clear();
                }
            } else if app.submit(&prompt) == SubmitOutcome::MissingCredential {
                key_input.clear();
            }
        }
        if drawer.key_pressed(Key::Escape, false) {
            if app.notice().is_some() {
                app.dismiss_notice();
            } else if app.state() == UiState::AwaitingCredential && app.has_credential() {
                app.dismiss_settings();
                key_input.clear();
            } else {
                break;
            }
        }
        if drawer.key_pressed(Key::F2, false) && app.notice().is_none() {
            key_input.clear();
            app.open_settings();
        }
        if drawer.key_pressed(Key::F4, false) {
            app.cycle_pen_color();
        }
        if drawer.key_pressed(Key::F5, false) && app.notice().is_none() {
            app.clear();
        }

        /* 3) Mouse. A stroke starts only on a fresh press inside the canvas;
           leaving the canvas ends it like a release. */
        let rect = canvas_display_rect(drawer.window_size());
        let pos = drawer
            .mouse_pos()
            .filter(|&(x, y)| rect.contains(x, y))
            .map(|(x, y)| (x - rect.left, y - rect.top));
        let drawing = app.state() == UiState::Drawing;
        match mouse.update(drawer.left_mouse_down(), pos, drawing) {
            Some(MouseEdge::Press(x, y)) => {
                app.pointer_down(&PointerInput::Mouse { offset_x: x, offset_y: y }, &rect);
            }
            Some(MouseEdge::Move(x, y)) => {
                app.pointer_move(&PointerInput::Mouse { offset_x: x, offset_y: y }, &rect);
            }
            Some(MouseEdge::Release) => app.pointer_up(),
            None => {}
        }

        /* 4) Pick up a finished generation, if any. */
        app.poll_generation();

        /* 5) Compose and present. */
        let view = HudView {
            state: app.state(),
            prompt: &prompt,
            credential_input: &key_input,
            credential_error: app.credential_error(),
            notice: app.notice(),
            status: app.status(),
            pen_color: app.pen_color(),
            blink_on: started.elapsed().as_millis() / 500 % 2 == 0,
        };
        hud::render(&mut frame, app.compositor().surface(), &view);
        drawer.present(&frame)?;
    }

    info!("bye");
    Ok(())
}
