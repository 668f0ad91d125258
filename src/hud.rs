// Frame layout: the canvas on top, the prompt bar underneath, and the
// overlays (credential modal, failure notice) drawn over both.
//
//   +---------------------------- 960 ----------------------------+
//   |                         canvas 960x540                       |
//   +--------------------------------------------------------------+
//   | [prompt text box ........................] [GENERATE] [pen]  |  48
//   +--------------------------------------------------------------+

use crate::draw::{chars_that_fit, dim, draw_text_5x7, fill_rect, stroke_rect, text_width, GLYPH_H};
use crate::types::{Color, DisplayRect, Surface, LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::ui_state::UiState;

pub const PROMPT_BAR_HEIGHT: usize = 48;
pub const FRAME_WIDTH: usize = LOGICAL_WIDTH;
pub const FRAME_HEIGHT: usize = LOGICAL_HEIGHT + PROMPT_BAR_HEIGHT;

const BAR_BG: u32 = 0xFFF1_F1F1;
const BOX_BG: u32 = 0xFFFF_FFFF;
const BORDER: u32 = 0xFF9E_9E9E;
const TEXT: u32 = 0xFF21_2121;
const MUTED: u32 = 0xFF75_7575;
const ACCENT: u32 = 0xFF1E_88E5;
const BUSY: u32 = 0xFF90_A4AE;
const ERROR: u32 = 0xFFD3_2F2F;
const PANEL_BG: u32 = 0xFFFA_FAFA;

const PAD: i32 = 8;
const BUTTON_W: i32 = 132;
const SWATCH: i32 = 28;

/// Everything the HUD needs from the app for one frame.
pub struct HudView<'a> {
    pub state: UiState,
    pub prompt: &'a str,
    pub credential_input: &'a str,
    pub credential_error: Option<&'a str>,
    pub notice: Option<&'a str>,
    pub status: Option<&'a str>,
    pub pen_color: Color,
    pub blink_on: bool,
}

/// Where the canvas sits on screen for a window of `window` pixels. The frame
/// is stretched to the window, so the canvas keeps its share of the height.
pub fn canvas_display_rect(window: (usize, usize)) -> DisplayRect {
    let (w, h) = window;
    DisplayRect {
        left: 0.0,
        top: 0.0,
        width: w as f32,
        height: h as f32 * LOGICAL_HEIGHT as f32 / FRAME_HEIGHT as f32,
    }
}

/// Same length as the key, nothing else of it.
pub fn masked(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

/// Keep the tail of `text` that fits in `max` characters (the caret end).
fn tail(text: &str, max: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max)).collect()
}

/// Greedy word wrap at `width` characters. Long words are hard-split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if line.is_empty() { word.len() } else { line.chars().count() + 1 + word.len() };
        if needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

pub fn render(frame: &mut Surface, canvas: &Surface, view: &HudView) {
    blit_canvas(frame, canvas);
    draw_prompt_bar(frame, view);

    if view.state == UiState::AwaitingCredential {
        dim(frame);
        draw_credential_modal(frame, view);
    } else if let Some(notice) = view.notice {
        dim(frame);
        draw_notice(frame, notice);
    }
}

fn blit_canvas(frame: &mut Surface, canvas: &Surface) {
    let rows = canvas.height.min(frame.height);
    let cols = canvas.width.min(frame.width);
    for y in 0..rows {
        let src = &canvas.pixels[y * canvas.width..y * canvas.width + cols];
        frame.pixels[y * frame.width..y * frame.width + cols].copy_from_slice(src);
    }
}

fn draw_prompt_bar(frame: &mut Surface, view: &HudView) {
    let top = LOGICAL_HEIGHT as i32;
    let width = frame.width as i32;
    fill_rect(frame, 0, top, width, PROMPT_BAR_HEIGHT as i32, BAR_BG);
    fill_rect(frame, 0, top, width, 1, BORDER);

    let submitting = view.state == UiState::Submitting;

    // Text box
    let box_x = PAD;
    let box_y = top + PAD;
    let box_w = width - BUTTON_W - SWATCH - 4 * PAD;
    let box_h = PROMPT_BAR_HEIGHT as i32 - 2 * PAD;
    fill_rect(frame, box_x, box_y, box_w, box_h, BOX_BG);
    stroke_rect(frame, box_x, box_y, box_w, box_h, if submitting { BORDER } else { ACCENT });

    let text_y = box_y + (box_h - 2 * GLYPH_H) / 2;
    let inner = box_w - 2 * PAD;
    if view.prompt.is_empty() {
        let hint = view.status.unwrap_or("Describe what to add, then press Enter");
        let hint = tail(hint, chars_that_fit(inner, 2));
        draw_text_5x7(frame, box_x + PAD, text_y, &hint, MUTED, 2);
    } else {
        let caret = if view.blink_on && !submitting { "_" } else { "" };
        let shown = tail(view.prompt, chars_that_fit(inner, 2).saturating_sub(1));
        draw_text_5x7(frame, box_x + PAD, text_y, &format!("{shown}{caret}"), TEXT, 2);
    }

    // Button
    let btn_x = box_x + box_w + PAD;
    let (label, fill) = if submitting { ("WORKING...", BUSY) } else { ("GENERATE", ACCENT) };
    fill_rect(frame, btn_x, box_y, BUTTON_W, box_h, fill);
    let label_x = btn_x + (BUTTON_W - text_width(label, 2)) / 2;
    draw_text_5x7(frame, label_x, text_y, label, BOX_BG, 2);

    // Pen swatch
    let sw_x = btn_x + BUTTON_W + PAD;
    let sw_y = box_y + (box_h - SWATCH) / 2;
    fill_rect(frame, sw_x, sw_y, SWATCH, SWATCH, view.pen_color.to_argb());
    stroke_rect(frame, sw_x, sw_y, SWATCH, SWATCH, BORDER);
}

fn panel(frame: &mut Surface, w: i32, h: i32) -> (i32, i32) {
    let x = (frame.width as i32 - w) / 2;
    let y = (LOGICAL_HEIGHT as i32 - h) / 2;
    fill_rect(frame, x, y, w, h, PANEL_BG);
    stroke_rect(frame, x, y, w, h, BORDER);
    (x, y)
}

fn draw_credential_modal(frame: &mut Surface, view: &HudView) {
    let (w, h) = (560, 200);
    let (x, y) = panel(frame, w, h);
    let left = x + 2 * PAD;

    draw_text_5x7(frame, left, y + 2 * PAD, "Gemini API key", TEXT, 3);
    draw_text_5x7(frame, left, y + 52, "Stored on this computer only.", MUTED, 2);

    let field_w = w - 4 * PAD;
    fill_rect(frame, left, y + 80, field_w, 36, BOX_BG);
    stroke_rect(frame, left, y + 80, field_w, 36, ACCENT);
    let caret = if view.blink_on { "_" } else { "" };
    let shown = tail(&masked(view.credential_input), chars_that_fit(field_w - 2 * PAD, 2).saturating_sub(1));
    draw_text_5x7(frame, left + PAD, y + 91, &format!("{shown}{caret}"), TEXT, 2);

    if let Some(err) = view.credential_error {
        draw_text_5x7(frame, left, y + 128, err, ERROR, 2);
    }
    draw_text_5x7(frame, left, y + h - 3 * PAD, "Enter: save    Esc: close", MUTED, 2);
}

fn draw_notice(frame: &mut Surface, notice: &str) {
    let w = 640;
    let per_line = chars_that_fit(w - 4 * PAD, 2);
    let lines = wrap(notice, per_line);
    let line_h = 2 * GLYPH_H + 6;
    let h = 2 * PAD + 30 + lines.len() as i32 * line_h + 40;
    let (x, y) = panel(frame, w, h);
    let left = x + 2 * PAD;

    draw_text_5x7(frame, left, y + 2 * PAD, "Something went wrong", ERROR, 3);
    for (i, line) in lines.iter().enumerate() {
        draw_text_5x7(frame, left, y + 2 * PAD + 30 + i as i32 * line_h, line, TEXT, 2);
    }
    draw_text_5x7(frame, left, y + h - 3 * PAD, "Enter: OK", MUTED, 2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OPAQUE_WHITE;

    fn view(state: UiState) -> HudView<'static> {
        HudView {
            state,
            prompt: "",
            credential_input: "",
            credential_error: None,
            notice: None,
            status: None,
            pen_color: Color::BLACK,
            blink_on: false,
        }
    }

    #[test]
    fn canvas_keeps_its_share_of_a_stretched_window() {
        let rect = canvas_display_rect((FRAME_WIDTH, FRAME_HEIGHT));
        assert_eq!(rect.width, 960.0);
        assert_eq!(rect.height, 540.0);

        let rect = canvas_display_rect((FRAME_WIDTH * 2, FRAME_HEIGHT * 2));
        assert_eq!(rect.width, 1920.0);
        assert!((rect.height - 1080.0).abs() < 1e-3);
    }

    #[test]
    fn canvas_pixels_land_unchanged_above_the_bar() {
        let mut canvas = Surface::filled(LOGICAL_WIDTH, LOGICAL_HEIGHT, OPAQUE_WHITE);
        canvas.set(10, 20, 0xFF12_3456);
        let mut frame = Surface::new(FRAME_WIDTH, FRAME_HEIGHT);
        render(&mut frame, &canvas, &view(UiState::Idle));
        assert_eq!(frame.get(10, 20), Some(0xFF12_3456));
        assert_eq!(frame.get(LOGICAL_WIDTH - 1, LOGICAL_HEIGHT - 1), Some(OPAQUE_WHITE));
        assert_eq!(frame.get(FRAME_WIDTH - 1, FRAME_HEIGHT - 1), Some(BAR_BG));
    }

    #[test]
    fn modal_dims_the_canvas() {
        let canvas = Surface::filled(LOGICAL_WIDTH, LOGICAL_HEIGHT, OPAQUE_WHITE);
        let mut frame = Surface::new(FRAME_WIDTH, FRAME_HEIGHT);
        render(&mut frame, &canvas, &view(UiState::AwaitingCredential));
        assert_eq!(frame.get(0, 0), Some(0xFF7F_7F7F));
    }

    #[test]
    fn key_is_masked() {
        assert_eq!(masked("abc123"), "******");
        assert_eq!(masked(""), "");
    }

    #[test]
    fn wrap_breaks_on_words_and_splits_long_ones() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn tail_keeps_the_end() {
        assert_eq!(tail("hello world", 5), "world");
        assert_eq!(tail("hi", 5), "hi");
    }
}
