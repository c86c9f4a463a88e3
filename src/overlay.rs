//! Process-wide "automation in progress" overlay.

use crate::errors::AutomationError;
use crate::platforms::{AccessibilityEngine, OverlaySurface};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Status line shown when no open scope supplied its own text.
const DEFAULT_STATUS: &str = "Automating UI";
/// Translucent panel fill and status text colors (BGR).
const PANEL_COLOR: u32 = 0x202020;
const TEXT_COLOR: u32 = 0xFFFFFF;
/// Largest and smallest legible status text sizes, in points.
const MAX_TEXT_SIZE: u32 = 48;
const MIN_TEXT_SIZE: u32 = 12;
/// Fraction of the narrower surface dimension the status line must fit in.
const TEXT_FIT_FRACTION: f64 = 0.95;

struct OverlayState {
    depth: usize,
    messages: Vec<String>,
    surfaces: Vec<Box<dyn OverlaySurface>>,
}

/// Shares one busy indicator across concurrently nested operations.
///
/// Surfaces exist exactly while at least one scope is open. The most
/// recently entered scope that supplied a status message decides the
/// rendered text; when it exits, the next most recent shows again. All
/// bookkeeping sits behind one lock, so scopes may be entered from any
/// thread and may overlap arbitrarily.
pub struct OverlayCoordinator {
    engine: Arc<dyn AccessibilityEngine>,
    state: Mutex<OverlayState>,
}

impl OverlayCoordinator {
    pub fn new(engine: Arc<dyn AccessibilityEngine>) -> Self {
        Self {
            engine,
            state: Mutex::new(OverlayState {
                depth: 0,
                messages: Vec::new(),
                surfaces: Vec::new(),
            }),
        }
    }

    /// Open an overlay scope. The first open scope creates the per-display
    /// surfaces; the returned guard releases the scope when dropped, and
    /// the last guard to drop tears the surfaces down. Surface creation
    /// failures propagate without disturbing the nesting state.
    pub fn enter(&self, status: Option<&str>) -> Result<OverlayScope<'_>, AutomationError> {
        let mut state = self.lock_state();
        if state.depth == 0 {
            state.surfaces = self.engine.create_overlay_surfaces()?;
            state.depth = 1;
            if let Some(text) = status {
                state.messages.push(text.to_string());
            }
            redraw(&mut state);
        } else {
            state.depth += 1;
            if let Some(text) = status {
                // Only an explicit message can change the top of the stack,
                // so entries without one skip the redraw.
                state.messages.push(text.to_string());
                redraw(&mut state);
            }
        }
        debug!(depth = state.depth, "overlay scope entered");
        Ok(OverlayScope {
            coordinator: self,
            status: status.map(str::to_string),
        })
    }

    fn exit(&self, status: Option<String>) {
        let mut state = self.lock_state();
        assert!(state.depth > 0, "overlay scope exited without a matching enter");
        let had_status = status.is_some();
        if let Some(text) = status {
            // Pop exactly one matching entry; sibling scopes may have
            // pushed the same text.
            if let Some(idx) = state.messages.iter().rposition(|m| *m == text) {
                state.messages.remove(idx);
            }
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.surfaces.clear();
            debug!("overlay torn down");
        } else if had_status {
            redraw(&mut state);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, OverlayState> {
        // A panic mid-draw must not wedge every later scope; the counter and
        // stack are kept consistent independent of draw success.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Redraw every surface with the current top-of-stack status text. Draw
/// failures are logged and swallowed; they never unbalance the scope
/// bookkeeping.
fn redraw(state: &mut OverlayState) {
    let text = state
        .messages
        .last()
        .map(String::as_str)
        .unwrap_or(DEFAULT_STATUS);
    for surface in state.surfaces.iter_mut() {
        let size = fitted_text_size(surface.as_ref(), text);
        surface.begin_redraw();
        if let Err(e) = surface.fill(PANEL_COLOR) {
            warn!("overlay fill failed: {e}");
        }
        if let Err(e) = surface.draw_text_centered(text, size, TEXT_COLOR) {
            warn!("overlay text draw failed: {e}");
        }
        surface.end_redraw();
    }
}

/// Shrink from the maximum size until the line fits within 95% of the
/// narrower surface dimension, flooring at the minimal legible size.
fn fitted_text_size(surface: &dyn OverlaySurface, text: &str) -> u32 {
    let (width, height) = surface.size();
    let limit = (f64::from(width.min(height)) * TEXT_FIT_FRACTION) as u32;
    let mut size = MAX_TEXT_SIZE;
    while size > MIN_TEXT_SIZE && surface.text_width(text, size) > limit {
        size -= 2;
    }
    size
}

/// RAII handle for one overlay scope. Dropping it releases the scope no
/// matter how the bracketed work terminated: normal return, error
/// propagation, or abandoning a lazy match sequence partway.
pub struct OverlayScope<'a> {
    coordinator: &'a OverlayCoordinator,
    status: Option<String>,
}

impl Drop for OverlayScope<'_> {
    fn drop(&mut self) {
        self.coordinator.exit(self.status.take());
    }
}
