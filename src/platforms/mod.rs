//! Platform capability interface consumed by the automation core.
//!
//! The core never talks to an OS accessibility API directly; everything it
//! needs from the host platform comes through [`AccessibilityEngine`] and
//! the handle traits below.

use crate::element::UIElement;
use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[cfg(target_os = "windows")]
pub mod windows;

/// Mouse button for click dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Host platform tag, used to select landmark paths and platform quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

/// A top-level window as reported by the platform.
pub trait WindowHandle: Send {
    fn is_hidden(&self) -> bool;

    fn is_minimized(&self) -> bool;

    /// Root accessibility node of the window. Fails with a platform error
    /// when the window went away mid-enumeration; callers skip such windows.
    fn element(&self) -> Result<UIElement, AutomationError>;
}

/// One full-screen overlay surface on a single display.
///
/// Surfaces never intercept input and stay frozen between redraws; a redraw
/// is bracketed by [`begin_redraw`](OverlaySurface::begin_redraw) and
/// [`end_redraw`](OverlaySurface::end_redraw). Dropping a surface destroys it.
pub trait OverlaySurface: Send {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Width in pixels of `text` rendered at `point_size`.
    fn text_width(&self, text: &str, point_size: u32) -> u32;

    fn begin_redraw(&mut self);

    /// Fill the whole surface with a translucent panel of `color` (BGR).
    fn fill(&mut self, color: u32) -> Result<(), AutomationError>;

    /// Draw `text` centered on the surface.
    fn draw_text_centered(
        &mut self,
        text: &str,
        point_size: u32,
        color: u32,
    ) -> Result<(), AutomationError>;

    fn end_redraw(&mut self);
}

/// The common trait every platform provider implements.
pub trait AccessibilityEngine: Send + Sync {
    fn platform(&self) -> Platform;

    /// Enumerate top-level windows.
    fn windows(&self) -> Result<Vec<Box<dyn WindowHandle>>, AutomationError>;

    /// Root element of the currently focused window.
    fn focused_window(&self) -> Result<UIElement, AutomationError>;

    /// Move the pointer to a screen point.
    fn move_mouse(&self, x: f64, y: f64) -> Result<(), AutomationError>;

    /// Click at the current pointer position.
    fn click_mouse(&self, button: MouseButton) -> Result<(), AutomationError>;

    /// Issue a named key chord. The core only uses the fixed start-menu
    /// toggle gesture.
    fn key_chord(&self, chord: &str) -> Result<(), AutomationError>;

    /// Block until a UI-mutating action has had time to settle. The
    /// platform gives no completion events for these transitions, so a
    /// worst-case wait stands in.
    fn settle(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Create one overlay surface per connected display.
    fn create_overlay_surfaces(&self) -> Result<Vec<Box<dyn OverlaySurface>>, AutomationError>;
}

/// Select the provider for the current platform.
pub fn create_engine() -> Result<Arc<dyn AccessibilityEngine>, AutomationError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsEngine::new()?))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(AutomationError::UnsupportedPlatform(
            "no accessibility provider for the current platform".to_string(),
        ))
    }
}
