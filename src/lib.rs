//! Desktop UI automation through accessibility trees.
//!
//! This crate locates and clicks UI elements (tray icons, menu items,
//! windows) identified by fuzzy name/class patterns rather than fixed
//! coordinates, shows a busy overlay while automation is in flight, and
//! drives the tray/menu navigation a voice-control layer needs to reach UI
//! that is not directly enumerable.

use std::sync::Arc;
use tracing::instrument;

pub mod element;
pub mod errors;
pub mod navigator;
pub mod overlay;
pub mod platforms;
pub mod search;
pub mod spec;
#[cfg(test)]
mod tests;

pub use element::{UIElement, UIElementImpl};
pub use errors::AutomationError;
pub use navigator::Navigator;
pub use overlay::{OverlayCoordinator, OverlayScope};
pub use platforms::{
    AccessibilityEngine, MouseButton, OverlaySurface, Platform, WindowHandle,
};
pub use search::ElementMatches;
pub use spec::{exact_match_pattern, tray_button, SearchPathLibrary, Spec, SpecDef};

/// The main entry point for UI automation.
///
/// Owns the platform provider, the shared busy-overlay coordinator, and the
/// tray/menu navigator, and exposes one method per host-facing operation.
pub struct Automator {
    engine: Arc<dyn AccessibilityEngine>,
    overlay: Arc<OverlayCoordinator>,
    navigator: Navigator,
}

impl Automator {
    /// Build on the provider for the current platform.
    #[instrument]
    pub fn new() -> Result<Self, AutomationError> {
        Ok(Self::with_engine(platforms::create_engine()?))
    }

    /// Build on an explicit engine, for hosts that bring their own
    /// accessibility provider.
    pub fn with_engine(engine: Arc<dyn AccessibilityEngine>) -> Self {
        let overlay = Arc::new(OverlayCoordinator::new(engine.clone()));
        let navigator = Navigator::new(engine.clone(), overlay.clone());
        Self {
            engine,
            overlay,
            navigator,
        }
    }

    /// The predefined landmark search paths.
    pub fn landmarks(&self) -> &'static SearchPathLibrary {
        spec::landmarks()
    }

    /// Open a busy-overlay scope, optionally with a status label. Scopes
    /// nest freely; the overlay is torn down when the last one drops.
    pub fn overlay(&self, status: Option<&str>) -> Result<OverlayScope<'_>, AutomationError> {
        self.overlay.enter(status)
    }

    /// Lazily search the whole desktop (or the supplied roots) for `path`.
    ///
    /// The returned sequence reads the tree only as it is pulled, and may
    /// be abandoned at any point at no cost. Callers making a long pull
    /// should bracket it in an [`overlay`](Self::overlay) scope themselves;
    /// the sequence can outlive any scope this method could open.
    #[instrument(skip(self, path, roots))]
    pub fn find_elements(
        &self,
        path: &[Spec],
        roots: Option<Vec<UIElement>>,
    ) -> Result<ElementMatches, AutomationError> {
        let roots = match roots {
            Some(roots) => roots,
            None => search::desktop_roots(self.engine.as_ref())?,
        };
        search::search(roots, path)
    }

    /// Like [`find_elements`](Self::find_elements), scoped to the currently
    /// focused window.
    #[instrument(skip(self, path))]
    pub fn find_elements_in_foreground(
        &self,
        path: &[Spec],
    ) -> Result<ElementMatches, AutomationError> {
        let root = self.engine.focused_window()?;
        search::search(vec![root], path)
    }

    /// First element matching `path`, or a not-found error carrying the
    /// path's final spec.
    #[instrument(skip(self, path, roots))]
    pub fn find_first(
        &self,
        path: &[Spec],
        roots: Option<Vec<UIElement>>,
    ) -> Result<UIElement, AutomationError> {
        let _overlay = self.overlay.enter(None)?;
        let roots = match roots {
            Some(roots) => roots,
            None => search::desktop_roots(self.engine.as_ref())?,
        };
        search::find_first(roots, path)
    }

    /// Click an element at its clickable point.
    pub fn click_element(
        &self,
        element: &UIElement,
        button: MouseButton,
    ) -> Result<(), AutomationError> {
        let _overlay = self.overlay.enter(None)?;
        self.navigator.click_element(element, button)
    }

    /// Click the first element matching `path`.
    #[instrument(skip(self, path))]
    pub fn click_first(&self, path: &[Spec], button: MouseButton) -> Result<(), AutomationError> {
        let _overlay = self.overlay.enter(None)?;
        let roots = search::desktop_roots(self.engine.as_ref())?;
        let element = search::find_first(roots, path)?;
        self.navigator.click_element(&element, button)
    }

    /// Close the start-menu-equivalent UI if it is open. No-op on platforms
    /// without the concept.
    pub fn close_start_menu(&self) -> Result<(), AutomationError> {
        self.navigator.close_start_menu()
    }

    /// Locate a tray icon by name pattern, opening the hidden-icons
    /// overflow panel if needed.
    pub fn find_tray_icon(&self, name_pattern: &str) -> Result<UIElement, AutomationError> {
        self.navigator.find_tray_icon(name_pattern)
    }

    /// Locate and click a tray icon by name pattern.
    pub fn click_tray_icon(
        &self,
        name_pattern: &str,
        button: MouseButton,
    ) -> Result<(), AutomationError> {
        self.navigator.click_tray_icon(name_pattern, button)
    }

    /// Click through a sequence of exactly-labeled tray menu items.
    pub fn click_menu_sequence(&self, labels: &[&str]) -> Result<(), AutomationError> {
        self.navigator.click_menu_sequence(labels)
    }

    /// Open the voice runtime's REPL console from its tray menu.
    pub fn open_repl(&self) -> Result<(), AutomationError> {
        self.navigator.open_repl()
    }

    /// Open the voice runtime's log viewer from its tray menu.
    pub fn open_log(&self) -> Result<(), AutomationError> {
        self.navigator.open_log()
    }

    /// Check the voice runtime for updates from its tray menu.
    pub fn check_for_updates(&self) -> Result<(), AutomationError> {
        self.navigator.check_for_updates()
    }
}

impl Clone for Automator {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            overlay: self.overlay.clone(),
            navigator: self.navigator.clone(),
        }
    }
}
