//! Tray and menu navigation built on the search engine.
//!
//! Tray icons are not directly enumerable: the overflow panel only exists
//! after its toggle button is clicked, and submenu containers only exist
//! after their parent item is clicked. The navigator composes searches with
//! the gestures that materialize those trees, and restores a neutral
//! desktop on the failure paths so repeated attempts start from a known
//! state.

use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::overlay::OverlayCoordinator;
use crate::platforms::{AccessibilityEngine, MouseButton, Platform};
use crate::search::{desktop_roots, find_first};
use crate::spec::{exact_match_pattern, landmarks, tray_button, Spec};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Settle delays after UI-mutating gestures, tuned per transition.
const TRAY_REVEAL_SETTLE: Duration = Duration::from_millis(300);
const OVERFLOW_OPEN_SETTLE: Duration = Duration::from_millis(100);
const RECOVERY_SETTLE: Duration = Duration::from_millis(200);
const MENU_OPEN_SETTLE: Duration = Duration::from_millis(100);
const SUBMENU_SETTLE: Duration = Duration::from_millis(50);
const REPL_OPEN_SETTLE: Duration = Duration::from_millis(2000);

/// Key chord toggling the start menu. The same gesture reveals the tray.
const START_MENU_CHORD: &str = "win";

/// Name of the tray icon owning the automation menu.
const MENU_TRAY_LABEL: &str = "Talon";
/// Label of the context entry the first menu level hangs under.
const MENU_CONTEXT_LABEL: &str = "Context";

#[derive(Clone)]
pub struct Navigator {
    engine: Arc<dyn AccessibilityEngine>,
    overlay: Arc<OverlayCoordinator>,
}

impl Navigator {
    pub fn new(engine: Arc<dyn AccessibilityEngine>, overlay: Arc<OverlayCoordinator>) -> Self {
        Self { engine, overlay }
    }

    /// Close the start menu if it is open. No-op on platforms without the
    /// concept.
    pub fn close_start_menu(&self) -> Result<(), AutomationError> {
        let _overlay = self.overlay.enter(None)?;
        self.close_start_menu_if_open()
    }

    fn close_start_menu_if_open(&self) -> Result<(), AutomationError> {
        if self.engine.platform() != Platform::Windows {
            return Ok(());
        }
        let roots = desktop_roots(self.engine.as_ref())?;
        match find_first(roots, &landmarks().start_menu) {
            Ok(_) => {
                debug!("start menu is open; toggling it closed");
                self.engine.key_chord(START_MENU_CHORD)?;
                self.engine.settle(RECOVERY_SETTLE);
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Locate a tray icon whose name matches `name_pattern`.
    #[instrument(skip(self))]
    pub fn find_tray_icon(&self, name_pattern: &str) -> Result<UIElement, AutomationError> {
        let _overlay = self.overlay.enter(Some("Locating tray icon"))?;
        self.find_tray_icon_inner(name_pattern)
    }

    /// Locate and click a tray icon.
    #[instrument(skip(self))]
    pub fn click_tray_icon(
        &self,
        name_pattern: &str,
        button: MouseButton,
    ) -> Result<(), AutomationError> {
        let _overlay = self.overlay.enter(Some("Clicking tray icon"))?;
        let icon = self.find_tray_icon_inner(name_pattern)?;
        self.click_element(&icon, button)
    }

    /// Tries the visible tray first, then the hidden-icons overflow panel.
    /// When the icon is in neither place, the overflow panel and the tray
    /// context are closed again before the failure is reported, so nothing
    /// is left open on screen.
    fn find_tray_icon_inner(&self, name_pattern: &str) -> Result<UIElement, AutomationError> {
        let button_spec = tray_button(name_pattern)?;

        // Known starting state: nothing obscuring the taskbar.
        self.close_start_menu_if_open()?;

        // The tray only reliably exposes its buttons while the start menu
        // context is up.
        self.engine.key_chord(START_MENU_CHORD)?;
        self.engine.settle(TRAY_REVEAL_SETTLE);

        let lib = landmarks();
        let mut primary = lib.taskbar.clone();
        primary.push(button_spec.clone());
        match self.find_first_on_desktop(&primary) {
            Ok(icon) => return Ok(icon),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        debug!("icon not in the visible tray; opening the overflow panel");
        let hidden_button = self.find_first_on_desktop(&lib.hidden_icons_button)?;
        self.click_element(&hidden_button, MouseButton::Left)?;
        self.engine.settle(OVERFLOW_OPEN_SETTLE);

        let mut overflow = lib.overflow_tray.clone();
        overflow.push(button_spec.clone());
        match self.find_first_on_desktop(&overflow) {
            Ok(icon) => Ok(icon),
            Err(e) if e.is_not_found() => {
                self.restore_neutral_desktop(&hidden_button);
                Err(AutomationError::ElementNotFound {
                    spec: Some(button_spec),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Close the overflow panel and the tray context. Best-effort: the
    /// caller is already on a failure path, and a half-restored desktop
    /// must not mask the original not-found error.
    fn restore_neutral_desktop(&self, hidden_button: &UIElement) {
        if let Err(e) = self.engine.key_chord(START_MENU_CHORD) {
            debug!("recovery start-menu toggle failed: {e}");
        }
        self.engine.settle(RECOVERY_SETTLE);
        if let Err(e) = self.click_element(hidden_button, MouseButton::Left) {
            debug!("recovery overflow toggle failed: {e}");
        }
        self.engine.settle(RECOVERY_SETTLE);
        if let Err(e) = self.engine.key_chord(START_MENU_CHORD) {
            debug!("recovery start-menu toggle failed: {e}");
        }
    }

    /// Click through a sequence of exactly-labeled menu items hanging off
    /// the automation tray icon.
    #[instrument(skip(self))]
    pub fn click_menu_sequence(&self, labels: &[&str]) -> Result<(), AutomationError> {
        if labels.is_empty() {
            return Err(AutomationError::InvalidArgument(
                "menu sequence must contain at least one label".to_string(),
            ));
        }
        let _overlay = self.overlay.enter(Some("Navigating menu"))?;
        self.click_menu_sequence_inner(labels)
    }

    fn click_menu_sequence_inner(&self, labels: &[&str]) -> Result<(), AutomationError> {
        let icon = self.find_tray_icon_inner(&exact_match_pattern(MENU_TRAY_LABEL))?;
        self.click_element(&icon, MouseButton::Left)?;
        self.engine.settle(MENU_OPEN_SETTLE);

        let path = vec![Spec::exact(MENU_CONTEXT_LABEL), Spec::exact(labels[0])];
        let item = self.find_first_on_desktop(&path)?;
        self.click_element(&item, MouseButton::Left)?;

        for step in labels.windows(2) {
            self.engine.settle(SUBMENU_SETTLE);
            // Submenu containers are named after the item that opened them,
            // so each step keys off the previous label rather than a fixed
            // structural landmark.
            let path = vec![Spec::exact(step[0]), Spec::exact(step[1])];
            let item = self.find_first_on_desktop(&path)?;
            self.click_element(&item, MouseButton::Left)?;
        }
        Ok(())
    }

    /// Open the voice runtime's REPL console from its tray menu.
    #[instrument(skip(self))]
    pub fn open_repl(&self) -> Result<(), AutomationError> {
        let _overlay = self.overlay.enter(Some("Opening REPL"))?;
        self.click_menu_sequence_inner(&["Scripting", "Console (REPL)"])?;
        // Unlike the log viewer, the console leaves the tray context up
        // after it opens; wait for it and dismiss the context explicitly.
        self.engine.settle(REPL_OPEN_SETTLE);
        self.engine.key_chord(START_MENU_CHORD)
    }

    /// Open the voice runtime's log viewer from its tray menu.
    #[instrument(skip(self))]
    pub fn open_log(&self) -> Result<(), AutomationError> {
        let _overlay = self.overlay.enter(Some("Opening log viewer"))?;
        self.click_menu_sequence_inner(&["Scripting", "View Log"])
    }

    /// Trigger the voice runtime's update check from its tray menu.
    #[instrument(skip(self))]
    pub fn check_for_updates(&self) -> Result<(), AutomationError> {
        let _overlay = self.overlay.enter(Some("Checking for updates"))?;
        self.click_menu_sequence_inner(&["Check for Updates..."])
    }

    /// Move to the element's clickable point and click.
    pub fn click_element(
        &self,
        element: &UIElement,
        button: MouseButton,
    ) -> Result<(), AutomationError> {
        let (x, y) = element.clickable_point()?;
        self.engine.move_mouse(x, y)?;
        self.engine.click_mouse(button)
    }

    fn find_first_on_desktop(&self, path: &[Spec]) -> Result<UIElement, AutomationError> {
        let roots = desktop_roots(self.engine.as_ref())?;
        find_first(roots, path)
    }
}
