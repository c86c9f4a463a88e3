#![allow(clippy::arc_with_non_send_sync)]
//! Windows accessibility provider backed by UI Automation.

use crate::element::{UIElement, UIElementImpl};
use crate::errors::AutomationError;
use crate::platforms::{
    AccessibilityEngine, MouseButton, OverlaySurface, Platform, WindowHandle,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uiautomation::controls::ControlType;
use uiautomation::patterns::UIWindowPattern;
use uiautomation::types::{TreeScope, UIProperty, WindowVisualState};
use uiautomation::variants::Variant;
use uiautomation::UIAutomation;

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEINPUT, MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

mod overlay;

// How far focused_window climbs looking for a window ancestor before giving
// up and returning the focused element itself.
const MAX_ANCESTOR_CLIMB: usize = 32;

// UIA COM pointers are apartment-bound; the engine is only ever driven from
// the single automation thread.
pub struct ThreadSafeWinUIAutomation(Arc<UIAutomation>);
unsafe impl Send for ThreadSafeWinUIAutomation {}
unsafe impl Sync for ThreadSafeWinUIAutomation {}

#[derive(Clone)]
pub struct ThreadSafeWinUIElement(Arc<uiautomation::UIElement>);
unsafe impl Send for ThreadSafeWinUIElement {}
unsafe impl Sync for ThreadSafeWinUIElement {}

pub struct WindowsEngine {
    automation: ThreadSafeWinUIAutomation,
}

impl WindowsEngine {
    pub fn new() -> Result<Self, AutomationError> {
        let automation = UIAutomation::new().map_err(|e| {
            AutomationError::PlatformError(format!("failed to initialize UI Automation: {e}"))
        })?;
        Ok(Self {
            automation: ThreadSafeWinUIAutomation(Arc::new(automation)),
        })
    }
}

impl AccessibilityEngine for WindowsEngine {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn windows(&self) -> Result<Vec<Box<dyn WindowHandle>>, AutomationError> {
        let root = self
            .automation
            .0
            .get_root_element()
            .map_err(platform_error)?;
        // Top-level windows are direct children of the desktop.
        let condition = self
            .automation
            .0
            .create_property_condition(
                UIProperty::ControlType,
                Variant::from(ControlType::Window as i32),
                None,
            )
            .map_err(platform_error)?;
        let elements = root
            .find_all(TreeScope::Children, &condition)
            .map_err(platform_error)?;
        debug!("enumerated {} top-level windows", elements.len());
        Ok(elements
            .into_iter()
            .map(|element| {
                Box::new(WindowsWindowHandle {
                    element: ThreadSafeWinUIElement(Arc::new(element)),
                }) as Box<dyn WindowHandle>
            })
            .collect())
    }

    fn focused_window(&self) -> Result<UIElement, AutomationError> {
        let focused = self
            .automation
            .0
            .get_focused_element()
            .map_err(platform_error)?;
        let walker = self
            .automation
            .0
            .get_raw_view_walker()
            .map_err(platform_error)?;
        let mut current = focused;
        for _ in 0..MAX_ANCESTOR_CLIMB {
            if matches!(current.get_control_type(), Ok(ControlType::Window)) {
                break;
            }
            match walker.get_parent(&current) {
                Ok(parent) => current = parent,
                Err(_) => break,
            }
        }
        Ok(wrap_element(current))
    }

    fn move_mouse(&self, x: f64, y: f64) -> Result<(), AutomationError> {
        let (abs_x, abs_y) = to_absolute(x, y);
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: abs_x,
                    dy: abs_y,
                    mouseData: 0,
                    dwFlags: MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        unsafe {
            SendInput(&[input], std::mem::size_of::<INPUT>() as i32);
        }
        Ok(())
    }

    fn click_mouse(&self, button: MouseButton) -> Result<(), AutomationError> {
        let (down, up) = match button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
            MouseButton::Middle => (MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP),
        };
        let inputs = [button_input(down), button_input(up)];
        unsafe {
            SendInput(&inputs, std::mem::size_of::<INPUT>() as i32);
        }
        Ok(())
    }

    fn key_chord(&self, chord: &str) -> Result<(), AutomationError> {
        let keys = format!("{{{chord}}}");
        self.automation
            .0
            .get_root_element()
            .map_err(platform_error)?
            .send_keys(&keys, 10)
            .map_err(|e| AutomationError::PlatformError(format!("failed to send key chord: {e}")))
    }

    fn create_overlay_surfaces(&self) -> Result<Vec<Box<dyn OverlaySurface>>, AutomationError> {
        overlay::create_surfaces()
    }
}

struct WindowsWindowHandle {
    element: ThreadSafeWinUIElement,
}

impl WindowHandle for WindowsWindowHandle {
    fn is_hidden(&self) -> bool {
        self.element.0.is_offscreen().unwrap_or(false)
    }

    fn is_minimized(&self) -> bool {
        self.element
            .0
            .get_pattern::<UIWindowPattern>()
            .and_then(|pattern| pattern.get_window_visual_state())
            .map(|state| state == WindowVisualState::Minimized)
            .unwrap_or(false)
    }

    fn element(&self) -> Result<UIElement, AutomationError> {
        // A window that vanished mid-enumeration surfaces the failure here,
        // on the first attribute read.
        self.element.0.get_name().map_err(|e| {
            AutomationError::PlatformError(format!("window is no longer accessible: {e}"))
        })?;
        Ok(UIElement::new(Box::new(WindowsUIElement {
            element: self.element.clone(),
        })))
    }
}

pub struct WindowsUIElement {
    element: ThreadSafeWinUIElement,
}

impl fmt::Debug for WindowsUIElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowsUIElement")
            .field("name", &self.element.0.get_name().unwrap_or_default())
            .field("class", &self.element.0.get_classname().unwrap_or_default())
            .finish()
    }
}

impl UIElementImpl for WindowsUIElement {
    fn name(&self) -> Result<String, AutomationError> {
        self.element.0.get_name().map_err(platform_error)
    }

    fn class_name(&self) -> Result<String, AutomationError> {
        self.element.0.get_classname().map_err(platform_error)
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        let automation = create_ui_automation()?;
        let condition = automation
            .create_true_condition()
            .map_err(platform_error)?;
        let children = self
            .element
            .0
            .find_all(TreeScope::Children, &condition)
            .map_err(platform_error)?;
        Ok(children.into_iter().map(wrap_element).collect())
    }

    fn clickable_point(&self) -> Result<(f64, f64), AutomationError> {
        let point = self
            .element
            .0
            .get_clickable_point()
            .map_err(platform_error)?
            .ok_or_else(|| {
                AutomationError::PlatformError("element reports no clickable point".to_string())
            })?;
        Ok((f64::from(point.get_x()), f64::from(point.get_y())))
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(WindowsUIElement {
            element: self.element.clone(),
        })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn wrap_element(element: uiautomation::UIElement) -> UIElement {
    UIElement::new(Box::new(WindowsUIElement {
        element: ThreadSafeWinUIElement(Arc::new(element)),
    }))
}

// UIA objects are per-thread; child walks acquire a fresh handle rather
// than sharing the engine's COM pointer across threads.
fn create_ui_automation() -> Result<UIAutomation, AutomationError> {
    UIAutomation::new_direct().map_err(|e| {
        AutomationError::PlatformError(format!("failed to acquire UI Automation: {e}"))
    })
}

fn platform_error(e: uiautomation::errors::Error) -> AutomationError {
    AutomationError::PlatformError(e.to_string())
}

fn to_absolute(x: f64, y: f64) -> (i32, i32) {
    let screen_w = unsafe { GetSystemMetrics(SM_CXSCREEN) };
    let screen_h = unsafe { GetSystemMetrics(SM_CYSCREEN) };
    let abs_x = ((x / f64::from(screen_w)) * 65535.0).round() as i32;
    let abs_y = ((y / f64::from(screen_h)) * 65535.0).round() as i32;
    (abs_x, abs_y)
}

fn button_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}
