//! Cross-platform handle to one node of the accessibility tree.

use crate::errors::AutomationError;
use std::fmt;
use std::fmt::Debug;

/// A node in the platform accessibility tree.
///
/// The handle is a read-only view; the underlying tree may mutate at any
/// time, so every accessor can fail with a platform error. Callers treat
/// such failures as "node gone", not as fatal conditions.
pub struct UIElement {
    inner: Box<dyn UIElementImpl>,
}

/// Platform interface backing a [`UIElement`].
pub trait UIElementImpl: Send + Sync + Debug {
    /// Display name reported by the accessibility provider.
    fn name(&self) -> Result<String, AutomationError>;

    /// Platform class identifier (e.g. the Win32 window class).
    fn class_name(&self) -> Result<String, AutomationError>;

    /// Direct children, in the provider's order.
    fn children(&self) -> Result<Vec<UIElement>, AutomationError>;

    /// Screen point at which the element can be clicked.
    fn clickable_point(&self) -> Result<(f64, f64), AutomationError>;

    fn clone_box(&self) -> Box<dyn UIElementImpl>;

    fn as_any(&self) -> &dyn std::any::Any;
}

impl UIElement {
    pub fn new(inner: Box<dyn UIElementImpl>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> Result<String, AutomationError> {
        self.inner.name()
    }

    pub fn class_name(&self) -> Result<String, AutomationError> {
        self.inner.class_name()
    }

    pub fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        self.inner.children()
    }

    pub fn clickable_point(&self) -> Result<(f64, f64), AutomationError> {
        self.inner.clickable_point()
    }

    /// Downcast to the concrete platform element.
    pub fn as_any(&self) -> &dyn std::any::Any {
        self.inner.as_any()
    }
}

impl Clone for UIElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl Debug for UIElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}
