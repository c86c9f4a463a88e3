//! Lazy depth-first search over live accessibility trees.

use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::platforms::AccessibilityEngine;
use crate::spec::Spec;
use std::sync::Arc;
use tracing::debug;

/// Substrings marking a top-level window as a browser. Browsers are
/// expensive to scrape and rarely hold the target, so they are searched
/// after everything else.
const BROWSER_WINDOW_NAMES: &[&str] = &["firefox", "chrome", "edge", "safari", "brave"];

/// One unit of pending traversal work: a node and the index of the stage
/// it must satisfy next.
struct TraversalFrame {
    node: UIElement,
    stage: usize,
}

/// Lazy sequence of elements matching a search path.
///
/// Pulling the next match performs only as much traversal as needed, and an
/// abandoned iterator does no further tree reads. The tree is a best-effort
/// snapshot: nodes that become unreadable between enqueue and pop are
/// skipped, never surfaced as errors.
pub struct ElementMatches {
    specs: Arc<[Spec]>,
    stack: Vec<TraversalFrame>,
}

/// Search `roots` (in order) for elements satisfying every stage of `path`.
///
/// Stage `i + 1` is only evaluated against the children of a node that
/// satisfied stage `i`; a path of length 1 yields root-level matches
/// directly. The empty path is rejected.
pub fn search(roots: Vec<UIElement>, path: &[Spec]) -> Result<ElementMatches, AutomationError> {
    if path.is_empty() {
        return Err(AutomationError::InvalidArgument(
            "search path must contain at least one spec".to_string(),
        ));
    }
    let specs: Arc<[Spec]> = path.to_vec().into();
    // Seeded in reverse so the first root supplied is popped first.
    let stack = roots
        .into_iter()
        .rev()
        .map(|node| TraversalFrame { node, stage: 0 })
        .collect();
    Ok(ElementMatches { specs, stack })
}

impl Iterator for ElementMatches {
    type Item = UIElement;

    fn next(&mut self) -> Option<UIElement> {
        while let Some(frame) = self.stack.pop() {
            let Some(spec) = self.specs.get(frame.stage) else {
                // Callers never enqueue an exhausted suffix; drop defensively.
                continue;
            };
            let name = match frame.node.name() {
                Ok(name) => name,
                Err(e) => {
                    debug!("skipping node with unreadable name: {e}");
                    continue;
                }
            };
            let class_name = match frame.node.class_name() {
                Ok(class_name) => class_name,
                Err(e) => {
                    debug!("skipping node with unreadable class: {e}");
                    continue;
                }
            };
            if spec.matches(&name, &class_name) {
                if frame.stage + 1 == self.specs.len() {
                    return Some(frame.node);
                }
                self.push_children(&frame.node, frame.stage + 1);
            } else if spec.is_indirect() {
                // Any non-matching node under an indirect stage counts as a
                // potential intermediate; its children stay queued against
                // the same stage.
                self.push_children(&frame.node, frame.stage);
            }
        }
        None
    }
}

impl ElementMatches {
    fn push_children(&mut self, node: &UIElement, stage: usize) {
        let children = match node.children() {
            Ok(children) => children,
            Err(e) => {
                debug!("pruning subtree with unreadable children: {e}");
                return;
            }
        };
        // Reversed so the leftmost child is popped first.
        for child in children.into_iter().rev() {
            self.stack.push(TraversalFrame { node: child, stage });
        }
    }
}

/// First element matching `path`, or a not-found error carrying the path's
/// final spec. Pulls exactly one result from the lazy sequence; the rest of
/// the search space is never expanded.
pub fn find_first(roots: Vec<UIElement>, path: &[Spec]) -> Result<UIElement, AutomationError> {
    let last = path.last().cloned();
    search(roots, path)?
        .next()
        .ok_or(AutomationError::ElementNotFound { spec: last })
}

/// Roots for a whole-desktop search: every visible, non-minimized top-level
/// window, browsers demoted to the end. Windows whose root node cannot be
/// read (typically closed mid-enumeration) are skipped.
pub fn desktop_roots(
    engine: &dyn AccessibilityEngine,
) -> Result<Vec<UIElement>, AutomationError> {
    let mut roots = Vec::new();
    let mut browsers = Vec::new();
    for window in engine.windows()? {
        if window.is_hidden() || window.is_minimized() {
            continue;
        }
        let element = match window.element() {
            Ok(element) => element,
            Err(e) => {
                debug!("skipping inaccessible window: {e}");
                continue;
            }
        };
        let name = element.name().unwrap_or_default().to_lowercase();
        if BROWSER_WINDOW_NAMES.iter().any(|b| name.contains(b)) {
            browsers.push(element);
        } else {
            roots.push(element);
        }
    }
    roots.append(&mut browsers);
    Ok(roots)
}
