//! Declarative match stages for accessibility-tree searches.

use crate::errors::AutomationError;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One stage of a search path: a predicate over a node's name and class.
///
/// A stage with neither pattern set matches every node it is tested
/// against, which makes it usable as a structural passthrough.
#[derive(Debug, Clone)]
pub struct Spec {
    name: Option<Regex>,
    class_name: Option<Regex>,
    case_sensitive: bool,
    indirect: bool,
}

impl Spec {
    /// Build a stage from optional name and class patterns.
    ///
    /// `case_sensitive` governs the name pattern only; class identifiers
    /// are always matched case-sensitively. An `indirect` stage may match
    /// at any descendant depth instead of only at the level it is
    /// evaluated, which is how tray buttons buried under container panes
    /// are reached.
    pub fn new(
        name: Option<&str>,
        class_name: Option<&str>,
        indirect: bool,
        case_sensitive: bool,
    ) -> Result<Self, AutomationError> {
        let name = name.map(|p| compile(p, case_sensitive)).transpose()?;
        let class_name = class_name.map(|p| compile(p, true)).transpose()?;
        Ok(Self {
            name,
            class_name,
            case_sensitive,
            indirect,
        })
    }

    /// Stage that matches any node.
    pub fn any() -> Self {
        Self {
            name: None,
            class_name: None,
            case_sensitive: false,
            indirect: false,
        }
    }

    /// Name-only stage with the default (case-insensitive) matching.
    pub fn named(pattern: &str) -> Result<Self, AutomationError> {
        Self::new(Some(pattern), None, false, false)
    }

    /// Stage matching the literal `label` exactly: anchored, fully escaped,
    /// case-sensitive. Menu items are matched this way so a fuzzy pattern
    /// can never click a neighboring entry.
    pub fn exact(label: &str) -> Self {
        let pattern = exact_match_pattern(label);
        let name = Regex::new(&pattern).expect("escaped literal is a valid pattern");
        Self {
            name: Some(name),
            class_name: None,
            case_sensitive: true,
            indirect: false,
        }
    }

    /// Whether a node with the given name and class satisfies this stage.
    ///
    /// Patterns use search semantics: they may match anywhere in the
    /// string unless the pattern itself is anchored.
    pub fn matches(&self, name: &str, class_name: &str) -> bool {
        let name_ok = self.name.as_ref().is_none_or(|re| re.is_match(name));
        let class_ok = self
            .class_name
            .as_ref()
            .is_none_or(|re| re.is_match(class_name));
        name_ok && class_ok
    }

    pub fn is_indirect(&self) -> bool {
        self.indirect
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn name_pattern(&self) -> Option<&str> {
        self.name.as_ref().map(|re| re.as_str())
    }

    pub fn class_pattern(&self) -> Option<&str> {
        self.class_name.as_ref().map(|re| re.as_str())
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name~{:?} class~{:?}",
            self.name_pattern().unwrap_or("*"),
            self.class_pattern().unwrap_or("*"),
        )?;
        if self.indirect {
            write!(f, " (indirect)")?;
        }
        Ok(())
    }
}

fn compile(pattern: &str, case_sensitive: bool) -> Result<Regex, AutomationError> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| AutomationError::InvalidPattern(format!("{pattern:?}: {e}")))
}

/// Anchored pattern matching the literal string and nothing else.
pub fn exact_match_pattern(label: &str) -> String {
    format!("^{}$", regex::escape(label))
}

/// Wire form of a [`Spec`], for hosts that register search stages as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub indirect: bool,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl SpecDef {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl TryFrom<SpecDef> for Spec {
    type Error = AutomationError;

    fn try_from(def: SpecDef) -> Result<Self, Self::Error> {
        Spec::new(
            def.name.as_deref(),
            def.class_name.as_deref(),
            def.indirect,
            def.case_sensitive,
        )
    }
}

impl From<&Spec> for SpecDef {
    fn from(spec: &Spec) -> Self {
        Self {
            name: spec.name_pattern().map(str::to_string),
            class_name: spec.class_pattern().map(str::to_string),
            indirect: spec.indirect,
            case_sensitive: spec.case_sensitive,
        }
    }
}

/// Spec for a named button in the system tray. Tray buttons sit at varying
/// depths under their container, so the stage searches indirectly.
pub fn tray_button(name_pattern: &str) -> Result<Spec, AutomationError> {
    Spec::new(Some(name_pattern), Some("SystemTray.NormalButton"), true, false)
}

/// Predefined search paths for stable UI landmarks. Paths compose by
/// concatenation: `[taskbar..., tray_button(name)]` finds a tray icon.
#[derive(Debug, Clone)]
pub struct SearchPathLibrary {
    /// The top-level taskbar window.
    pub taskbar: Vec<Spec>,
    /// Button in the visible tray that opens the hidden-icons overflow panel.
    pub hidden_icons_button: Vec<Spec>,
    /// Root of the overflow panel holding collapsed tray icons.
    pub overflow_tray: Vec<Spec>,
    /// The start menu host window, used to reset UI state before navigating.
    pub start_menu: Vec<Spec>,
}

impl SearchPathLibrary {
    fn windows() -> Self {
        let taskbar = vec![landmark(Some("Taskbar"), Some("Shell_TrayWnd"))];
        let mut hidden_icons_button = taskbar.clone();
        hidden_icons_button
            .push(tray_button("Show Hidden Icons").expect("landmark patterns are valid"));
        Self {
            taskbar,
            hidden_icons_button,
            overflow_tray: vec![landmark(None, Some("TopLevelWindowForOverflowXamlIsland"))],
            start_menu: vec![landmark(Some("^Start$"), Some("Windows.UI.Core.CoreWindow"))],
        }
    }
}

fn landmark(name: Option<&str>, class_name: Option<&str>) -> Spec {
    Spec::new(name, class_name, false, false).expect("landmark patterns are valid")
}

static WINDOWS_LANDMARKS: Lazy<SearchPathLibrary> = Lazy::new(SearchPathLibrary::windows);

/// The predefined landmark library. Only Windows landmarks are defined at
/// present; they are the ones the tray navigator relies on.
pub fn landmarks() -> &'static SearchPathLibrary {
    &WINDOWS_LANDMARKS
}
