//! Tests for the spec model and landmark library.

use crate::spec::{
    exact_match_pattern, landmarks, tray_button, Spec, SpecDef,
};
use crate::AutomationError;

#[test]
fn both_patterns_absent_matches_anything() {
    let spec = Spec::any();
    assert!(spec.matches("anything", "AnyClass"));
    assert!(spec.matches("", ""));
}

#[test]
fn name_matching_is_case_insensitive_by_default() {
    let spec = Spec::new(Some("taskbar"), None, false, false).unwrap();
    assert!(spec.matches("Taskbar", ""));

    let strict = Spec::new(Some("taskbar"), None, false, true).unwrap();
    assert!(!strict.matches("Taskbar", ""));
    assert!(strict.matches("taskbar", ""));
}

#[test]
fn class_matching_is_always_case_sensitive() {
    let spec = Spec::new(None, Some("shell_traywnd"), false, false).unwrap();
    assert!(!spec.matches("", "Shell_TrayWnd"));
    assert!(spec.matches("", "shell_traywnd"));
}

#[test]
fn patterns_use_search_semantics() {
    let spec = Spec::named("Hidden Icons").unwrap();
    assert!(spec.matches("Show Hidden Icons Button", ""));
}

#[test]
fn exact_specs_escape_pattern_metacharacters() {
    let spec = Spec::exact("Check for Updates...");
    assert!(spec.matches("Check for Updates...", ""));
    assert!(!spec.matches("Check for Updates", ""));
    assert!(!spec.matches("Check for UpdatesABC", ""));
    assert!(!spec.matches("prefix Check for Updates...", ""));
}

#[test]
fn exact_match_pattern_is_anchored() {
    assert_eq!(exact_match_pattern("View Log"), "^View Log$");
}

#[test]
fn invalid_patterns_are_rejected_at_construction() {
    let err = Spec::new(Some("["), None, false, false).unwrap_err();
    assert!(matches!(err, AutomationError::InvalidPattern(_)));
}

#[test]
fn spec_def_round_trips_through_json() {
    let def = SpecDef {
        name: Some("Discord".to_string()),
        class_name: Some("SystemTray.NormalButton".to_string()),
        indirect: true,
        case_sensitive: false,
    };
    let json = def.to_json().unwrap();
    let parsed = SpecDef::from_json(&json).unwrap();
    assert_eq!(parsed, def);

    let spec = Spec::try_from(parsed).unwrap();
    assert!(spec.is_indirect());
    assert_eq!(SpecDef::from(&spec), def);
}

#[test]
fn landmark_paths_compose_by_concatenation() {
    let lib = landmarks();
    assert_eq!(lib.taskbar.len(), 1);
    assert_eq!(lib.hidden_icons_button.len(), 2);
    assert_eq!(
        lib.hidden_icons_button[0].class_pattern(),
        lib.taskbar[0].class_pattern()
    );

    let button = &lib.hidden_icons_button[1];
    assert_eq!(button.class_pattern(), Some("SystemTray.NormalButton"));
    assert!(button.is_indirect());
}

#[test]
fn not_found_errors_name_the_failing_spec() {
    let err = AutomationError::ElementNotFound {
        spec: Some(tray_button("Discord").unwrap()),
    };
    let message = err.to_string();
    assert!(message.contains("Discord"), "unexpected message: {message}");
}
