//! End-to-end tests for the tray/menu navigator against the mock engine.

use super::init_tracing;
use super::mock::{counter, node, node_at, InputEvent, MockEngine, MockNode};
use crate::navigator::Navigator;
use crate::overlay::OverlayCoordinator;
use crate::platforms::{AccessibilityEngine, MouseButton};
use crate::AutomationError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn navigator_for(engine: &Arc<MockEngine>) -> Navigator {
    let dyn_engine: Arc<dyn AccessibilityEngine> = engine.clone();
    let overlay = Arc::new(OverlayCoordinator::new(dyn_engine.clone()));
    Navigator::new(dyn_engine, overlay)
}

/// Taskbar window with the given buttons buried one pane deep, the way the
/// shell nests its notification area.
fn taskbar_with(visits: &Arc<AtomicUsize>, buttons: Vec<Arc<MockNode>>) -> Arc<MockNode> {
    let pane = node(visits, "Notification area", "SystemTray.Pane", buttons);
    node(visits, "Taskbar", "Shell_TrayWnd", vec![pane])
}

fn hidden_icons_button(visits: &Arc<AtomicUsize>) -> Arc<MockNode> {
    node_at(
        visits,
        "Show Hidden Icons",
        "SystemTray.NormalButton",
        (90.0, 5.0),
        vec![],
    )
}

#[test]
fn tray_icon_in_the_visible_tray_skips_the_overflow_fallback() {
    init_tracing();
    let visits = counter();
    let engine = MockEngine::new();
    let discord = node_at(
        &visits,
        "Discord",
        "SystemTray.NormalButton",
        (111.0, 5.0),
        vec![],
    );
    engine.add_window(taskbar_with(
        &visits,
        vec![hidden_icons_button(&visits), discord],
    ));

    let nav = navigator_for(&engine);
    let icon = nav.find_tray_icon("Discord").unwrap();

    assert_eq!(icon.name().unwrap(), "Discord");
    assert_eq!(engine.click_count(), 0);
    assert_eq!(engine.key_chord_count("win"), 1);
}

#[test]
fn tray_icon_in_the_overflow_panel_is_found_after_one_toggle() {
    init_tracing();
    let visits = counter();
    let engine = MockEngine::new();
    engine.add_window(taskbar_with(&visits, vec![hidden_icons_button(&visits)]));
    let overflow_discord = node_at(
        &visits,
        "Discord",
        "SystemTray.NormalButton",
        (300.0, 200.0),
        vec![],
    );
    engine.reveal_on_click(node(
        &visits,
        "Overflow",
        "TopLevelWindowForOverflowXamlIsland",
        vec![overflow_discord],
    ));

    let nav = navigator_for(&engine);
    let icon = nav.find_tray_icon("Discord").unwrap();

    assert_eq!(icon.clickable_point().unwrap(), (300.0, 200.0));
    // One click: the hidden-icons toggle.
    assert_eq!(engine.click_count(), 1);
    assert_eq!(engine.mouse_moves(), vec![(90.0, 5.0)]);
}

#[test]
fn total_failure_restores_a_neutral_desktop_before_reporting() {
    init_tracing();
    let visits = counter();
    let engine = MockEngine::new();
    engine.add_window(taskbar_with(&visits, vec![hidden_icons_button(&visits)]));
    engine.reveal_on_click(node(
        &visits,
        "Overflow",
        "TopLevelWindowForOverflowXamlIsland",
        vec![node(
            &visits,
            "Teams",
            "SystemTray.NormalButton",
            vec![],
        )],
    ));

    let nav = navigator_for(&engine);
    let err = nav.find_tray_icon("Discord").unwrap_err();

    match err {
        AutomationError::ElementNotFound { spec: Some(spec) } => {
            assert_eq!(spec.name_pattern(), Some("Discord"));
        }
        other => panic!("expected spec-carrying not-found, got {other:?}"),
    }

    // Recovery re-toggled the overflow button and closed the tray context.
    let expected = vec![
        InputEvent::KeyChord("win".to_string()),
        InputEvent::Settle(300),
        InputEvent::MouseMove(90.0, 5.0),
        InputEvent::Click(MouseButton::Left),
        InputEvent::Settle(100),
        InputEvent::KeyChord("win".to_string()),
        InputEvent::Settle(200),
        InputEvent::MouseMove(90.0, 5.0),
        InputEvent::Click(MouseButton::Left),
        InputEvent::Settle(200),
        InputEvent::KeyChord("win".to_string()),
    ];
    assert_eq!(engine.recorded_events(), expected);
}

#[test]
fn menu_sequence_clicks_tray_icon_then_each_labeled_item() {
    init_tracing();
    let visits = counter();
    let engine = MockEngine::new();
    let talon = node_at(
        &visits,
        "Talon",
        "SystemTray.NormalButton",
        (10.0, 10.0),
        vec![],
    );
    engine.add_window(taskbar_with(&visits, vec![talon]));
    // The context menu window appears when the tray icon is clicked; the
    // submenu window is named after the item that opened it.
    engine.reveal_on_click(node(
        &visits,
        "Context",
        "#32768",
        vec![
            node_at(&visits, "Scripting", "MenuItem", (20.0, 20.0), vec![]),
            node_at(
                &visits,
                "Check for Updates...",
                "MenuItem",
                (20.0, 40.0),
                vec![],
            ),
        ],
    ));
    engine.reveal_on_click(node(
        &visits,
        "Scripting",
        "#32768",
        vec![node_at(&visits, "View Log", "MenuItem", (30.0, 30.0), vec![])],
    ));

    let nav = navigator_for(&engine);
    nav.click_menu_sequence(&["Scripting", "View Log"]).unwrap();

    assert_eq!(
        engine.mouse_moves(),
        vec![(10.0, 10.0), (20.0, 20.0), (30.0, 30.0)]
    );
    assert_eq!(engine.click_count(), 3);
    assert_eq!(engine.key_chord_count("win"), 1);
}

#[test]
fn single_item_menu_sequence_needs_no_submenu_step() {
    init_tracing();
    let visits = counter();
    let engine = MockEngine::new();
    let talon = node_at(
        &visits,
        "Talon",
        "SystemTray.NormalButton",
        (10.0, 10.0),
        vec![],
    );
    engine.add_window(taskbar_with(&visits, vec![talon]));
    engine.reveal_on_click(node(
        &visits,
        "Context",
        "#32768",
        vec![node_at(
            &visits,
            "Check for Updates...",
            "MenuItem",
            (20.0, 40.0),
            vec![],
        )],
    ));

    let nav = navigator_for(&engine);
    nav.click_menu_sequence(&["Check for Updates..."]).unwrap();

    assert_eq!(engine.mouse_moves(), vec![(10.0, 10.0), (20.0, 40.0)]);
    assert_eq!(engine.click_count(), 2);
}

#[test]
fn empty_menu_sequence_is_rejected() {
    init_tracing();
    let engine = MockEngine::new();
    let nav = navigator_for(&engine);
    let err = nav.click_menu_sequence(&[]).unwrap_err();
    assert!(matches!(err, AutomationError::InvalidArgument(_)));
}

#[test]
fn close_start_menu_toggles_only_when_the_menu_is_open() {
    init_tracing();
    let visits = counter();
    let engine = MockEngine::new();
    engine.add_window(node(&visits, "Start", "Windows.UI.Core.CoreWindow", vec![]));

    let nav = navigator_for(&engine);
    nav.close_start_menu().unwrap();
    assert_eq!(engine.key_chord_count("win"), 1);

    let quiet_engine = MockEngine::new();
    let quiet_nav = navigator_for(&quiet_engine);
    quiet_nav.close_start_menu().unwrap();
    assert_eq!(quiet_engine.key_chord_count("win"), 0);
}

#[test]
fn navigator_operations_run_inside_one_overlay_scope() {
    init_tracing();
    let visits = counter();
    let engine = MockEngine::new();
    let discord = node_at(
        &visits,
        "Discord",
        "SystemTray.NormalButton",
        (111.0, 5.0),
        vec![],
    );
    engine.add_window(taskbar_with(&visits, vec![discord]));

    let nav = navigator_for(&engine);
    nav.find_tray_icon("Discord").unwrap();

    let rendered = engine.rendered.lock().unwrap();
    assert!(rendered.iter().any(|(text, _)| text == "Locating tray icon"));
    drop(rendered);
    assert_eq!(engine.live_surfaces.load(Ordering::Relaxed), 0);
}
