use offline_translate_lib::desktop::*;

#[test]
fn default_shortcut_is_valid() {
    let shortcut = default_shortcut();
    let shortcut_str = shortcut.into_string();
    assert!(shortcut_str.contains("alt") || shortcut_str.contains("Alt"));
    assert!(shortcut_str.contains("KeyT"));
}

#[test]
fn default_shortcut_round_trips_through_parser() {
    let parsed = parse_shortcut_str(&default_summon_shortcut()).expect("default should parse");
    assert_eq!(parsed, default_shortcut());
}

#[test]
fn parse_shortcut_with_modifier() {
    let result = parse_shortcut_str("Control+Shift+KeyL");
    assert!(result.is_ok());
}

#[test]
fn parse_invalid_shortcut() {
    let result = parse_shortcut_str("InvalidShortcut");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Invalid"));
}

#[test]
fn parse_empty_shortcut() {
    let result = parse_shortcut_str("");
    assert!(result.is_err());
}
