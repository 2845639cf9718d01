use pretty_assertions::assert_eq;

use super::*;

#[test]
fn defaults_are_normalized() {
	let table = HotkeyTable::with_defaults();
	assert_eq!(table.len(), DEFAULT_BINDINGS.len());
	let redo: Vec<String> = table.combos_for("redo").map(ToString::to_string).collect();
	assert_eq!(redo, ["ctrl+y", "ctrl+shift+z"]);
}

#[test]
fn bind_returns_displaced_action() {
	let mut table = HotkeyTable::new();
	assert_eq!(table.bind("Ctrl-S", "save"), Ok(None));
	assert_eq!(table.bind("ctrl+s", "save_all"), Ok(Some("save".to_string())));
	assert_eq!(table.len(), 1);
	assert!(table.bind("ctrl+", "save").is_err());
}

#[test]
fn rebind_unbinds_previous_combos() {
	let mut table = HotkeyTable::with_defaults();
	assert_eq!(table.rebind("redo", "ctrl+r"), Ok(None));
	let redo: Vec<String> = table.combos_for("redo").map(ToString::to_string).collect();
	assert_eq!(redo, ["ctrl+r"]);

	assert_eq!(table.rebind("undo", "ctrl+r"), Ok(Some("redo".to_string())));
	assert_eq!(table.combos_for("redo").count(), 0);
	assert_eq!(table.action(&parse("ctrl+z").unwrap()), None);

	let before = table.clone();
	assert!(table.rebind("undo", "ctrl+shift+ctrl+z").is_err());
	assert_eq!(table, before);
}

#[test]
fn unbind_removes_binding() {
	let mut table = HotkeyTable::with_defaults();
	assert_eq!(table.unbind("CTRL+Q"), Ok(Some("quit".to_string())));
	assert_eq!(table.unbind("ctrl+q"), Ok(None));
}

#[test]
fn resolve_checks_the_session_actions() {
	let table = HotkeyTable::with_defaults();
	let session = ["save", "undo"];
	assert_eq!(table.resolve("Ctrl-S", &session), Some("save"));
	assert_eq!(table.resolve("ctrl+z", &session), Some("undo"));
	assert_eq!(table.resolve("ctrl+y", &session), None);
	assert_eq!(table.resolve("ctrl+k", &session), None);
	assert_eq!(table.resolve("not a combo", &session), None);
}

#[test]
fn merge_overrides_defaults() {
	let mut table = HotkeyTable::with_defaults();
	let user = HotkeyTable::from_pairs([("ctrl+s", "save_all"), ("alt+x", "quit")]).unwrap();
	table.merge(&user);
	assert_eq!(table.action(&parse("ctrl+s").unwrap()), Some("save_all"));
	assert_eq!(table.action(&parse("alt+x").unwrap()), Some("quit"));
	assert_eq!(table.len(), DEFAULT_BINDINGS.len() + 1);

	let err = HotkeyTable::from_pairs([("ctrl+s", "save"), ("ctrl+", "x")]).unwrap_err();
	assert!(matches!(err, KeymapError::Combo { combo, .. } if combo == "ctrl+"));
}

#[test]
fn toml_exchange() {
	let table = HotkeyTable::from_toml(
		r#"
		"Shift-Ctrl-S" = "save_as"
		"f5" = "reload"
		"#,
	)
	.unwrap();
	assert_eq!(table.action(&parse("ctrl+shift+s").unwrap()), Some("save_as"));

	let text = table.to_toml().unwrap();
	assert!(text.contains(r#""ctrl+shift+s" = "save_as""#), "{text}");
	assert_eq!(HotkeyTable::from_toml(&text).unwrap(), table);

	assert!(matches!(
		HotkeyTable::from_toml(r#""ctrl+" = "save""#),
		Err(KeymapError::Decode(_))
	));
}
