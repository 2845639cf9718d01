use std::path::PathBuf;

use binilla_config::WindowGeometry;
use binilla_keymap::DEFAULT_BINDINGS;
use binilla_node::Node;
use pretty_assertions::assert_eq;
use strum::IntoEnumIterator;

use super::*;
use crate::document::CloseChoice;
use crate::test_support::*;

struct Fixture {
	_dir: tempfile::TempDir,
	root: PathBuf,
	app: App,
	prompter: ScriptedPrompter,
}

impl Fixture {
	fn new() -> Self {
		let dir = tempfile::tempdir().unwrap();
		let root = fs::canonicalize(dir.path()).unwrap();
		let mut app = App::load(&root).unwrap();
		app.register_descriptor("tag", tag_descriptor());
		Self {
			_dir: dir,
			root,
			app,
			prompter: ScriptedPrompter::default(),
		}
	}

	fn tag_file(&self, name: &str) -> PathBuf {
		let path = self.root.join(name);
		write_tag(&path);
		path
	}

	fn count(&self, id: SessionId) -> Option<i128> {
		self.app.session(id)?.root().get(COUNT).and_then(Node::int)
	}
}

#[test]
fn recent_paths_dedupe_and_cap() {
	let mut recent = RecentPaths::new(3);
	for name in ["a", "b", "c", "a", "d"] {
		recent.push(name);
	}
	let paths: Vec<_> = recent.iter().map(|p| p.to_path_buf()).collect();
	assert_eq!(paths, [PathBuf::from("d"), PathBuf::from("a"), PathBuf::from("c")]);

	assert!(recent.remove(std::path::Path::new("a")));
	assert!(!recent.remove(std::path::Path::new("a")));
	recent.set_max(1);
	assert_eq!(recent.latest(), Some(std::path::Path::new("d")));
	assert_eq!(recent.len(), 1);

	let seeded = RecentPaths::from_paths([PathBuf::from("x"), PathBuf::from("y")], 5);
	assert_eq!(seeded.latest(), Some(std::path::Path::new("x")));
}

#[test]
fn action_names_match_default_bindings() {
	for (_, action) in DEFAULT_BINDINGS {
		assert!(action.parse::<Action>().is_ok(), "{action}");
	}
	let names: Vec<&str> = Action::iter().map(<&str>::from).collect();
	assert!(names.contains(&"save_as"));
}

#[test]
fn fresh_root_loads_defaults() {
	let fx = Fixture::new();
	assert_eq!(fx.app.session_count(), 0);
	assert!(fx.app.recent().is_empty());
	assert_eq!(fx.app.hotkeys().len(), DEFAULT_BINDINGS.len());
	assert!(matches!(
		Fixture::new().app.new_document("nope"),
		Err(SessionError::UnknownDescriptor(_))
	));
}

#[test]
fn opening_twice_focuses_the_first_session() {
	let mut fx = Fixture::new();
	let a = fx.tag_file("a.tag");
	let b = fx.tag_file("b.tag");
	let first = fx.app.open("tag", &a).unwrap();
	let second = fx.app.open("tag", &b).unwrap();
	assert_eq!(fx.app.active(), Some(second));

	assert!(matches!(fx.app.open("tag", &a), Err(SessionError::AlreadyOpen(_))));
	assert_eq!(fx.app.active(), Some(first));
	assert_eq!(fx.app.session_count(), 2);
	let order: Vec<_> = fx.app.sessions().map(|(id, _)| id).collect();
	assert_eq!(order, [first, second]);
	assert_eq!(fx.app.recent().latest(), Some(b.as_path()));
}

#[test]
fn missing_files_leave_the_recent_list() {
	let mut fx = Fixture::new();
	let path = fx.tag_file("gone.tag");
	let id = fx.app.open("tag", &path).unwrap();
	assert_eq!(fx.app.close(id, &mut fx.prompter).unwrap(), CloseDecision::Close);
	fs::remove_file(&path).unwrap();

	assert!(matches!(fx.app.open("tag", &path), Err(SessionError::Io { .. })));
	assert!(fx.app.recent().is_empty());
}

#[test]
fn hotkeys_depend_on_focus() {
	let mut fx = Fixture::new();
	assert_eq!(fx.app.dispatch("ctrl+z", &mut fx.prompter).unwrap(), Dispatch::Unbound);
	assert_eq!(fx.app.dispatch("ctrl+o", &mut fx.prompter).unwrap(), Dispatch::Host(Action::Open));
	assert_eq!(fx.app.dispatch("ctrl+alt+s", &mut fx.prompter).unwrap(), Dispatch::Done(Action::SaveAll));

	let path = fx.tag_file("a.tag");
	let id = fx.app.open("tag", &path).unwrap();
	type_into(fx.app.session_mut(id).unwrap(), &mut fx.prompter, &[COUNT], "25").unwrap();
	assert_eq!(fx.app.dispatch("Ctrl+Z", &mut fx.prompter).unwrap(), Dispatch::Done(Action::Undo));
	assert_eq!(fx.count(id), Some(10));
	assert_eq!(fx.app.dispatch("ctrl+shift+z", &mut fx.prompter).unwrap(), Dispatch::Done(Action::Redo));
	assert_eq!(fx.count(id), Some(25));

	assert_eq!(fx.app.dispatch("ctrl+s", &mut fx.prompter).unwrap(), Dispatch::Done(Action::Save));
	fx.app.session_mut(id).unwrap().wait_for_save().unwrap().unwrap();
	assert!(!fx.app.session(id).unwrap().is_dirty());
}

#[test]
fn untitled_save_goes_to_the_host() {
	let mut fx = Fixture::new();
	let id = fx.app.new_document("tag").unwrap();
	assert_eq!(fx.app.dispatch("ctrl+s", &mut fx.prompter).unwrap(), Dispatch::Host(Action::Save));

	let path = fx.root.join("new.tag");
	fx.app.save_as(id, &path, &mut fx.prompter).unwrap();
	let polled = loop {
		let mut done = fx.app.poll_saves();
		if let Some(outcome) = done.pop() {
			break outcome;
		}
		std::thread::sleep(crate::document::POLL_INTERVAL);
	};
	assert_eq!(polled.0, id);
	assert_eq!(polled.1.unwrap().written, path);
	assert_eq!(fx.app.recent().latest(), Some(path.as_path()));
}

#[test]
fn rebinding_replaces_the_old_combo() {
	let mut fx = Fixture::new();
	let path = fx.tag_file("a.tag");
	fx.app.open("tag", &path).unwrap();

	fx.app.rebind(Action::Undo, "ctrl+u").unwrap();
	assert_eq!(fx.app.resolve_hotkey("ctrl+z"), None);
	assert_eq!(fx.app.resolve_hotkey("ctrl+u"), Some(Action::Undo));
	assert!(matches!(fx.app.rebind(Action::Undo, "ctrl+"), Err(SessionError::Hotkey(_))));
}

#[test]
fn closing_moves_focus_to_the_last_session() {
	let mut fx = Fixture::new();
	let a = fx.app.open("tag", fx.tag_file("a.tag")).unwrap();
	let b = fx.app.open("tag", fx.tag_file("b.tag")).unwrap();
	let c = fx.app.open("tag", fx.tag_file("c.tag")).unwrap();
	fx.app.set_active(b);

	assert_eq!(fx.app.dispatch("ctrl+w", &mut fx.prompter).unwrap(), Dispatch::Done(Action::Close));
	assert_eq!(fx.app.active(), Some(c));
	let order: Vec<_> = fx.app.sessions().map(|(id, _)| id).collect();
	assert_eq!(order, [a, c]);
}

#[test]
fn shutdown_then_restore() {
	let mut fx = Fixture::new();
	let path = fx.tag_file("a.tag");
	let id = fx.app.open("tag", &path).unwrap();
	let window = WindowGeometry {
		x: 10,
		y: 20,
		width: 800,
		height: 600,
	};
	fx.app.session_mut(id).unwrap().set_window(window, false);
	assert!(fx.app.shutdown(&mut fx.prompter).unwrap());
	assert_eq!(fx.app.session_count(), 0);

	let mut app = App::load(&fx.root).unwrap();
	app.register_descriptor("tag", tag_descriptor());
	assert_eq!(app.recent().latest(), Some(path.as_path()));
	assert!(app.restore_sessions().is_empty());
	let (_, doc) = app.sessions().next().unwrap();
	assert_eq!(doc.path(), Some(path.as_path()));
	assert_eq!(doc.window(), (window, false));
}

#[test]
fn restore_reports_unknown_descriptors() {
	let mut fx = Fixture::new();
	let path = fx.tag_file("a.tag");
	fx.app.open("tag", &path).unwrap();
	fx.app.shutdown(&mut fx.prompter).unwrap();

	let mut app = App::load(&fx.root).unwrap();
	let failed = app.restore_sessions();
	assert_eq!(failed.len(), 1);
	assert!(matches!(failed[0].1, SessionError::UnknownDescriptor(_)));
	assert_eq!(app.session_count(), 0);
}

#[test]
fn cancelled_close_stops_shutdown() {
	let mut fx = Fixture::new();
	let id = fx.app.open("tag", fx.tag_file("a.tag")).unwrap();
	type_into(fx.app.session_mut(id).unwrap(), &mut fx.prompter, &[COUNT], "25").unwrap();

	assert!(!fx.app.shutdown(&mut fx.prompter).unwrap());
	assert_eq!(fx.app.session_count(), 1);
	let (config, _) = load_config(&fx.root.join(CONFIG_FILE)).unwrap();
	assert!(config.open_documents.is_empty());

	fx.prompter.close = CloseChoice::Discard;
	assert!(fx.app.shutdown(&mut fx.prompter).unwrap());
	let (config, _) = load_config(&fx.root.join(CONFIG_FILE)).unwrap();
	assert_eq!(config.open_documents.len(), 1);
}

#[test]
fn interrupted_shutdown_remembers_closed_sessions() {
	let mut fx = Fixture::new();
	let a = fx.tag_file("a.tag");
	let b = fx.tag_file("b.tag");
	fx.app.open("tag", &a).unwrap();
	let second = fx.app.open("tag", &b).unwrap();
	type_into(fx.app.session_mut(second).unwrap(), &mut fx.prompter, &[COUNT], "25").unwrap();

	assert!(!fx.app.shutdown(&mut fx.prompter).unwrap());
	assert_eq!(fx.app.session_count(), 1);
	let (config, _) = load_config(&fx.root.join(CONFIG_FILE)).unwrap();
	let paths: Vec<_> = config.open_documents.iter().map(|e| e.path.clone()).collect();
	assert_eq!(paths, [a.clone()]);

	fx.prompter.close = CloseChoice::Discard;
	assert!(fx.app.shutdown(&mut fx.prompter).unwrap());
	let mut app = App::load(&fx.root).unwrap();
	app.register_descriptor("tag", tag_descriptor());
	assert!(app.restore_sessions().is_empty());
	let restored: Vec<_> = app.sessions().filter_map(|(_, doc)| doc.path().map(PathBuf::from)).collect();
	assert_eq!(restored, [a, b]);
}

#[test]
fn save_as_refuses_a_path_open_elsewhere() {
	let mut fx = Fixture::new();
	let a = fx.tag_file("a.tag");
	let opened = fx.app.open("tag", &a).unwrap();
	let fresh = fx.app.new_document("tag").unwrap();
	fs::create_dir(fx.root.join("sub")).unwrap();

	let aliased = fx.root.join("sub").join("..").join("a.tag");
	assert!(matches!(
		fx.app.save_as(fresh, &aliased, &mut fx.prompter),
		Err(SessionError::AlreadyOpen(path)) if path == a
	));
	assert_eq!(fx.app.session(fresh).unwrap().path(), None);
	assert!(!fx.app.session(fresh).unwrap().is_saving());

	fx.app.save_as(opened, &aliased, &mut fx.prompter).unwrap();
	assert_eq!(fx.app.session_mut(opened).unwrap().wait_for_save().unwrap().unwrap().written, a);
	assert_eq!(fx.app.session(opened).unwrap().path(), Some(a.as_path()));
}

#[test]
fn relative_paths_are_stored_under_the_root() {
	let mut fx = Fixture::new();
	let settings = EditorSettings {
		sync_offsets_relative: true,
		..EditorSettings::default()
	};
	fx.app.set_settings(settings);
	fx.app.open("tag", fx.tag_file("a.tag")).unwrap();
	fx.app.shutdown(&mut fx.prompter).unwrap();

	let (config, _) = load_config(&fx.root.join(CONFIG_FILE)).unwrap();
	assert_eq!(config.recent_paths, [PathBuf::from("a.tag")]);
	assert_eq!(config.open_documents[0].path, PathBuf::from("a.tag"));
}

#[test]
fn settings_reach_open_sessions() {
	let mut fx = Fixture::new();
	let id = fx.app.open("tag", fx.tag_file("a.tag")).unwrap();
	let settings = EditorSettings {
		max_undos: 7,
		..EditorSettings::default()
	};
	fx.app.set_settings(settings);
	assert_eq!(fx.app.session(id).unwrap().history().max_undos(), 7);
	assert_eq!(fx.app.config().settings.max_undos, 7);
}
