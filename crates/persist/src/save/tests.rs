use std::fs;
use std::sync::Arc;
use std::time::Duration;

use binilla_schema::{Descriptor, SizeSpec, StrEncoding, Value};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;
use crate::backup::DEFAULT_BACKUP_DIR;

fn accept(_: &[u8]) -> Result<()> {
	Ok(())
}

fn record() -> Arc<Descriptor> {
	Arc::new(Descriptor::structure(
		"record",
		vec![
			Descriptor::u16("id"),
			Descriptor::string("tag", StrEncoding::Ascii, SizeSpec::Fixed(4)),
		],
	))
}

#[test]
fn temp_path_appends_suffix() {
	assert_eq!(temp_path(Path::new("/t/x.dat")), PathBuf::from("/t/x.dat.temp"));
	assert_eq!(SavePlan::new("/t/x.dat").temp, PathBuf::from("/t/x.dat.temp"));
}

#[test]
fn first_save_creates_target() {
	let dir = TempDir::new().unwrap();
	let plan = SavePlan::new(dir.path().join("x.dat")).with_backup(BackupPolicy::default());

	let report = save_bytes(&plan, b"one", accept).unwrap();
	assert_eq!(report.written, plan.target);
	assert_eq!(report.backup, None);
	assert_eq!(fs::read(&plan.target).unwrap(), b"one");
	assert!(!plan.temp.exists());
}

#[test]
fn repeated_saves_rotate_backups() {
	let dir = TempDir::new().unwrap();
	let target = dir.path().join("x.dat");
	fs::write(&target, b"v0").unwrap();
	let policy = BackupPolicy::new(3, Duration::ZERO);
	let plan = SavePlan::new(&target).with_backup(policy.clone());

	for (i, payload) in [b"v1", b"v2", b"v3"].into_iter().enumerate() {
		let report = save_bytes(&plan, payload, accept).unwrap();
		assert!(report.backup.is_some());
		assert!(report.evicted_backups.is_empty(), "save {i}");
	}
	let backups = policy.backups(&target).unwrap();
	assert_eq!(backups.len(), 3);
	assert_eq!(fs::read(&backups[0].1).unwrap(), b"v0");

	let report = save_bytes(&plan, b"v4", accept).unwrap();
	assert_eq!(report.evicted_backups, [backups[0].1.clone()]);
	let backups = policy.backups(&target).unwrap();
	assert_eq!(backups.len(), 3);
	assert_eq!(fs::read(&backups[0].1).unwrap(), b"v1");
	assert_eq!(fs::read(&target).unwrap(), b"v4");
}

#[test]
fn failed_integrity_test_keeps_target_and_temp() {
	let dir = TempDir::new().unwrap();
	let target = dir.path().join("x.dat");
	fs::write(&target, b"old").unwrap();
	let plan = SavePlan::new(&target)
		.with_backup(BackupPolicy::default())
		.with_integrity_test(true);

	let err = save_bytes(&plan, b"new", |written| {
		assert_eq!(written, b"new");
		Err(PersistError::IntegrityMismatch {
			temp: plan.temp.clone(),
			detail: "differs".to_string(),
		})
	})
	.unwrap_err();

	assert!(matches!(err, PersistError::IntegrityMismatch { .. }));
	assert_eq!(fs::read(&target).unwrap(), b"old");
	assert_eq!(fs::read(&plan.temp).unwrap(), b"new");
	assert!(!dir.path().join(DEFAULT_BACKUP_DIR).exists());
}

#[test]
fn write_as_temp_leaves_target_alone() {
	let dir = TempDir::new().unwrap();
	let target = dir.path().join("x.dat");
	fs::write(&target, b"old").unwrap();
	let plan = SavePlan::new(&target)
		.with_backup(BackupPolicy::default())
		.with_write_as_temp(true);

	let report = save_bytes(&plan, b"new", accept).unwrap();
	assert_eq!(report.written, plan.temp);
	assert_eq!(fs::read(&target).unwrap(), b"old");
	assert_eq!(fs::read(&plan.temp).unwrap(), b"new");
	assert_eq!(report.backup, None);
}

#[test]
fn save_node_checks_round_trip() {
	let dir = TempDir::new().unwrap();
	let desc = record();
	let mut root = Node::default_tree(&desc);
	root.get_mut("id").unwrap().set_value(Value::Int(7)).unwrap();
	root.get_mut("tag").unwrap().set_value(Value::from("ab")).unwrap();

	let plan = SavePlan::new(dir.path().join("r.bin")).with_integrity_test(true);
	save_node(&plan, &root).unwrap();
	assert_eq!(fs::read(&plan.target).unwrap(), [7, 0, b'a', b'b', 0, 0]);

	// An embedded NUL does not survive the re-parse.
	root.get_mut("tag").unwrap().set_value(Value::from("a\0b")).unwrap();
	let err = save_node(&plan, &root).unwrap_err();
	assert!(matches!(&err, PersistError::IntegrityMismatch { detail, .. } if detail.contains("/1")), "{err}");
	assert_eq!(fs::read(&plan.target).unwrap(), [7, 0, b'a', b'b', 0, 0]);
	assert!(plan.temp.exists());
}

#[test]
fn preflight_reports_target_state() {
	let dir = TempDir::new().unwrap();
	let target = dir.path().join("x.dat");
	let plan = SavePlan::new(&target).with_backup(BackupPolicy::default());

	assert_eq!(
		save_preflight(&plan).unwrap(),
		Preflight {
			exists: false,
			writable: true,
			backup_needed: false,
		}
	);

	fs::write(&target, b"old").unwrap();
	assert_eq!(
		save_preflight(&plan).unwrap(),
		Preflight {
			exists: true,
			writable: true,
			backup_needed: true,
		}
	);
	assert!(!save_preflight(&SavePlan::new(&target)).unwrap().backup_needed);
}
