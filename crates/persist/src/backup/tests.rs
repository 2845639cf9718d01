use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;

fn at(secs: i64) -> DateTime<Utc> {
	DateTime::from_timestamp(secs, 0).unwrap()
}

fn target_in(dir: &TempDir) -> PathBuf {
	let target = dir.path().join("x.dat");
	fs::write(&target, b"original").unwrap();
	target
}

fn names(backups: &[(u64, PathBuf)]) -> Vec<String> {
	backups
		.iter()
		.map(|(_, p)| p.file_name().unwrap().to_string_lossy().into_owned())
		.collect()
}

#[test]
fn rotation_keeps_max_count_newest() {
	let dir = TempDir::new().unwrap();
	let target = target_in(&dir);
	let policy = BackupPolicy::new(3, Duration::ZERO);
	let now = at(1_700_000_000);

	let mut created = Vec::new();
	for _ in 0..3 {
		let outcome = policy.back_up_at(&target, now).unwrap();
		assert!(outcome.evicted.is_empty());
		created.push(outcome.created.unwrap());
	}
	let backups = policy.backups(&target).unwrap();
	assert_eq!(backups.len(), 3);
	assert_eq!(
		names(&backups),
		["x.dat.1700000000000000", "x.dat.1700000000000001", "x.dat.1700000000000002"]
	);

	let outcome = policy.back_up_at(&target, now).unwrap();
	assert_eq!(outcome.evicted, [created[0].clone()]);
	assert_eq!(policy.backups(&target).unwrap().len(), 3);
	assert!(!created[0].exists());
}

#[test]
fn backups_land_beside_the_target_by_default() {
	let dir = TempDir::new().unwrap();
	let target = target_in(&dir);
	let policy = BackupPolicy::default();

	let created = policy.back_up(&target).unwrap().created.unwrap();
	assert_eq!(created.parent().unwrap(), dir.path().join(DEFAULT_BACKUP_DIR));
	assert_eq!(fs::read(&created).unwrap(), b"original");
}

#[test]
fn interval_suppresses_rapid_backups() {
	let dir = TempDir::new().unwrap();
	let target = target_in(&dir);
	let policy = BackupPolicy::new(5, Duration::from_secs(60)).with_dir(dir.path().join("bk"));
	let start = at(1_700_000_000);

	assert!(policy.back_up_at(&target, start).unwrap().created.is_some());
	let soon = start + TimeDelta::seconds(10);
	assert!(!policy.would_back_up(&target, soon).unwrap());
	assert_eq!(policy.back_up_at(&target, soon).unwrap(), BackupOutcome::default());

	let later = start + TimeDelta::seconds(61);
	assert!(policy.would_back_up(&target, later).unwrap());
	assert!(policy.back_up_at(&target, later).unwrap().created.is_some());
	assert_eq!(policy.backups(&target).unwrap().len(), 2);
}

#[test]
fn only_stamped_siblings_count_as_backups() {
	let dir = TempDir::new().unwrap();
	let target = target_in(&dir);
	let bk = dir.path().join("bk");
	fs::create_dir(&bk).unwrap();
	for name in ["x.dat.7", "x.dat.bak", "x.dat.12ab", "x.data.5", "y.dat.9", "x.dat."] {
		fs::write(bk.join(name), b"").unwrap();
	}

	let policy = BackupPolicy::new(2, Duration::ZERO).with_dir(&bk);
	assert_eq!(names(&policy.backups(&target).unwrap()), ["x.dat.7"]);
}

#[test]
fn disabled_policy_and_missing_target() {
	let dir = TempDir::new().unwrap();
	let target = target_in(&dir);
	let disabled = BackupPolicy::new(0, Duration::ZERO);
	assert!(!disabled.would_back_up(&target, Utc::now()).unwrap());
	assert_eq!(disabled.back_up(&target).unwrap(), BackupOutcome::default());
	assert!(!dir.path().join(DEFAULT_BACKUP_DIR).exists());

	let missing = Path::new("/nonexistent/binilla/x.dat");
	assert!(!BackupPolicy::default().would_back_up(missing, Utc::now()).unwrap());
}
