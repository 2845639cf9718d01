//! Background serialize worker.
//!
//! A save hands the worker an owned snapshot of the tree and a save plan.
//! The worker writes the temp file, runs the integrity test, rotates backups
//! and renames, then reports once over a channel. The document polls that
//! channel from its own thread and refuses edits until the report arrives.
//!
//! The caller's tracing span is carried into the worker so its logs nest
//! under the save that started it.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use binilla_node::Node;
use binilla_persist::{SavePlan, SaveReport, save_node};
use tracing::{debug, error};

use crate::error::{Result, SessionError};

const THREAD_NAME: &str = "binilla-save";

/// Handle to one in-flight save.
#[derive(Debug)]
pub struct SaveWorker {
	target: PathBuf,
	rx: Receiver<binilla_persist::Result<SaveReport>>,
	handle: Option<JoinHandle<()>>,
}

impl SaveWorker {
	/// Starts writing `snapshot` according to `plan`.
	pub fn spawn(plan: SavePlan, snapshot: Node) -> Result<Self> {
		let (tx, rx) = mpsc::channel();
		let target = plan.target.clone();
		let span = tracing::Span::current();

		let handle = thread::Builder::new()
			.name(THREAD_NAME.into())
			.spawn(move || {
				let _guard = span.enter();
				let result = std::panic::catch_unwind(AssertUnwindSafe(|| save_node(&plan, &snapshot)));
				match result {
					Ok(report) => {
						// The document may have been dropped; nobody is left to tell.
						let _ = tx.send(report);
					}
					Err(_) => error!(target = %plan.target.display(), "save worker panicked"),
				}
			})
			.map_err(SessionError::Spawn)?;

		debug!(target = %target.display(), "save worker started");
		Ok(Self {
			target,
			rx,
			handle: Some(handle),
		})
	}

	pub fn target(&self) -> &Path {
		&self.target
	}

	/// Returns the outcome once the worker has finished, `None` while it runs.
	pub fn poll(&mut self) -> Option<Result<SaveReport>> {
		let outcome = match self.rx.try_recv() {
			Ok(report) => report.map_err(SessionError::from),
			Err(TryRecvError::Empty) => return None,
			Err(TryRecvError::Disconnected) => Err(SessionError::WorkerLost(self.target.clone())),
		};
		if let Some(handle) = self.handle.take() {
			let _ = handle.join();
		}
		Some(outcome)
	}
}
