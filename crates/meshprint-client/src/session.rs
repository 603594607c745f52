//! Request-scoped session context.
//!
//! A [`Session`] owns the current generation task's poll handle and the
//! finished upload record for one user interaction. Starting a new
//! generation tears down the previous poller, and dropping the session
//! cancels any loop still running. Sessions are never shared.

use meshprint_core::{GenerationTask, PartFile};

use crate::poller::{PollError, PollHandle};

/// Owner of one interaction's task and upload record.
#[derive(Default)]
pub struct Session {
    poll: Option<PollHandle>,
    upload: Option<PartFile>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a polling loop, cancelling any previous one.
    pub fn start_polling(&mut self, handle: PollHandle) {
        if let Some(previous) = self.poll.take() {
            previous.cancel();
        }
        self.poll = Some(handle);
    }

    /// The most recent task snapshot from the active poller, if any.
    pub fn latest_task(&self) -> Option<GenerationTask> {
        self.poll.as_ref().and_then(|p| p.latest())
    }

    /// The active poll handle, if any.
    pub fn poll_handle(&self) -> Option<&PollHandle> {
        self.poll.as_ref()
    }

    /// Wait for the active poller to finish, releasing it from the session.
    /// Returns `None` when no poller is active.
    pub async fn wait(&mut self) -> Option<Result<GenerationTask, PollError>> {
        match self.poll.take() {
            Some(handle) => Some(handle.join().await),
            None => None,
        }
    }

    /// Stop the active poller, if any.
    pub fn stop_polling(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.cancel();
        }
    }

    /// Record the finished upload for this interaction.
    pub fn record_upload(&mut self, record: PartFile) {
        self.upload = Some(record);
    }

    /// The finished upload record, if any.
    pub fn upload(&self) -> Option<&PartFile> {
        self.upload.as_ref()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
