use vidstream_core::models::UploadProgress;

/// Receiver of upload progress updates.
///
/// Called once after each part is acknowledged by storage; implementations
/// keep only what they need, no history is implied.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: &UploadProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&UploadProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &UploadProgress) {
        self(progress)
    }
}

/// Sink that discards every update
pub struct NoOpProgress;

impl ProgressSink for NoOpProgress {
    fn on_progress(&self, _progress: &UploadProgress) {}
}
