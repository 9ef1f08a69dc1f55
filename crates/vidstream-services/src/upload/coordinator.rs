use crate::upload::chunker::plan_chunks;
use crate::upload::progress::ProgressSink;
use crate::upload::source::UploadSource;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use vidstream_core::models::{Chunk, PartResult, UploadProgress, UploadReceipt, UploadTarget};
use vidstream_core::{Config, ErrorMetadata, LogLevel, UploadError, UploadValidator};
use vidstream_storage::keys::video_key;
use vidstream_storage::{MultipartStorage, StorageError};

/// Status line reported once an upload has been committed.
pub const SUCCESS_MESSAGE: &str = "Upload completed successfully!";

/// Uploads a file to storage as a multipart upload, one chunk at a time.
///
/// Parts are sent strictly in order and the upload is committed only after
/// every part has been acknowledged. A failure at any step ends the upload;
/// nothing is retried.
pub struct ChunkedUploadCoordinator {
    storage: Arc<dyn MultipartStorage>,
    validator: UploadValidator,
    chunk_size: u64,
    abort_on_failure: bool,
}

/// Why one part could not be sent.
#[derive(Debug, thiserror::Error)]
enum PartFailure {
    #[error("failed to read chunk: {0}")]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("storage returned an empty integrity tag")]
    EmptyTag,
}

/// An open multipart upload and the parts acknowledged so far.
struct UploadSession {
    target: UploadTarget,
    upload_id: String,
    parts: Vec<PartResult>,
}

impl ChunkedUploadCoordinator {
    pub fn new(
        storage: Arc<dyn MultipartStorage>,
        validator: UploadValidator,
        chunk_size: u64,
    ) -> Self {
        Self {
            storage,
            validator,
            chunk_size,
            abort_on_failure: true,
        }
    }

    pub fn from_config(storage: Arc<dyn MultipartStorage>, config: &Config) -> Self {
        Self::new(
            storage,
            UploadValidator::from_config(config),
            config.upload_chunk_size_bytes,
        )
        .with_abort_on_failure(config.upload_abort_on_failure)
    }

    /// Whether a failed upload is aborted on storage before the error is returned.
    pub fn with_abort_on_failure(mut self, abort_on_failure: bool) -> Self {
        self.abort_on_failure = abort_on_failure;
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Check a source against the upload rules without touching storage.
    pub fn validate(&self, source: &dyn UploadSource) -> Result<(), UploadError> {
        self.validator.validate_file_name(source.name())?;
        self.validator.validate(source.content_type(), source.size())?;
        Ok(())
    }

    /// Chunk plan for a source.
    pub fn chunk(&self, source: &dyn UploadSource) -> Result<Vec<Chunk>, UploadError> {
        plan_chunks(source.size(), self.chunk_size)
    }

    /// Upload `source`, reporting progress after each acknowledged part.
    #[tracing::instrument(
        skip_all,
        fields(
            file_name = %source.name(),
            size_bytes = source.size(),
            operation = "chunked_upload"
        )
    )]
    pub async fn upload(
        &self,
        source: &dyn UploadSource,
        progress: &dyn ProgressSink,
    ) -> Result<UploadReceipt, UploadError> {
        let result = self.run(source, progress).await;
        if let Err(ref error) = result {
            log_upload_error(error);
        }
        result
    }

    async fn run(
        &self,
        source: &dyn UploadSource,
        progress: &dyn ProgressSink,
    ) -> Result<UploadReceipt, UploadError> {
        self.validate(source)?;

        let chunks = self.chunk(source)?;
        if chunks.is_empty() {
            return Err(UploadError::NothingToUpload);
        }
        let total_parts = chunks.len() as u32;

        let target = UploadTarget::new(self.storage.bucket(), video_key(source.name()));
        let start = Instant::now();

        let upload_id = self
            .storage
            .create_multipart_upload(&target)
            .await
            .map_err(|e| UploadError::Initiation(e.to_string()))?;
        if upload_id.trim().is_empty() {
            return Err(UploadError::Initiation(
                "storage returned an empty upload id".to_string(),
            ));
        }

        tracing::info!(
            bucket = %target.bucket,
            key = %target.key,
            upload_id = %upload_id,
            total_parts,
            chunk_size = self.chunk_size,
            "Multipart upload started"
        );

        let mut session = UploadSession {
            target,
            upload_id,
            parts: Vec::with_capacity(chunks.len()),
        };

        for chunk in &chunks {
            if let Err(failure) = self.send_part(source, &mut session, chunk).await {
                let error = UploadError::PartUpload {
                    index: chunk.index,
                    reason: failure.to_string(),
                };
                return Err(self.abandon(&session, error).await);
            }

            progress.on_progress(&UploadProgress::after_part(
                session.parts.len() as u32,
                total_parts,
            ));
        }

        if let Err(e) = self
            .storage
            .complete_multipart_upload(&session.target, &session.upload_id, &session.parts)
            .await
        {
            let error = UploadError::Completion(e.to_string());
            return Err(self.abandon(&session, error).await);
        }

        tracing::info!(
            bucket = %session.target.bucket,
            key = %session.target.key,
            parts = total_parts,
            size_bytes = source.size(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Chunked upload completed"
        );

        let url = self.storage.object_url(&session.target.key);
        Ok(UploadReceipt {
            target: session.target,
            upload_id: session.upload_id,
            parts: total_parts,
            bytes: source.size(),
            url,
            message: SUCCESS_MESSAGE.to_string(),
            completed_at: Utc::now(),
        })
    }

    /// Read one chunk, send it and record the acknowledged part.
    async fn send_part(
        &self,
        source: &dyn UploadSource,
        session: &mut UploadSession,
        chunk: &Chunk,
    ) -> Result<(), PartFailure> {
        let body = source.read_chunk(chunk).await?;

        let integrity_tag = self
            .storage
            .upload_part(&session.target, &session.upload_id, chunk.index, body)
            .await?;

        if integrity_tag.is_empty() {
            return Err(PartFailure::EmptyTag);
        }

        tracing::debug!(
            key = %session.target.key,
            part_number = chunk.index,
            size_bytes = chunk.size,
            "Part acknowledged"
        );

        session.parts.push(PartResult {
            part_number: chunk.index,
            integrity_tag,
        });
        Ok(())
    }

    /// Best-effort abort of a failed upload. Returns the original error.
    async fn abandon(&self, session: &UploadSession, error: UploadError) -> UploadError {
        if !self.abort_on_failure {
            tracing::debug!(
                key = %session.target.key,
                upload_id = %session.upload_id,
                "Leaving failed multipart upload in place"
            );
            return error;
        }

        if let Err(abort_error) = self
            .storage
            .abort_multipart_upload(&session.target, &session.upload_id)
            .await
        {
            tracing::warn!(
                error = %abort_error,
                key = %session.target.key,
                upload_id = %session.upload_id,
                "Failed to abort multipart upload"
            );
        }
        error
    }
}

fn log_upload_error(error: &UploadError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code, "Upload rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code, "Upload failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code, "Upload failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::progress::NoOpProgress;
    use crate::upload::source::MemorySource;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;
    use vidstream_core::ValidationError;
    use vidstream_storage::{StorageBackend, StorageResult};

    const MIB: u64 = 1024 * 1024;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Create(String),
        Part(u32, usize),
        Complete(Vec<(u32, String)>),
        Abort(String),
        Progress(u8),
    }

    type EventLog = Arc<Mutex<Vec<Event>>>;

    #[derive(Default)]
    struct FakeStorage {
        events: EventLog,
        upload_id: Option<String>,
        fail_create: bool,
        fail_part: Option<u32>,
        empty_tag_part: Option<u32>,
        fail_complete: bool,
        fail_abort: bool,
    }

    impl FakeStorage {
        fn new(events: EventLog) -> Self {
            Self {
                events,
                upload_id: Some("upload-1".to_string()),
                ..Default::default()
            }
        }

        fn record(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl MultipartStorage for FakeStorage {
        async fn create_multipart_upload(&self, target: &UploadTarget) -> StorageResult<String> {
            self.record(Event::Create(target.key.clone()));
            if self.fail_create {
                return Err(StorageError::UploadFailed("access denied".to_string()));
            }
            Ok(self.upload_id.clone().unwrap_or_default())
        }

        async fn upload_part(
            &self,
            _target: &UploadTarget,
            _upload_id: &str,
            part_number: u32,
            body: Bytes,
        ) -> StorageResult<String> {
            self.record(Event::Part(part_number, body.len()));
            if self.fail_part == Some(part_number) {
                return Err(StorageError::UploadFailed("connection reset".to_string()));
            }
            if self.empty_tag_part == Some(part_number) {
                return Ok(String::new());
            }
            Ok(format!("etag-{}", part_number))
        }

        async fn complete_multipart_upload(
            &self,
            _target: &UploadTarget,
            _upload_id: &str,
            parts: &[PartResult],
        ) -> StorageResult<()> {
            self.record(Event::Complete(
                parts
                    .iter()
                    .map(|p| (p.part_number, p.integrity_tag.clone()))
                    .collect(),
            ));
            if self.fail_complete {
                return Err(StorageError::InvalidParts("entity too small".to_string()));
            }
            Ok(())
        }

        async fn abort_multipart_upload(
            &self,
            _target: &UploadTarget,
            upload_id: &str,
        ) -> StorageResult<()> {
            self.record(Event::Abort(upload_id.to_string()));
            if self.fail_abort {
                return Err(StorageError::BackendError("abort failed".to_string()));
            }
            Ok(())
        }

        fn bucket(&self) -> &str {
            "video-upload-demo"
        }

        fn object_url(&self, key: &str) -> String {
            format!("https://video-upload-demo.s3.sa-east-1.amazonaws.com/{}", key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::S3
        }
    }

    fn validator() -> UploadValidator {
        UploadValidator::new(
            500 * MIB,
            vec![
                "video/mp4".to_string(),
                "video/avi".to_string(),
                "video/mov".to_string(),
            ],
        )
    }

    fn coordinator(storage: FakeStorage) -> ChunkedUploadCoordinator {
        ChunkedUploadCoordinator::new(Arc::new(storage), validator(), 5 * MIB)
    }

    fn video(name: &str, size: u64) -> MemorySource {
        MemorySource::new(name, "video/mp4", Bytes::from(vec![7u8; size as usize]))
    }

    fn progress_recorder(events: &EventLog) -> impl Fn(&UploadProgress) + Send + Sync {
        let events = events.clone();
        move |p: &UploadProgress| events.lock().unwrap().push(Event::Progress(p.percent))
    }

    fn snapshot(events: &EventLog) -> Vec<Event> {
        events.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn twelve_mib_file_uploads_in_three_parts() {
        let events = EventLog::default();
        let coordinator = coordinator(FakeStorage::new(events.clone()));
        let source = video("intro.mp4", 12 * MIB);

        let receipt = coordinator
            .upload(&source, &progress_recorder(&events))
            .await
            .unwrap();

        assert_eq!(
            snapshot(&events),
            vec![
                Event::Create("videos/intro.mp4".to_string()),
                Event::Part(1, (5 * MIB) as usize),
                Event::Progress(33),
                Event::Part(2, (5 * MIB) as usize),
                Event::Progress(67),
                Event::Part(3, (2 * MIB) as usize),
                Event::Progress(100),
                Event::Complete(vec![
                    (1, "etag-1".to_string()),
                    (2, "etag-2".to_string()),
                    (3, "etag-3".to_string()),
                ]),
            ]
        );

        assert_eq!(receipt.target.bucket, "video-upload-demo");
        assert_eq!(receipt.target.key, "videos/intro.mp4");
        assert_eq!(receipt.upload_id, "upload-1");
        assert_eq!(receipt.parts, 3);
        assert_eq!(receipt.bytes, 12 * MIB);
        assert_eq!(receipt.message, SUCCESS_MESSAGE);
        assert_eq!(
            receipt.url,
            "https://video-upload-demo.s3.sa-east-1.amazonaws.com/videos/intro.mp4"
        );
    }

    #[tokio::test]
    async fn small_file_is_a_single_part() {
        let events = EventLog::default();
        let coordinator = coordinator(FakeStorage::new(events.clone()));
        let source = video("clip.mp4", 1024);

        let receipt = coordinator
            .upload(&source, &progress_recorder(&events))
            .await
            .unwrap();

        assert_eq!(receipt.parts, 1);
        let events = snapshot(&events);
        assert_eq!(events[1], Event::Part(1, 1024));
        assert_eq!(events[2], Event::Progress(100));
    }

    #[tokio::test]
    async fn failed_part_aborts_and_never_completes() {
        let events = EventLog::default();
        let mut storage = FakeStorage::new(events.clone());
        storage.fail_part = Some(2);
        let coordinator = coordinator(storage);
        let source = video("intro.mp4", 12 * MIB);

        let error = coordinator
            .upload(&source, &progress_recorder(&events))
            .await
            .unwrap_err();

        match &error {
            UploadError::PartUpload { index, reason } => {
                assert_eq!(*index, 2);
                assert_eq!(reason, "Upload failed: connection reset");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(error.client_message(), "Failed to upload chunk 2.");

        let events = snapshot(&events);
        assert!(!events.iter().any(|e| matches!(e, Event::Complete(_))));
        assert!(!events.contains(&Event::Part(3, (2 * MIB) as usize)));
        assert_eq!(events.last(), Some(&Event::Abort("upload-1".to_string())));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::Progress(_)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn abort_can_be_disabled() {
        let events = EventLog::default();
        let mut storage = FakeStorage::new(events.clone());
        storage.fail_part = Some(1);
        let coordinator = coordinator(storage).with_abort_on_failure(false);

        let error = coordinator
            .upload(&video("intro.mp4", MIB), &NoOpProgress)
            .await
            .unwrap_err();

        assert!(matches!(error, UploadError::PartUpload { index: 1, .. }));
        assert!(!snapshot(&events)
            .iter()
            .any(|e| matches!(e, Event::Abort(_))));
    }

    #[tokio::test]
    async fn empty_integrity_tag_is_a_part_failure() {
        let events = EventLog::default();
        let mut storage = FakeStorage::new(events.clone());
        storage.empty_tag_part = Some(3);
        let coordinator = coordinator(storage);

        let error = coordinator
            .upload(&video("intro.mp4", 12 * MIB), &NoOpProgress)
            .await
            .unwrap_err();

        match &error {
            UploadError::PartUpload { index, reason } => {
                assert_eq!(*index, 3);
                assert_eq!(reason, "storage returned an empty integrity tag");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let events = snapshot(&events);
        assert!(!events.iter().any(|e| matches!(e, Event::Complete(_))));
        assert!(events.contains(&Event::Abort("upload-1".to_string())));
    }

    /// Source whose second chunk cannot be read
    struct UnreadableTail(MemorySource);

    #[async_trait]
    impl UploadSource for UnreadableTail {
        fn name(&self) -> &str {
            self.0.name()
        }

        fn content_type(&self) -> &str {
            self.0.content_type()
        }

        fn size(&self) -> u64 {
            self.0.size()
        }

        async fn read_chunk(&self, chunk: &Chunk) -> std::io::Result<Bytes> {
            if chunk.index == 2 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "file shrank",
                ));
            }
            self.0.read_chunk(chunk).await
        }
    }

    #[tokio::test]
    async fn unreadable_chunk_is_a_part_failure() {
        let events = EventLog::default();
        let coordinator = coordinator(FakeStorage::new(events.clone()));
        let source = UnreadableTail(video("intro.mp4", 6 * MIB));

        let error = coordinator
            .upload(&source, &NoOpProgress)
            .await
            .unwrap_err();

        match &error {
            UploadError::PartUpload { index, reason } => {
                assert_eq!(*index, 2);
                assert_eq!(reason, "failed to read chunk: file shrank");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let events = snapshot(&events);
        assert!(!events.iter().any(|e| matches!(e, Event::Part(2, _))));
        assert_eq!(events.last(), Some(&Event::Abort("upload-1".to_string())));
    }

    #[tokio::test]
    async fn empty_upload_id_stops_before_any_part() {
        let events = EventLog::default();
        let mut storage = FakeStorage::new(events.clone());
        storage.upload_id = None;
        let coordinator = coordinator(storage);

        let error = coordinator
            .upload(&video("intro.mp4", MIB), &NoOpProgress)
            .await
            .unwrap_err();

        assert!(matches!(error, UploadError::Initiation(_)));
        assert_eq!(
            snapshot(&events),
            vec![Event::Create("videos/intro.mp4".to_string())]
        );
    }

    #[tokio::test]
    async fn create_failure_is_an_initiation_error() {
        let events = EventLog::default();
        let mut storage = FakeStorage::new(events.clone());
        storage.fail_create = true;
        let coordinator = coordinator(storage);

        let error = coordinator
            .upload(&video("intro.mp4", MIB), &NoOpProgress)
            .await
            .unwrap_err();

        assert!(matches!(error, UploadError::Initiation(_)));
        assert_eq!(snapshot(&events).len(), 1);
    }

    #[tokio::test]
    async fn invalid_files_never_reach_storage() {
        let events = EventLog::default();
        let coordinator = coordinator(FakeStorage::new(events.clone()));

        let wrong_type = MemorySource::new("notes.txt", "text/plain", Bytes::from_static(b"hi"));
        let error = coordinator
            .upload(&wrong_type, &NoOpProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            UploadError::Validation(ValidationError::UnsupportedType { .. })
        ));

        let small_limit = ChunkedUploadCoordinator::new(
            Arc::new(FakeStorage::new(events.clone())),
            UploadValidator::new(MIB, vec!["video/mp4".to_string()]),
            5 * MIB,
        );
        let error = small_limit
            .upload(&video("huge.mp4", MIB + 1), &NoOpProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            UploadError::Validation(ValidationError::FileTooLarge { .. })
        ));

        let bad_name = video("../escape.mp4", 10);
        let error = coordinator
            .upload(&bad_name, &NoOpProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            UploadError::Validation(ValidationError::InvalidFileName(_))
        ));

        assert!(snapshot(&events).is_empty());
    }

    #[tokio::test]
    async fn empty_file_has_nothing_to_upload() {
        let events = EventLog::default();
        let coordinator = coordinator(FakeStorage::new(events.clone()));

        let error = coordinator
            .upload(&video("empty.mp4", 0), &NoOpProgress)
            .await
            .unwrap_err();

        assert!(matches!(error, UploadError::NothingToUpload));
        assert!(snapshot(&events).is_empty());
    }

    #[tokio::test]
    async fn completion_failure_aborts_the_upload() {
        let events = EventLog::default();
        let mut storage = FakeStorage::new(events.clone());
        storage.fail_complete = true;
        let coordinator = coordinator(storage);

        let error = coordinator
            .upload(&video("intro.mp4", 6 * MIB), &NoOpProgress)
            .await
            .unwrap_err();

        assert!(matches!(error, UploadError::Completion(_)));
        assert_eq!(
            snapshot(&events).last(),
            Some(&Event::Abort("upload-1".to_string()))
        );
    }

    #[tokio::test]
    async fn abort_failure_keeps_the_original_error() {
        let events = EventLog::default();
        let mut storage = FakeStorage::new(events.clone());
        storage.fail_part = Some(1);
        storage.fail_abort = true;
        let coordinator = coordinator(storage);

        let error = coordinator
            .upload(&video("intro.mp4", MIB), &NoOpProgress)
            .await
            .unwrap_err();

        assert!(matches!(error, UploadError::PartUpload { index: 1, .. }));
    }

    #[test]
    fn chunk_plan_uses_configured_size() {
        let coordinator = coordinator(FakeStorage::new(EventLog::default()));
        let chunks = coordinator.chunk(&video("intro.mp4", 11 * MIB)).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].size, MIB);
    }
}
