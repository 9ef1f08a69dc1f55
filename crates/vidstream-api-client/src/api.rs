//! Catalog and playback methods for the API client.
//!
//! Each service is exposed strictly (returning its error) and leniently: the
//! lenient variants log the failure for operators and degrade to an empty
//! listing or no playback source.

use crate::ApiClient;
use std::collections::BTreeMap;
use vidstream_core::models::{PlaybackSource, VideoListing, VideoManifest};
use vidstream_core::{CatalogError, ErrorMetadata, LogLevel, ManifestError};

impl ApiClient {
    /// `GET {catalog}/videos`: the ids of every available video.
    pub async fn try_list_videos(&self) -> Result<Vec<String>, CatalogError> {
        let url = format!("{}/videos", self.catalog_base_url());
        let videos: Vec<String> = self.get_json(&url).await?;
        tracing::debug!(url = %url, count = videos.len(), "Video catalog listed");
        Ok(videos)
    }

    /// List videos, reporting failure as `success: false` with no videos.
    pub async fn list_all_videos(&self) -> VideoListing {
        match self.try_list_videos().await {
            Ok(videos) => VideoListing::ok(videos),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    error_code = e.error_code(),
                    base_url = %self.catalog_base_url(),
                    "Failed to list videos"
                );
                VideoListing::failed()
            }
        }
    }

    pub fn manifest_url(&self, video_id: &str) -> String {
        format!(
            "{}/videos/{}",
            self.streaming_base_url(),
            urlencoding::encode(video_id)
        )
    }

    /// `GET {streaming}/videos/{video_id}`
    pub async fn fetch_manifest(&self, video_id: &str) -> Result<VideoManifest, ManifestError> {
        let url = self.manifest_url(video_id);
        let manifest: VideoManifest = self.get_json(&url).await?;
        tracing::debug!(
            video_id = %video_id,
            qualities = ?manifest.qualities(),
            "Playback manifest fetched"
        );
        Ok(manifest)
    }

    /// Every resolution of a video with its manifest URLs.
    pub async fn resolutions(
        &self,
        video_id: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, ManifestError> {
        Ok(self.fetch_manifest(video_id).await?.resolutions)
    }

    /// Pick the manifest URL to play: the first URL listed under `quality`,
    /// or under the default quality when none is given.
    pub async fn resolve_playback(
        &self,
        video_id: &str,
        quality: Option<&str>,
    ) -> Result<PlaybackSource, ManifestError> {
        let quality = quality.unwrap_or_else(|| self.default_quality());
        let manifest = self.fetch_manifest(video_id).await?;

        let manifest_url = manifest
            .first_url(quality)
            .ok_or_else(|| ManifestError::MissingQuality(quality.to_string()))?;

        Ok(PlaybackSource {
            video_id: video_id.to_string(),
            quality: quality.to_string(),
            manifest_url: manifest_url.to_string(),
        })
    }

    /// Like [`ApiClient::resolve_playback`], but a failure is logged and
    /// playback simply does not start.
    pub async fn playback_source(
        &self,
        video_id: &str,
        quality: Option<&str>,
    ) -> Option<PlaybackSource> {
        match self.resolve_playback(video_id, quality).await {
            Ok(source) => Some(source),
            Err(e) => {
                log_manifest_error(video_id, &e);
                None
            }
        }
    }
}

fn log_manifest_error(video_id: &str, error: &ManifestError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code, video_id, "Playback not started");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code, video_id, "Playback not started");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code, video_id, "Playback not started");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&server.url(), &server.url(), Duration::from_secs(5)).unwrap()
    }

    const MANIFEST: &str = r#"{
        "videoID": "intro",
        "resolutions": {
            "480p": ["https://cdn.example.com/intro/480p/video.m3u8"],
            "720p": ["https://cdn.example.com/intro/720p/video.m3u8", "https://cdn.example.com/intro/720p/alt.m3u8"]
        }
    }"#;

    #[tokio::test]
    async fn lists_videos() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/videos")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["intro","trailer"]"#)
            .create_async()
            .await;

        let listing = client(&server).list_all_videos().await;

        mock.assert_async().await;
        assert_eq!(
            listing,
            VideoListing::ok(vec!["intro".to_string(), "trailer".to_string()])
        );
    }

    #[tokio::test]
    async fn server_error_yields_failed_listing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client(&server);
        assert_eq!(client.list_all_videos().await, VideoListing::failed());
        assert!(matches!(
            client.try_list_videos().await,
            Err(CatalogError::Status(500))
        ));
    }

    #[tokio::test]
    async fn not_found_is_a_failed_listing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos")
            .with_status(404)
            .create_async()
            .await;

        let listing = client(&server).list_all_videos().await;
        assert!(!listing.success);
        assert!(listing.videos.is_empty());
    }

    #[tokio::test]
    async fn malformed_catalog_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos")
            .with_status(200)
            .with_body(r#"{"videos": 3}"#)
            .create_async()
            .await;

        let result = client(&server).try_list_videos().await;
        assert!(matches!(result, Err(CatalogError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_catalog_is_a_failed_listing() {
        let client =
            ApiClient::new("http://127.0.0.1:9", "http://127.0.0.1:9", Duration::from_secs(2))
                .unwrap();

        assert!(matches!(
            client.try_list_videos().await,
            Err(CatalogError::Transport(_))
        ));
        assert_eq!(client.list_all_videos().await, VideoListing::failed());
    }

    #[tokio::test]
    async fn resolves_default_quality() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/videos/intro")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(MANIFEST)
            .create_async()
            .await;

        let source = client(&server)
            .resolve_playback("intro", None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(source.quality, "480p");
        assert_eq!(
            source.manifest_url,
            "https://cdn.example.com/intro/480p/video.m3u8"
        );
    }

    #[tokio::test]
    async fn resolves_requested_quality_to_first_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos/intro")
            .with_status(200)
            .with_body(MANIFEST)
            .create_async()
            .await;

        let source = client(&server)
            .resolve_playback("intro", Some("720p"))
            .await
            .unwrap();
        assert_eq!(
            source.manifest_url,
            "https://cdn.example.com/intro/720p/video.m3u8"
        );
    }

    #[tokio::test]
    async fn missing_default_quality_does_not_start_playback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos/intro")
            .with_status(200)
            .with_body(r#"{"resolutions": {"1080p": ["https://cdn.example.com/intro/1080p/video.m3u8"]}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client(&server);
        assert!(matches!(
            client.resolve_playback("intro", None).await,
            Err(ManifestError::MissingQuality(q)) if q == "480p"
        ));
        assert!(client.playback_source("intro", None).await.is_none());
    }

    #[tokio::test]
    async fn empty_url_list_counts_as_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos/intro")
            .with_status(200)
            .with_body(r#"{"resolutions": {"480p": []}}"#)
            .create_async()
            .await;

        let result = client(&server).resolve_playback("intro", None).await;
        assert!(matches!(result, Err(ManifestError::MissingQuality(_))));
    }

    #[tokio::test]
    async fn manifest_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos/unknown")
            .with_status(404)
            .create_async()
            .await;

        let client = client(&server);
        assert!(matches!(
            client.fetch_manifest("unknown").await,
            Err(ManifestError::Status(404))
        ));
        assert!(client.playback_source("unknown", None).await.is_none());
    }

    #[tokio::test]
    async fn lists_resolutions() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos/intro")
            .with_status(200)
            .with_body(MANIFEST)
            .create_async()
            .await;

        let resolutions = client(&server).resolutions("intro").await.unwrap();
        assert_eq!(
            resolutions.keys().collect::<Vec<_>>(),
            vec!["480p", "720p"]
        );
        assert_eq!(resolutions["720p"].len(), 2);
    }

    #[test]
    fn video_ids_are_escaped_in_manifest_urls() {
        let client =
            ApiClient::new("http://a", "http://stream.local", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.manifest_url("my video"),
            "http://stream.local/videos/my%20video"
        );
    }
}
