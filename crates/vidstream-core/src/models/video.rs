use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of listing the video catalog.
///
/// A failed listing is represented as `success: false` with no videos rather
/// than an error, so browsing degrades to an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoListing {
    pub success: bool,
    pub videos: Vec<String>,
}

impl VideoListing {
    pub fn ok(videos: Vec<String>) -> Self {
        Self {
            success: true,
            videos,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            videos: Vec::new(),
        }
    }
}

/// Playback manifest description returned by the streaming service.
///
/// `resolutions` maps a quality key (e.g. "480p") to its manifest URLs; the
/// first URL of each list is the playlist to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoManifest {
    #[serde(rename = "videoID", default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub resolutions: BTreeMap<String, Vec<String>>,
}

impl VideoManifest {
    pub fn first_url(&self, quality: &str) -> Option<&str> {
        self.resolutions
            .get(quality)
            .and_then(|urls| urls.first())
            .map(String::as_str)
    }

    pub fn qualities(&self) -> Vec<&str> {
        self.resolutions.keys().map(String::as_str).collect()
    }
}

/// Manifest URL selected for playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSource {
    pub video_id: String,
    pub quality: String,
    pub manifest_url: String,
}

/// Public thumbnail location for a video. No existence check is made.
pub fn thumbnail_url(bucket: &str, region: &str, video_id: &str) -> String {
    format!(
        "https://{}.s3.{}.amazonaws.com/thumbnails/{}.jpg",
        bucket, region, video_id
    )
}

/// Video id of an uploaded file: its name without the last extension.
pub fn video_id_from_file_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(dot) => &file_name[..dot],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_url_template() {
        assert_eq!(
            thumbnail_url("video-upload-demo", "sa-east-1", "intro"),
            "https://video-upload-demo.s3.sa-east-1.amazonaws.com/thumbnails/intro.jpg"
        );
    }

    #[test]
    fn video_id_strips_last_extension() {
        assert_eq!(video_id_from_file_name("intro.mp4"), "intro");
        assert_eq!(video_id_from_file_name("talk.final.mov"), "talk.final");
        assert_eq!(video_id_from_file_name("noext"), "noext");
        assert_eq!(video_id_from_file_name(".hidden"), ".hidden");
    }

    #[test]
    fn manifest_decodes_service_shape() {
        let body = r#"{
            "videoID": "intro",
            "resolutions": {
                "480p": ["https://cdn/intro/480p/video.m3u8", "https://cdn/intro/480p/seg0.ts"],
                "720p": ["https://cdn/intro/720p/video.m3u8"]
            }
        }"#;
        let manifest: VideoManifest = serde_json::from_str(body).unwrap();
        assert_eq!(manifest.video_id.as_deref(), Some("intro"));
        assert_eq!(
            manifest.first_url("480p"),
            Some("https://cdn/intro/480p/video.m3u8")
        );
        assert_eq!(manifest.first_url("1080p"), None);
        assert_eq!(manifest.qualities(), vec!["480p", "720p"]);
    }

    #[test]
    fn empty_quality_list_has_no_url() {
        let manifest: VideoManifest =
            serde_json::from_str(r#"{"resolutions": {"480p": []}}"#).unwrap();
        assert_eq!(manifest.first_url("480p"), None);
    }
}
