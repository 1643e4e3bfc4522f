//! Views of a Stored File: the content artifact plus its sidecars under one id.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    /// Generated id; the only key for every later operation.
    pub id: String,
}

/// Content and metadata of a stored file, as returned by a download.
#[derive(Clone, Debug)]
pub struct DownloadedFile {
    /// Original upload filename, or the id when none was recorded.
    pub filename: String,
    pub content: Bytes,
    pub metadata: String,
}

/// Everything known about a stored file except its content.
#[derive(Clone, Debug)]
pub struct FileInfo {
    pub filename: String,
    pub metadata: String,

    /// Byte length of the content artifact.
    pub size_bytes: u64,

    /// Creation time of the content artifact as reported by the backend.
    pub created_at: DateTime<Utc>,
}

impl FileInfo {
    /// `created_at` as an ISO-8601 UTC timestamp, e.g. `2025-01-31T09:15:02.123456Z`.
    pub fn created_at_iso8601(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Backend-level facts about a single artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArtifactStat {
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn created_at_renders_as_utc_rfc3339() {
        let info = FileInfo {
            filename: "a.txt".into(),
            metadata: String::new(),
            size_bytes: 0,
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
        };

        let rendered = info.created_at_iso8601();
        assert_eq!(rendered, "2024-03-09T07:05:01.000000Z");
        assert_eq!(
            DateTime::parse_from_rfc3339(&rendered).unwrap(),
            info.created_at
        );
    }
}
