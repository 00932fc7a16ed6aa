//! Artifact kinds derivable from a completed generation job.

use serde::{Deserialize, Serialize};

/// A downloadable artifact produced by a completed job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// The rendered video itself.
    Video,
    /// A single-frame preview image.
    Thumbnail,
    /// A tiled grid of frames for scrubbing previews.
    Spritesheet,
}

impl ArtifactKind {
    /// Every kind a completed job exposes.
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Video,
        ArtifactKind::Thumbnail,
        ArtifactKind::Spritesheet,
    ];

    /// String representation, also used as the provider-side variant name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video",
            ArtifactKind::Thumbnail => "thumbnail",
            ArtifactKind::Spritesheet => "spritesheet",
        }
    }

    /// Parse from a string. Returns `None` for unsupported kinds.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(ArtifactKind::Video),
            "thumbnail" => Some(ArtifactKind::Thumbnail),
            "spritesheet" => Some(ArtifactKind::Spritesheet),
            _ => None,
        }
    }

    /// MIME type served on download.
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video/mp4",
            ArtifactKind::Thumbnail => "image/jpeg",
            ArtifactKind::Spritesheet => "image/png",
        }
    }

    /// File extension used in download filenames.
    pub fn file_extension(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "mp4",
            ArtifactKind::Thumbnail => "jpg",
            ArtifactKind::Spritesheet => "png",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
