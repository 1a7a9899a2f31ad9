use serde::{Deserialize, Serialize};

/// Represents a VAST document (Video Ad Serving Template)
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Vast {
    /// The VAST version (e.g., "2.0", "3.0", "4.0", etc.)
    pub version: String,

    /// The Ad elements within the VAST document
    pub ads: Vec<Ad>,

    /// Document-level error URL, sent when no ad could be served
    pub error: Option<String>,
}

/// Represents an Ad within a VAST document
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Ad {
    pub id: Option<String>,

    /// The ad sequence number (for ad pods)
    pub sequence: Option<u32>,

    /// The conditional ad flag (VAST 4.0+)
    pub conditional_ad: Option<bool>,

    pub inline: Option<InLine>,

    pub wrapper: Option<Wrapper>,
}

/// An InLine ad, which contains all the media files and tracking information
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct InLine {
    pub ad_system: AdSystem,
    pub ad_title: String,
    pub impressions: Vec<Impression>,
    pub description: Option<String>,
    pub advertiser: Option<String>,
    pub error: Option<String>,
    pub creatives: Vec<Creative>,
}

/// A Wrapper ad, which references another VAST document
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Wrapper {
    pub ad_system: AdSystem,

    /// The URL of the next VAST document
    pub vast_ad_tag_uri: String,

    pub impressions: Vec<Impression>,
    pub error: Option<String>,

    /// Creatives whose tracking is merged into the InLine ad when stitching
    pub creatives: Vec<Creative>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct AdSystem {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Impression {
    pub id: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Creative {
    pub id: Option<String>,
    pub sequence: Option<u32>,
    pub ad_id: Option<String>,
    pub linear: Option<Linear>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Linear {
    /// Duration as written in the tag, `HH:MM:SS` or `HH:MM:SS.mmm`
    pub duration: Option<String>,
    pub media_files: Vec<MediaFile>,
    pub video_clicks: Option<VideoClicks>,
    pub tracking_events: Vec<TrackingEvent>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct MediaFile {
    pub url: String,
    pub mime_type: String,
    pub bitrate: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,

    /// progressive or streaming
    pub delivery: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct VideoClicks {
    pub click_through: Option<String>,
    pub click_tracking: Vec<String>,
    pub custom_click: Vec<String>,
}

/// A tracking event (e.g., "start", "firstQuartile", "midpoint", "complete")
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct TrackingEvent {
    pub event: String,
    pub url: String,
}
