//! Codec profiles and the launch-line templates behind them.
//!
//! Every profile owns a `gst-launch` style pipeline description with a single
//! [`PATTERN_SLOT`] placeholder. Each description carries two payloaders,
//! `pay0` for video and `pay1` for audio, which is the naming the RTSP media
//! factory looks for when it builds the SDP.
//!
//! | Codec | Video                        | Audio            | Mount suffix |
//! |-------|------------------------------|------------------|--------------|
//! | H.264 | x264enc, baseline, pt 96     | A-law, pt 8      | (none)       |
//! | VP8   | vp8enc, pt 96                | Opus, pt 97      | `-vp8`       |

use crate::catalog::CatalogEntry;

/// Placeholder replaced by the catalog entry's test pattern.
pub const PATTERN_SLOT: &str = "{pattern}";

const H264_TEMPLATE: &str = "( videotestsrc pattern={pattern} ! \
     timeoverlay ! \
     x264enc ! video/x-h264, profile=baseline ! \
     rtph264pay name=pay0 pt=96 config-interval=-1 \
     audiotestsrc ! alawenc ! rtppcmapay name=pay1 pt=8 )";

const VP8_TEMPLATE: &str = "( videotestsrc pattern={pattern} ! \
     timeoverlay ! \
     vp8enc ! rtpvp8pay name=pay0 pt=96 \
     audiotestsrc ! opusenc ! rtpopuspay name=pay1 pt=97 )";

/// Video codec a mount is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    H264,
    Vp8,
}

impl Codec {
    /// Registration order: every H.264 mount comes before any VP8 mount.
    pub const ALL: [Codec; 2] = [Codec::H264, Codec::Vp8];

    pub fn template(self) -> &'static str {
        match self {
            Self::H264 => H264_TEMPLATE,
            Self::Vp8 => VP8_TEMPLATE,
        }
    }

    /// Appended to the catalog name to form the mount path.
    pub fn url_suffix(self) -> &'static str {
        match self {
            Self::H264 => "",
            Self::Vp8 => "-vp8",
        }
    }

    /// Human readable name used in the startup banner.
    pub fn label(self) -> &'static str {
        match self {
            Self::H264 => "H.264",
            Self::Vp8 => "VP8",
        }
    }

    /// Fill this codec's template with the entry's test pattern.
    pub fn describe(self, entry: &CatalogEntry) -> String {
        self.template().replacen(PATTERN_SLOT, entry.pattern, 1)
    }

    /// Mount path for `entry`, e.g. `/test` or `/test-vp8`.
    pub fn mount_path(self, entry: &CatalogEntry) -> String {
        format!("/{}{}", entry.name, self.url_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMPTE: CatalogEntry = CatalogEntry::new("test", "smpte");

    #[test]
    fn templates_have_exactly_one_slot() {
        for codec in Codec::ALL {
            assert_eq!(codec.template().matches(PATTERN_SLOT).count(), 1);
        }
    }

    #[test]
    fn h264_description() {
        let launch = Codec::H264.describe(&SMPTE);
        assert!(launch.starts_with("( videotestsrc pattern=smpte ! timeoverlay ! x264enc"));
        assert!(launch.contains("video/x-h264, profile=baseline"));
        assert!(launch.contains("rtph264pay name=pay0 pt=96 config-interval=-1"));
        assert!(launch.contains("alawenc ! rtppcmapay name=pay1 pt=8"));
        assert!(!launch.contains(PATTERN_SLOT));
    }

    #[test]
    fn vp8_description() {
        let launch = Codec::Vp8.describe(&SMPTE);
        assert!(launch.starts_with("( videotestsrc pattern=smpte ! timeoverlay ! vp8enc"));
        assert!(launch.contains("rtpvp8pay name=pay0 pt=96"));
        assert!(launch.contains("opusenc ! rtpopuspay name=pay1 pt=97"));
        assert!(launch.ends_with(" )"));
    }

    #[test]
    fn pattern_is_passed_through_unvalidated() {
        let entry = CatalogEntry::new("odd", "not-a-pattern");
        assert!(
            Codec::H264
                .describe(&entry)
                .contains("pattern=not-a-pattern !")
        );
    }

    #[test]
    fn mount_paths() {
        assert_eq!(Codec::H264.mount_path(&SMPTE), "/test");
        assert_eq!(Codec::Vp8.mount_path(&SMPTE), "/test-vp8");
    }
}
