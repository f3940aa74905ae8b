//! Catalogues of the engine options a job may select.
//!
//! Every option is a closed enum that parses from, and displays as, the exact
//! token ffmpeg expects on its command line.

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, unsupported};

/// Declares an option enum together with its engine token and description.
macro_rules! engine_option {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => ($token:literal, $desc:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every supported value, in presentation order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The token passed to ffmpeg.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }

            /// Human readable description for pickers and `--help` output.
            #[must_use]
            pub fn description(self) -> &'static str {
                match self {
                    $($name::$variant => $desc),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| unsupported($kind, s))
            }
        }
    };
}

engine_option! {
    /// Output container formats.
    Container, "container" {
        Mp4 => ("mp4", "MP4 (H.264)"),
        Avi => ("avi", "AVI"),
        Mov => ("mov", "MOV (QuickTime)"),
        Mkv => ("mkv", "MKV (Matroska)"),
        Webm => ("webm", "WebM"),
        Wmv => ("wmv", "WMV"),
        Flv => ("flv", "FLV"),
        Mpg => ("mpg", "MPEG"),
        M4v => ("m4v", "M4V"),
    }
}

engine_option! {
    /// Video encoders. `Copy` passes the stream through untouched.
    VideoCodec, "video codec" {
        X264 => ("libx264", "H.264 (x264), widely compatible"),
        X265 => ("libx265", "H.265 (x265), high compression"),
        Vp8 => ("libvpx", "VP8, for WebM"),
        Vp9 => ("libvpx-vp9", "VP9, efficient WebM"),
        Mpeg4 => ("mpeg4", "MPEG-4 Part 2, legacy"),
        Copy => ("copy", "Copy without re-encoding"),
    }
}

engine_option! {
    /// Audio encoders. `Copy` passes the stream through untouched.
    AudioCodec, "audio codec" {
        Aac => ("aac", "AAC, widely compatible"),
        Mp3 => ("mp3", "MP3"),
        Lame => ("libmp3lame", "MP3 (LAME)"),
        Vorbis => ("libvorbis", "Vorbis, for WebM"),
        Opus => ("libopus", "Opus, efficient"),
        Copy => ("copy", "Copy without re-encoding"),
    }
}

engine_option! {
    /// x264/x265 speed presets.
    Preset, "preset" {
        Ultrafast => ("ultrafast", "Fastest, lowest quality"),
        Superfast => ("superfast", "Very fast"),
        Veryfast => ("veryfast", "Fast"),
        Faster => ("faster", "Faster than default"),
        Fast => ("fast", "Slightly faster than default"),
        Medium => ("medium", "Default balance"),
        Slow => ("slow", "Slower, better quality"),
        Slower => ("slower", "Much slower"),
        Veryslow => ("veryslow", "Slowest, best quality"),
    }
}

engine_option! {
    /// Resampling kernels for the GIF scale filter.
    ScalingAlgorithm, "scaling algorithm" {
        Lanczos => ("lanczos", "Lanczos, sharpest"),
        Bicubic => ("bicubic", "Bicubic, balanced"),
        Bilinear => ("bilinear", "Bilinear, fast"),
        Neighbor => ("neighbor", "Nearest neighbour, pixel art"),
    }
}

engine_option! {
    /// Error-diffusion modes for `paletteuse`.
    DitherMode, "dither mode" {
        None => ("none", "No dithering, flat colour bands"),
        FloydSteinberg => ("floyd_steinberg", "Floyd-Steinberg, smooth gradients"),
        Sierra2 => ("sierra2", "Sierra-2"),
        Sierra24a => ("sierra2_4a", "Sierra-2-4A, lightweight"),
    }
}

impl Default for ScalingAlgorithm {
    fn default() -> Self {
        ScalingAlgorithm::Lanczos
    }
}

impl VideoCodec {
    /// Whether the encoder accepts `-preset`.
    #[must_use]
    pub fn supports_preset(self) -> bool {
        matches!(self, VideoCodec::X264 | VideoCodec::X265)
    }

    /// H.264/H.265 output is normalized to `yuv420p` for player compatibility.
    #[must_use]
    pub fn needs_pixel_format(self) -> bool {
        matches!(self, VideoCodec::X264 | VideoCodec::X265)
    }
}

/// How an audio encoder's quality is set when the job gives no bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQuality {
    /// `-b:a <value>`
    Bitrate(&'static str),
    /// `-q:a <value>`
    Scale(u8),
}

impl AudioCodec {
    /// Default quality for the encoder, or `None` for stream copy.
    #[must_use]
    pub fn default_quality(self) -> Option<AudioQuality> {
        match self {
            AudioCodec::Aac => Some(AudioQuality::Bitrate("128k")),
            AudioCodec::Mp3 | AudioCodec::Lame => Some(AudioQuality::Bitrate("192k")),
            AudioCodec::Vorbis => Some(AudioQuality::Scale(4)),
            AudioCodec::Opus => Some(AudioQuality::Bitrate("96k")),
            AudioCodec::Copy => None,
        }
    }
}

/// GIF palette quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GifQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl GifQuality {
    /// Palette size handed to `palettegen=max_colors`.
    #[must_use]
    pub fn max_colors(self) -> u16 {
        match self {
            GifQuality::Low => 64,
            GifQuality::Medium => 128,
            GifQuality::High => 256,
        }
    }

    /// Dither applied when the job does not pick one explicitly.
    #[must_use]
    pub fn default_dither(self) -> DitherMode {
        match self {
            GifQuality::Low => DitherMode::None,
            GifQuality::Medium | GifQuality::High => DitherMode::FloydSteinberg,
        }
    }

    /// Total mapping from a tier name; anything unrecognised is `Medium`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => GifQuality::Low,
            "high" => GifQuality::High,
            _ => GifQuality::Medium,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GifQuality::Low => "low",
            GifQuality::Medium => "medium",
            GifQuality::High => "high",
        }
    }
}

impl fmt::Display for GifQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_tokens_round_trip_through_from_str() {
        assert_eq!("libvpx-vp9".parse::<VideoCodec>().unwrap(), VideoCodec::Vp9);
        assert_eq!("LIBX264".parse::<VideoCodec>().unwrap(), VideoCodec::X264);
        assert_eq!("libopus".parse::<AudioCodec>().unwrap(), AudioCodec::Opus);
        assert_eq!(Container::Webm.to_string(), "webm");
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let err = "h266".parse::<VideoCodec>().unwrap_err();
        assert!(err.to_string().contains("video codec"));
        assert!("ogg".parse::<Container>().is_err());
    }

    #[test]
    fn test_preset_support_is_limited_to_x26x() {
        let with_preset: Vec<_> = VideoCodec::ALL
            .iter()
            .filter(|c| c.supports_preset())
            .collect();
        assert_eq!(with_preset, vec![&VideoCodec::X264, &VideoCodec::X265]);
    }

    #[test]
    fn test_audio_defaults() {
        assert_eq!(AudioCodec::Aac.default_quality(), Some(AudioQuality::Bitrate("128k")));
        assert_eq!(AudioCodec::Lame.default_quality(), Some(AudioQuality::Bitrate("192k")));
        assert_eq!(AudioCodec::Vorbis.default_quality(), Some(AudioQuality::Scale(4)));
        assert_eq!(AudioCodec::Opus.default_quality(), Some(AudioQuality::Bitrate("96k")));
        assert_eq!(AudioCodec::Copy.default_quality(), None);
    }

    #[test]
    fn test_quality_tier_mapping_is_total() {
        assert_eq!(GifQuality::from_name("low").max_colors(), 64);
        assert_eq!(GifQuality::from_name("low").default_dither(), DitherMode::None);
        assert_eq!(GifQuality::from_name("HIGH").max_colors(), 256);
        assert_eq!(GifQuality::from_name("ultra"), GifQuality::Medium);
        assert_eq!(GifQuality::from_name("").max_colors(), 128);
    }
}
