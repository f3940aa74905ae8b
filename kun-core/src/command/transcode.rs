//! Argument vector for a direct transcode.

use super::{ArgList, format_number};
use crate::hardware_accel::HwAccelBackend;
use crate::job::{AudioCodec, AudioQuality, TranscodeJobSpec, VideoCodec, VideoQuality};

/// Builds the ffmpeg arguments (program name excluded) for a transcode.
///
/// Order: globals, `-hwaccel`, input trim, input, then video codec, rate
/// control, preset, frame rate, resolution, audio codec, audio quality,
/// pixel format, and finally the output path.
#[must_use]
pub fn transcode_args(spec: &TranscodeJobSpec, hwaccel: Option<HwAccelBackend>) -> Vec<String> {
    let mut args = ArgList::with_globals();
    args.hwaccel(hwaccel);

    if let Some(start) = spec.start {
        args.pair("-ss", format_number(start));
    }
    if let Some(end) = spec.end {
        args.pair("-to", format_number(end));
    }
    args.arg("-i").path(&spec.input);

    args.pair("-c:v", spec.video_codec.as_str());
    if spec.video_codec != VideoCodec::Copy {
        push_video_options(&mut args, spec);
    }

    args.pair("-c:a", spec.audio_codec.as_str());
    if spec.audio_codec != AudioCodec::Copy {
        match (&spec.audio_bitrate, spec.audio_codec.default_quality()) {
            (Some(bitrate), _) => {
                args.pair("-b:a", bitrate.as_str());
            }
            (None, Some(AudioQuality::Bitrate(bitrate))) => {
                args.pair("-b:a", bitrate);
            }
            (None, Some(AudioQuality::Scale(q))) => {
                args.pair("-q:a", q.to_string());
            }
            (None, None) => {}
        }
    }

    if spec.video_codec.needs_pixel_format() {
        args.pair("-pix_fmt", "yuv420p");
    }

    args.path(&spec.output);
    args.finish()
}

fn push_video_options(args: &mut ArgList, spec: &TranscodeJobSpec) {
    match &spec.quality {
        Some(VideoQuality::Crf(crf)) => {
            args.pair("-crf", crf.to_string());
        }
        Some(VideoQuality::Bitrate(bitrate)) => {
            args.pair("-b:v", bitrate.as_str());
        }
        None => {}
    }

    // Silently dropped for encoders without presets.
    if let Some(preset) = spec.preset.filter(|_| spec.video_codec.supports_preset()) {
        args.pair("-preset", preset.as_str());
    }

    if let Some(fps) = spec.fps {
        args.pair("-r", format_number(fps));
    }

    // Single dimensions keep the aspect ratio; -2 keeps 4:2:0 sizes even.
    match (spec.width, spec.height) {
        (Some(w), Some(h)) => {
            args.pair("-s", format!("{w}x{h}"));
        }
        (Some(w), None) => {
            args.pair("-vf", format!("scale={w}:-2"));
        }
        (None, Some(h)) => {
            args.pair("-vf", format!("scale=-2:{h}"));
        }
        (None, None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Container, Preset};

    fn position(args: &[String], token: &str) -> usize {
        args.iter()
            .position(|a| a == token)
            .unwrap_or_else(|| panic!("{token} missing from {args:?}"))
    }

    #[test]
    fn test_vp9_opus_with_crf() {
        let spec = TranscodeJobSpec::builder("a.mp4", "a.webm")
            .video_codec(VideoCodec::Vp9)
            .audio_codec(AudioCodec::Opus)
            .crf(30)
            .build()
            .unwrap();
        let args = transcode_args(&spec, None);
        let joined = args.join(" ");

        assert!(joined.contains("-c:v libvpx-vp9 -crf 30 -c:a libopus"), "{joined}");
        assert!(!args.contains(&"-preset".to_string()));
        assert!(!args.contains(&"-pix_fmt".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("a.webm"));
        assert_eq!(spec.container, Container::Webm);
    }

    #[test]
    fn test_option_order_for_x264() {
        let spec = TranscodeJobSpec::builder("in.mov", "out.mp4")
            .crf(23)
            .preset(Preset::Slow)
            .fps(30.0)
            .width(1280)
            .height(720)
            .start(3.0)
            .end(8.0)
            .build()
            .unwrap();
        let args = transcode_args(&spec, Some(HwAccelBackend::Cuda));

        assert_eq!(&args[..2], &["-y", "-hide_banner"]);
        let hw = position(&args, "-hwaccel");
        let ss = position(&args, "-ss");
        let to = position(&args, "-to");
        let input = position(&args, "-i");
        let cv = position(&args, "-c:v");
        let crf = position(&args, "-crf");
        let preset = position(&args, "-preset");
        let rate = position(&args, "-r");
        let size = position(&args, "-s");
        let ca = position(&args, "-c:a");
        let ba = position(&args, "-b:a");
        let pix = position(&args, "-pix_fmt");

        assert!(hw < ss && ss < to && to < input && input < cv);
        assert!(cv < crf && crf < preset && preset < rate && rate < size);
        assert!(size < ca && ca < ba && ba < pix);
        assert_eq!(args[size + 1], "1280x720");
        assert_eq!(args[ba + 1], "128k");
        assert_eq!(args[pix + 1], "yuv420p");
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_audio_defaults_and_overrides() {
        let vorbis = TranscodeJobSpec::builder("a", "b.webm")
            .audio_codec(AudioCodec::Vorbis)
            .build()
            .unwrap();
        let args = transcode_args(&vorbis, None);
        assert_eq!(args[position(&args, "-q:a") + 1], "4");

        let mp3 = TranscodeJobSpec::builder("a", "b.avi")
            .audio_codec(AudioCodec::Lame)
            .build()
            .unwrap();
        let args = transcode_args(&mp3, None);
        assert_eq!(args[position(&args, "-b:a") + 1], "192k");

        let explicit = TranscodeJobSpec::builder("a", "b.webm")
            .audio_codec(AudioCodec::Vorbis)
            .audio_bitrate("160k")
            .build()
            .unwrap();
        let args = transcode_args(&explicit, None);
        assert_eq!(args[position(&args, "-b:a") + 1], "160k");
        assert!(!args.contains(&"-q:a".to_string()));

        let copied = TranscodeJobSpec::builder("a", "b.mkv")
            .audio_codec(AudioCodec::Copy)
            .audio_bitrate("160k")
            .build()
            .unwrap();
        let args = transcode_args(&copied, None);
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_stream_copy_skips_video_options() {
        let spec = TranscodeJobSpec::builder("a.mp4", "a.mkv")
            .video_codec(VideoCodec::Copy)
            .crf(20)
            .preset(Preset::Fast)
            .fps(24.0)
            .width(640)
            .build()
            .unwrap();
        let args = transcode_args(&spec, None);
        for flag in ["-crf", "-preset", "-r", "-vf", "-s", "-pix_fmt"] {
            assert!(!args.contains(&flag.to_string()), "{flag} in {args:?}");
        }
        assert_eq!(args[position(&args, "-c:v") + 1], "copy");
    }

    #[test]
    fn test_single_dimension_uses_scale_filter() {
        let spec = TranscodeJobSpec::builder("a", "b.mp4").height(480).build().unwrap();
        let args = transcode_args(&spec, None);
        assert_eq!(args[position(&args, "-vf") + 1], "scale=-2:480");
    }

    #[test]
    fn test_bitrate_mode() {
        let spec = TranscodeJobSpec::builder("a", "b.mp4").bitrate("2M").build().unwrap();
        let args = transcode_args(&spec, None);
        assert_eq!(args[position(&args, "-b:v") + 1], "2M");
        assert!(!args.contains(&"-crf".to_string()));
    }
}
