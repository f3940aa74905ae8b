//! Argument vectors and filter graphs for GIF jobs.

use std::path::Path;

use super::{ArgList, TrimWindow, VideoFilterChain, format_number};
use crate::hardware_accel::HwAccelBackend;
use crate::job::GifJobSpec;

fn scale_filter(spec: &GifJobSpec) -> Option<String> {
    let flags = spec.scaling.as_str();
    match (spec.width, spec.height) {
        (Some(w), Some(h)) => Some(format!("scale={w}:{h}:flags={flags}")),
        (Some(w), None) => Some(format!("scale={w}:-1:flags={flags}")),
        (None, Some(h)) => Some(format!("scale=-1:{h}:flags={flags}")),
        (None, None) => None,
    }
}

/// Scale then fps, comma joined; `None` when neither is requested.
fn base_filters(spec: &GifJobSpec) -> Option<String> {
    VideoFilterChain::new()
        .add_filter(scale_filter(spec))
        .add_filter(spec.fps.map(|fps| format!("fps={}", format_number(fps))))
        .build()
}

fn palettegen(spec: &GifJobSpec) -> String {
    format!("palettegen=max_colors={}", spec.quality.max_colors())
}

fn paletteuse(spec: &GifJobSpec) -> String {
    format!("paletteuse=dither={}", spec.effective_dither().as_str())
}

/// Single-pass filter graph: filters into `[v]`, palette into `[p]`, then
/// `paletteuse` over both. Without filters the palette stages read `[0:v]`.
#[must_use]
pub fn gif_filter_graph(spec: &GifJobSpec) -> String {
    match base_filters(spec) {
        Some(filters) => format!(
            "[0:v]{filters}[v];[v]{}[p];[v][p]{}",
            palettegen(spec),
            paletteuse(spec)
        ),
        None => format!("[0:v]{}[p];[0:v][p]{}", palettegen(spec), paletteuse(spec)),
    }
}

fn input_args(
    spec: &GifJobSpec,
    window: &TrimWindow,
    hwaccel: Option<HwAccelBackend>,
) -> ArgList {
    let mut args = ArgList::with_globals();
    args.hwaccel(hwaccel);
    window.push_args(&mut args);
    args.arg("-i").path(&spec.input);
    args
}

/// One engine run producing the GIF directly.
#[must_use]
pub fn gif_single_pass_args(
    spec: &GifJobSpec,
    window: &TrimWindow,
    hwaccel: Option<HwAccelBackend>,
) -> Vec<String> {
    let mut args = input_args(spec, window, hwaccel);
    args.pair("-filter_complex", gif_filter_graph(spec));
    args.path(&spec.output);
    args.finish()
}

/// Two-stage GIF, stage 1: write only the palette image.
#[must_use]
pub fn gif_palette_args(
    spec: &GifJobSpec,
    window: &TrimWindow,
    hwaccel: Option<HwAccelBackend>,
    palette: &Path,
) -> Vec<String> {
    let chain = VideoFilterChain::new()
        .add_filter(base_filters(spec))
        .add_filter(Some("format=rgb24".to_string()))
        .add_filter(Some(palettegen(spec)))
        .build()
        .unwrap_or_default();

    let mut args = input_args(spec, window, hwaccel);
    args.pair("-vf", chain);
    args.path(palette);
    args.finish()
}

/// Two-stage GIF, stage 2: apply the stage-1 palette, read as input `1`.
#[must_use]
pub fn gif_apply_palette_args(
    spec: &GifJobSpec,
    window: &TrimWindow,
    hwaccel: Option<HwAccelBackend>,
    palette: &Path,
) -> Vec<String> {
    let graph = match base_filters(spec) {
        Some(filters) => format!("[0:v]{filters}[v];[v][1:v]{}", paletteuse(spec)),
        None => format!("[0:v][1:v]{}", paletteuse(spec)),
    };

    let mut args = input_args(spec, window, hwaccel);
    args.arg("-i").path(palette);
    args.pair("-filter_complex", graph);
    args.path(&spec.output);
    args.finish()
}
