// ============================================================================
// kun-core/src/hardware_accel.rs
// ============================================================================
//
// HARDWARE ACCELERATION: Decoder Backend Selection
//
// Jobs may ask for a named `-hwaccel` backend, for `auto`, or for none at all.
// This module resolves that request against the backends the located ffmpeg
// actually reports, so a command never carries a flag the engine rejects.
//
// KEY COMPONENTS:
// - HwAccelBackend: the backends kun knows how to request
// - HwAccelChoice: what a job asked for
// - resolve: request + capabilities -> the backend to put on the command line
//
// Unsupported or unknown requests resolve to `None`; the job then runs on the
// software decoder rather than failing.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, unsupported};

/// A hardware decoding backend accepted by `-hwaccel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwAccelBackend {
    Cuda,
    Qsv,
    VideoToolbox,
    Vaapi,
    D3d11va,
}

impl HwAccelBackend {
    /// Order in which `auto` picks among the available backends.
    pub const PREFERENCE: [HwAccelBackend; 5] = [
        HwAccelBackend::Cuda,
        HwAccelBackend::Qsv,
        HwAccelBackend::VideoToolbox,
        HwAccelBackend::Vaapi,
        HwAccelBackend::D3d11va,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HwAccelBackend::Cuda => "cuda",
            HwAccelBackend::Qsv => "qsv",
            HwAccelBackend::VideoToolbox => "videotoolbox",
            HwAccelBackend::Vaapi => "vaapi",
            HwAccelBackend::D3d11va => "d3d11va",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            HwAccelBackend::Cuda => "NVIDIA CUDA",
            HwAccelBackend::Qsv => "Intel Quick Sync Video",
            HwAccelBackend::VideoToolbox => "Apple VideoToolbox",
            HwAccelBackend::Vaapi => "VA-API (Linux)",
            HwAccelBackend::D3d11va => "Direct3D 11 (Windows)",
        }
    }
}

impl fmt::Display for HwAccelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HwAccelBackend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::PREFERENCE
            .iter()
            .copied()
            .find(|b| b.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| unsupported("hardware acceleration backend", s))
    }
}

/// A job's hardware acceleration request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HwAccelChoice {
    /// Software decoding.
    #[default]
    Disabled,
    /// Best available backend by [`HwAccelBackend::PREFERENCE`].
    Auto,
    /// A backend by name; kept verbatim so unknown names can fall back silently.
    Named(String),
}

impl HwAccelChoice {
    /// Parses `auto`, `none` or a backend name. Never fails.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("auto") {
            HwAccelChoice::Auto
        } else if name.is_empty() || name.eq_ignore_ascii_case("none") {
            HwAccelChoice::Disabled
        } else {
            HwAccelChoice::Named(name.to_ascii_lowercase())
        }
    }
}

impl fmt::Display for HwAccelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwAccelChoice::Disabled => f.write_str("none"),
            HwAccelChoice::Auto => f.write_str("auto"),
            HwAccelChoice::Named(name) => f.write_str(name),
        }
    }
}

/// Picks the most preferred backend present in `capabilities`.
#[must_use]
pub fn best_available(capabilities: &HashSet<String>) -> Option<HwAccelBackend> {
    HwAccelBackend::PREFERENCE
        .into_iter()
        .find(|b| capabilities.contains(b.as_str()))
}

/// Resolves a request against the engine's reported backends.
///
/// Returns the backend to pass as `-hwaccel`, or `None` when the request is
/// disabled, names something unknown, or names a backend the engine lacks.
#[must_use]
pub fn resolve(choice: &HwAccelChoice, capabilities: &HashSet<String>) -> Option<HwAccelBackend> {
    let resolved = match choice {
        HwAccelChoice::Disabled => None,
        HwAccelChoice::Auto => best_available(capabilities),
        HwAccelChoice::Named(name) => name
            .parse::<HwAccelBackend>()
            .ok()
            .filter(|b| capabilities.contains(b.as_str())),
    };

    if resolved.is_none() && *choice != HwAccelChoice::Disabled {
        log::debug!("Hardware acceleration '{}' unavailable, using software decoding", choice);
    }
    resolved
}

/// Parses the output of `ffmpeg -hide_banner -hwaccels`.
///
/// ```text
/// Hardware acceleration methods:
/// vdpau
/// cuda
/// ```
#[must_use]
pub fn parse_hwaccels(output: &str) -> HashSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.ends_with(':'))
        .map(str::to_ascii_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_auto_follows_preference_order() {
        let c = caps(&["vaapi", "qsv", "cuda"]);
        assert_eq!(resolve(&HwAccelChoice::Auto, &c), Some(HwAccelBackend::Cuda));

        let c = caps(&["d3d11va", "vaapi"]);
        assert_eq!(resolve(&HwAccelChoice::Auto, &c), Some(HwAccelBackend::Vaapi));

        assert_eq!(resolve(&HwAccelChoice::Auto, &caps(&["vdpau"])), None);
    }

    #[test]
    fn test_none_and_unsupported_names_yield_no_flag() {
        let c = caps(&["cuda", "vaapi"]);
        assert_eq!(resolve(&HwAccelChoice::Disabled, &c), None);
        assert_eq!(resolve(&HwAccelChoice::from_name("none"), &c), None);
        assert_eq!(resolve(&HwAccelChoice::from_name("qsv"), &c), None);
        assert_eq!(resolve(&HwAccelChoice::from_name("opencl"), &c), None);
        assert_eq!(
            resolve(&HwAccelChoice::from_name("CUDA"), &c),
            Some(HwAccelBackend::Cuda)
        );
    }

    #[test]
    fn test_parse_hwaccels_output() {
        let out = "Hardware acceleration methods:\nvdpau\ncuda\nvaapi\n\n";
        let parsed = parse_hwaccels(out);
        assert_eq!(parsed, caps(&["vdpau", "cuda", "vaapi"]));
    }

    #[test]
    fn test_choice_from_name() {
        assert_eq!(HwAccelChoice::from_name("Auto"), HwAccelChoice::Auto);
        assert_eq!(HwAccelChoice::from_name(""), HwAccelChoice::Disabled);
        assert_eq!(
            HwAccelChoice::from_name("videotoolbox"),
            HwAccelChoice::Named("videotoolbox".into())
        );
    }
}
