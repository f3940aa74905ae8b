// ============================================================================
// kun-core/src/engine/mod.rs
// ============================================================================
//
// ENGINE: Interactions with the External ffmpeg Executable
//
// This module encapsulates everything that touches the ffmpeg binary itself:
// finding it, asking it what it supports, and starting and stopping it.
//
// DESIGN PHILOSOPHY:
// Consumers receive the locator and spawner as trait objects or generics,
// so tests swap in the scripted implementations from `mocks`.

pub mod locator;
mod platform;
pub mod process;

#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

pub use locator::{CANDIDATE_PATHS, EngineLocator, SystemLocator, check_dependency, ffprobe_path_for};
pub use process::{EngineExit, EngineProcess, EngineSpawner, SidecarProcess, SidecarSpawner};
