//! Core library for orchestrating transcode and GIF jobs on an external ffmpeg.
//!
//! This crate builds ffmpeg argument lists from typed job descriptions,
//! supervises one engine process at a time, parses its diagnostic output into
//! progress events, and probes media files for their properties.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use kun_core::{Callbacks, CoreConfig, JobRunner, TranscodeJobSpec};
//! use kun_core::job::{Container, VideoCodec};
//!
//! let runner = JobRunner::new(CoreConfig::default());
//!
//! let spec = TranscodeJobSpec::builder("talk.mov", "talk.webm")
//!     .container(Container::Webm)
//!     .video_codec(VideoCodec::Vp9)
//!     .crf(30)
//!     .build()
//!     .unwrap();
//!
//! let observer = Callbacks::new(
//!     |fraction| println!("{:.0}%", fraction * 100.0),
//!     |status| println!("{status}"),
//!     |_line| {},
//! );
//!
//! let ok = runner.run(&spec.into(), &observer);
//! println!("success: {ok}");
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod hardware_accel;
pub mod job;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use engine::{EngineLocator, SystemLocator};
pub use error::{CoreError, CoreResult};
pub use hardware_accel::{HwAccelBackend, HwAccelChoice};
pub use job::{GifJobSpec, JobSpec, TranscodeJobSpec};
pub use probe::{MediaInfo, MediaProbe, MediaProber};
pub use progress::{ProgressSample, parse_line};
pub use runner::{Callbacks, JobObserver, JobOutcome, JobRunner, NoopObserver};
pub use utils::{format_bytes, format_duration};
