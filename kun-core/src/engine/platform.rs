//! Platform-specific process termination.
//!
//! On Unix ffmpeg is first asked to quit through its `q` console command,
//! which lets it close the output cleanly; if that cannot be delivered the
//! process is killed. Windows has no equivalent soft request for a console
//! child, so the process is killed directly.

use std::io;

use ffmpeg_sidecar::child::FfmpegChild;

#[cfg(not(windows))]
pub(crate) fn terminate(child: &mut FfmpegChild) -> io::Result<()> {
    match child.quit() {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!("Graceful quit failed ({}), killing ffmpeg", e);
            child.kill()
        }
    }
}

#[cfg(windows)]
pub(crate) fn terminate(child: &mut FfmpegChild) -> io::Result<()> {
    child.kill()
}
