use std::path::{Path, PathBuf};
use std::process::{Child, Command as ProcessCommand, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::clock::PlaybackClock;
use super::{MediaEvent, MediaPrimitive};

/// Plays through an external command-line player (mpv-compatible flags).
///
/// Pausing suspends the child on Unix; elsewhere the child is stopped and
/// restarted at the tracked position.
#[derive(Debug)]
pub(crate) struct ProcessMedia {
    bin: PathBuf,
    url: Option<String>,
    looping: bool,
    child: Option<Child>,
    suspended: bool,
    playing: bool,
    clock: PlaybackClock,
    last_reported: Option<u64>,
    events: Vec<MediaEvent>,
}

impl ProcessMedia {
    pub(crate) fn new(bin: &Path) -> Self {
        Self {
            bin: bin.to_path_buf(),
            url: None,
            looping: false,
            child: None,
            suspended: false,
            playing: false,
            clock: PlaybackClock::default(),
            last_reported: None,
            events: Vec::new(),
        }
    }

    fn spawn_at(&mut self, start_at: u64) -> Result<()> {
        let Some(url) = self.url.clone() else {
            return Ok(());
        };
        self.kill_child();

        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.arg("--no-video").arg("--no-terminal");
        if self.looping {
            cmd.arg("--loop-file=inf");
        }
        if start_at > 0 {
            cmd.arg(format!("--start={start_at}"));
        }
        cmd.arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to launch {}", self.bin.display()))?;
        debug!(pid = child.id(), url = %url, start_at, "player process started");
        self.child = Some(child);
        self.suspended = false;
        Ok(())
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.suspended = false;
    }

    fn start_running(&mut self) {
        self.playing = true;
        self.clock.resume();
        self.events.push(MediaEvent::Started);
    }

    fn reap_child(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                self.child = None;
                self.suspended = false;
                self.playing = false;
                self.clock.pause();
                if status.success() {
                    info!("player process reached end of media");
                    self.events.push(MediaEvent::Ended);
                } else {
                    warn!(%status, "player process exited with failure");
                    self.events.push(MediaEvent::Paused);
                }
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to poll player process"),
        }
    }
}

impl MediaPrimitive for ProcessMedia {
    fn load(&mut self, url: &str, looping: bool, start_at: u64) -> Result<()> {
        self.kill_child();
        self.url = Some(url.to_string());
        self.looping = looping;
        self.playing = false;
        self.last_reported = None;
        self.clock.reset(start_at);
        self.spawn_at(start_at)?;
        self.start_running();
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.playing || self.url.is_none() {
            return Ok(());
        }
        if let Some(child) = self.child.as_ref() {
            if self.suspended {
                resume_child(child)?;
                self.suspended = false;
            }
        } else {
            let position = self.clock.position();
            self.spawn_at(position)?;
        }
        self.start_running();
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if !self.playing {
            return Ok(());
        }
        self.clock.pause();
        self.playing = false;
        if cfg!(unix) {
            if let Some(child) = self.child.as_ref() {
                suspend_child(child)?;
                self.suspended = true;
            }
        } else {
            self.kill_child();
        }
        self.events.push(MediaEvent::Paused);
        Ok(())
    }

    fn stop(&mut self) {
        self.kill_child();
        self.url = None;
        self.playing = false;
        self.last_reported = None;
        self.clock.reset(0);
    }

    fn seek(&mut self, seconds: u64) -> Result<()> {
        self.clock.reset(seconds);
        self.last_reported = None;
        if self.playing {
            self.spawn_at(seconds)?;
            self.clock.resume();
        } else {
            // Respawned at the new offset on the next play.
            self.kill_child();
        }
        Ok(())
    }

    fn set_looping(&mut self, looping: bool) -> Result<()> {
        if self.looping == looping {
            return Ok(());
        }
        self.looping = looping;
        if self.playing {
            self.clock.pause();
            let position = self.clock.position();
            self.spawn_at(position)?;
            self.clock.resume();
        } else {
            self.kill_child();
        }
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        if self.playing {
            let position = self.clock.position();
            if self.last_reported != Some(position) {
                self.last_reported = Some(position);
                self.events.push(MediaEvent::TimeUpdated(position));
            }
        }
        self.reap_child();
        std::mem::take(&mut self.events)
    }

    fn position(&self) -> u64 {
        self.clock.position()
    }
}

impl Drop for ProcessMedia {
    fn drop(&mut self) {
        self.kill_child();
    }
}

#[cfg(unix)]
fn signal_child(child: &Child, signal: libc::c_int) -> Result<()> {
    let pid = child.id() as libc::pid_t;
    if unsafe { libc::kill(pid, signal) } != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("failed to send signal {signal} to player process {pid}"));
    }
    Ok(())
}

#[cfg(unix)]
fn suspend_child(child: &Child) -> Result<()> {
    signal_child(child, libc::SIGSTOP)
}

#[cfg(unix)]
fn resume_child(child: &Child) -> Result<()> {
    signal_child(child, libc::SIGCONT)
}

#[cfg(not(unix))]
fn suspend_child(_child: &Child) -> Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn resume_child(_child: &Child) -> Result<()> {
    Ok(())
}
