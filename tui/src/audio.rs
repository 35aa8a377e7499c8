//! Boot Audio
//!
//! Plays the boot sound through an external player process (`ffplay` by
//! default). Stopping kills the process; the next `play` starts from the
//! beginning.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use monitor_core::{AudioPlayer, PlaybackError};

/// An [`AudioPlayer`] backed by a child process
pub struct ProcessAudio {
    program: String,
    path: Option<PathBuf>,
    volume: f32,
    child: Mutex<Option<Child>>,
}

impl ProcessAudio {
    /// Play `path` with `program` at `volume` (0.0 to 1.0)
    #[must_use]
    pub fn new(program: impl Into<String>, path: Option<PathBuf>, volume: f32) -> Self {
        Self {
            program: program.into(),
            path,
            volume,
            child: Mutex::new(None),
        }
    }

    /// Command-line arguments for the configured player
    #[must_use]
    pub fn args(&self, path: &str) -> Vec<String> {
        player_args(&self.program, path, self.volume)
    }
}

/// Arguments that play `path` once, headless and quiet, at `volume`
fn player_args(program: &str, path: &str, volume: f32) -> Vec<String> {
    // Volume as a whole percentage
    let percent = format!("{:.0}", (volume.clamp(0.0, 1.0) * 100.0).round());
    let name = std::path::Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program);

    match name {
        "ffplay" => vec![
            "-nodisp".into(),
            "-autoexit".into(),
            "-loglevel".into(),
            "quiet".into(),
            "-volume".into(),
            percent,
            path.into(),
        ],
        "mpv" => vec![
            "--no-video".into(),
            "--really-quiet".into(),
            format!("--volume={percent}"),
            path.into(),
        ],
        _ => vec![path.into()],
    }
}

#[async_trait]
impl AudioPlayer for ProcessAudio {
    async fn play(&self) -> Result<(), PlaybackError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| PlaybackError::Unavailable("no boot audio configured".to_string()))?;
        if !path.exists() {
            return Err(PlaybackError::Unavailable(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let mut slot = self.child.lock().await;
        if let Some(mut previous) = slot.take() {
            if let Err(e) = previous.kill().await {
                tracing::debug!(error = %e, "Previous boot audio already finished");
            }
        }

        let child = Command::new(&self.program)
            .args(self.args(&path.to_string_lossy()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                player: self.program.clone(),
                source,
            })?;

        tracing::debug!(player = %self.program, path = %path.display(), "Boot audio started");
        *slot = Some(child);
        Ok(())
    }

    async fn stop(&self) {
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!(error = %e, "Boot audio already finished");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ffplay_args() {
        assert_eq!(
            player_args("/usr/bin/ffplay", "boot.mp3", 0.35),
            vec!["-nodisp", "-autoexit", "-loglevel", "quiet", "-volume", "35", "boot.mp3"]
        );
    }

    #[test]
    fn test_mpv_args() {
        assert_eq!(
            player_args("mpv", "boot.mp3", 1.0),
            vec!["--no-video", "--really-quiet", "--volume=100", "boot.mp3"]
        );
    }

    #[test]
    fn test_unknown_player_gets_path_only() {
        assert_eq!(player_args("paplay", "boot.wav", 0.5), vec!["boot.wav"]);
    }

    #[test]
    fn test_missing_path_is_unavailable() {
        let audio = ProcessAudio::new("ffplay", None, 0.35);
        let err = tokio_test::assert_err!(tokio_test::block_on(audio.play()));
        assert!(matches!(err, PlaybackError::Unavailable(_)));

        let audio = ProcessAudio::new("ffplay", Some(PathBuf::from("/nonexistent/boot.mp3")), 0.35);
        let err = tokio_test::assert_err!(tokio_test::block_on(audio.play()));
        assert!(matches!(err, PlaybackError::Unavailable(_)));
        tokio_test::block_on(audio.stop());
    }

    #[tokio::test]
    async fn test_replay_replaces_previous_player() {
        let audio = ProcessAudio::new("true", Some(std::env::current_exe().unwrap()), 0.35);
        audio.play().await.unwrap();
        audio.play().await.unwrap();
        assert!(audio.child.lock().await.is_some());
        audio.stop().await;
        assert!(audio.child.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let audio = ProcessAudio::new(
            "/nonexistent/player",
            Some(std::env::current_exe().unwrap()),
            0.35,
        );
        assert!(matches!(audio.play().await, Err(PlaybackError::Spawn { .. })));
    }
}
