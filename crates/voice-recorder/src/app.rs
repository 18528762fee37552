use crate::{
    AppCommand, AppError, AppResult,
    app_command::{HELP, Target},
    terminal_adapter::{LineSource, render, render_list},
};

use std::{
    io::{self, BufRead},
    panic::Location,
    sync::Arc,
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, instrument, warn};
use voice_recorder_core::{
    CaptureState, ErrorKind, RecorderError, RecorderEvent, RecorderStatus, SessionController,
    StopOutcome, recording_id,
};

/// Main application state.
///
/// Commands run on blocking tasks because the controller blocks on device
/// handshakes, worker joins and the adapter's prompts.
pub struct App {
    pub(crate) controller: Arc<Mutex<SessionController>>,
    pub(crate) lines: LineSource,
    pub(crate) line_tx: mpsc::Sender<String>,
    pub(crate) events: mpsc::UnboundedReceiver<RecorderEvent>,
}

impl App {
    /// Run the command loop until `quit` or end of input.
    #[instrument(skip(self))]
    pub(crate) async fn run(self) -> AppResult<()> {
        let App {
            controller,
            lines,
            line_tx,
            mut events,
        } = self;

        info!("Voice recorder starting");
        println!("Type 'help' for commands.");

        // Shutdown: once every receiver handle is gone, the next
        // blocking_send() fails and the forwarder exits.
        let stdin_handle = tokio::task::spawn_blocking(move || forward_stdin(line_tx));

        loop {
            tokio::select! {
                Some(event) = events.recv() => print_event(&event),

                line = next_line(&lines) => {
                    let Some(line) = line else {
                        info!("Input closed, shutting down");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    let command = match line.parse::<AppCommand>() {
                        Ok(command) => command,
                        Err(e) => {
                            println!("! {}", describe(&e));
                            continue;
                        }
                    };

                    if command == AppCommand::Quit {
                        info!("Quit requested");
                        break;
                    }

                    match execute(Arc::clone(&controller), command).await {
                        Ok(Some(output)) => println!("{}", output),
                        Ok(None) => {}
                        Err(e) => {
                            error!(error = ?e, "Command failed");
                            println!("! {}", describe(&e));
                        }
                    }

                    while let Ok(event) = events.try_recv() {
                        print_event(&event);
                    }
                }
            }
        }

        // Dropping the controller joins its workers, so do it off the runtime.
        drop(lines);
        if tokio::task::spawn_blocking(move || drop(controller))
            .await
            .is_err()
        {
            warn!("Controller shutdown task panicked");
        }

        match tokio::time::timeout(Duration::from_secs(1), stdin_handle).await {
            Ok(Ok(())) => debug!("Stdin forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Stdin forwarder task panicked"),
            Err(_) => debug!(
                "Stdin forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        info!("Voice recorder shut down");

        Ok(())
    }
}

async fn next_line(lines: &LineSource) -> Option<String> {
    lines.lock().await.recv().await
}

fn forward_stdin(line_tx: mpsc::Sender<String>) {
    for line in io::stdin().lock().lines() {
        match line {
            Ok(line) => {
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
}

fn print_event(event: &RecorderEvent) {
    if let Some(text) = render(event) {
        println!("{}", text);
    }
}

async fn execute(
    controller: Arc<Mutex<SessionController>>,
    command: AppCommand,
) -> AppResult<Option<String>> {
    let location = ErrorLocation::from(Location::caller());
    tokio::task::spawn_blocking(move || {
        let mut controller = controller.blocking_lock();
        apply(&mut controller, command)
    })
    .await
    .map_err(|e| AppError::TaskFailed {
        reason: e.to_string(),
        location,
    })?
}

/// Run one command against the controller. Returns text to print.
#[instrument(skip(controller))]
pub(crate) fn apply(
    controller: &mut SessionController,
    command: AppCommand,
) -> AppResult<Option<String>> {
    let capturing = controller.capture_state() != CaptureState::Idle;
    let needs_idle = matches!(
        command,
        AppCommand::Play(_) | AppCommand::Rename(_) | AppCommand::Delete(_) | AppCommand::DeleteAll
    );
    if capturing && needs_idle {
        return Ok(Some("Stop or reset the recording first".to_string()));
    }

    let output = match command {
        AppCommand::Start => {
            controller.start_recording()?;
            None
        }
        AppCommand::Reset => {
            if controller.capture_state() == CaptureState::Idle {
                Some("Not recording".to_string())
            } else if controller.reset_recording()? {
                Some("Recording discarded".to_string())
            } else {
                None
            }
        }
        AppCommand::Stop => Some(
            match controller.stop_recording()? {
                StopOutcome::Saved(id) => format!("Saved {}", id),
                StopOutcome::Empty => "Nothing was recorded".to_string(),
                StopOutcome::Cancelled => "Save cancelled, recording paused".to_string(),
                StopOutcome::NotRecording => "Not recording".to_string(),
            },
        ),
        AppCommand::Play(target) => {
            if controller.playback_state().is_active() {
                controller.play_selected()?;
                return Ok(None);
            }
            if let Some(missing) = select_target(controller, target.as_ref()) {
                return Ok(Some(missing));
            }
            if controller.selection().is_none() {
                return Ok(Some("Select a recording first".to_string()));
            }
            controller.play_selected()?;
            None
        }
        AppCommand::Pause => {
            controller.pause_playback();
            None
        }
        AppCommand::Rename(target) => {
            if let Some(missing) = select_target(controller, target.as_ref()) {
                return Ok(Some(missing));
            }
            if controller.selection().is_none() {
                return Ok(Some("Select a recording first".to_string()));
            }
            controller.rename_selected()?;
            None
        }
        AppCommand::Delete(target) => {
            if let Some(missing) = select_target(controller, target.as_ref()) {
                return Ok(Some(missing));
            }
            if controller.selection().is_none() {
                return Ok(Some("Select a recording first".to_string()));
            }
            controller.delete_selected()?;
            None
        }
        AppCommand::DeleteAll => {
            if controller.recordings().is_empty() {
                Some("No recordings".to_string())
            } else {
                controller.delete_all()?;
                None
            }
        }
        AppCommand::Select(None) => {
            controller.select(None);
            None
        }
        AppCommand::Select(target) => select_target(controller, target.as_ref()),
        AppCommand::List => Some(render_list(&controller.recordings().newest_first())),
        AppCommand::Status => Some(render_status(&controller.status())),
        AppCommand::Help => Some(HELP.to_string()),
        AppCommand::Quit => None,
    };

    Ok(output)
}

/// Select `target` if given. Returns a message when it names nothing.
fn select_target(controller: &mut SessionController, target: Option<&Target>) -> Option<String> {
    let target = target?;
    match resolve(controller, target) {
        Some(id) => {
            controller.select(Some(&id));
            None
        }
        None => Some(match target {
            Target::Name(name) => format!("No recording named {}", name),
            Target::Index(index) => format!("No recording #{}", index),
        }),
    }
}

/// Identifier a target refers to, if it is listed.
pub(crate) fn resolve(controller: &SessionController, target: &Target) -> Option<String> {
    let recordings = controller.recordings();
    match target {
        Target::Index(index) => {
            // A recording titled with the digits wins over the list position.
            let id = recording_id(&index.to_string());
            if recordings.contains(&id) {
                return Some(id);
            }
            index
                .checked_sub(1)
                .and_then(|i| recordings.newest_first().get(i).cloned())
        }
        Target::Name(name) => {
            let id = recording_id(name);
            recordings.contains(&id).then_some(id)
        }
    }
}

/// One-line summary for `status`.
pub(crate) fn render_status(status: &RecorderStatus) -> String {
    let playback = match &status.playing {
        Some(name) => format!("{:?} {}", status.playback, name),
        None => format!("{:?}", status.playback),
    };
    format!(
        "capture: {:?} {} | playback: {} | selected: {} | recordings: {}",
        status.capture,
        status.elapsed,
        playback,
        status.selection.as_deref().unwrap_or("-"),
        status.recordings
    )
}

/// User-facing text for an error.
pub(crate) fn describe(err: &AppError) -> String {
    match err {
        AppError::InvalidCommand { reason, .. } => reason.clone(),
        AppError::Recorder { source, .. } => describe_recorder(source),
        other => other.to_string(),
    }
}

fn describe_recorder(err: &RecorderError) -> String {
    match err {
        RecorderError::InvalidName { rejection, .. } => rejection.to_string(),
        RecorderError::NotFound { id, .. } => format!("Recording not found: {}", id),
        RecorderError::DeviceUnavailable { reason, .. } | RecorderError::Device { reason, .. } => {
            format!("Audio device unavailable: {}", reason)
        }
        RecorderError::Filesystem { path, source, .. } => {
            format!("File operation failed on {}: {}", path.display(), source)
        }
        RecorderError::Codec { path, source, .. } => {
            format!("Could not read or write {}: {}", path.display(), source)
        }
        other => match other.kind() {
            ErrorKind::DeviceUnavailable => "Audio worker stopped unexpectedly".to_string(),
            _ => other.to_string(),
        },
    }
}
