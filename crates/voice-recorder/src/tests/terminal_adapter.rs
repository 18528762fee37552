use crate::{
    TerminalAdapter,
    terminal_adapter::{render, render_list},
};

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use voice_recorder_core::{
    CaptureState, ElapsedTime, PlaybackState, PresentationAdapter, RecorderEvent,
};

struct Harness {
    adapter: TerminalAdapter,
    line_tx: mpsc::Sender<String>,
    events: mpsc::UnboundedReceiver<RecorderEvent>,
}

fn harness(confirm_destructive: bool) -> Harness {
    let (line_tx, line_rx) = mpsc::channel(8);
    let (event_tx, events) = mpsc::unbounded_channel();
    let adapter = TerminalAdapter::new(
        Arc::new(Mutex::new(line_rx)),
        event_tx,
        confirm_destructive,
    );
    Harness {
        adapter,
        line_tx,
        events,
    }
}

fn drain(events: &mut mpsc::UnboundedReceiver<RecorderEvent>) -> Vec<RecorderEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

/// WHAT: Confirmation reads the next input line and accepts y or yes
/// WHY: Prompts share the stdin line channel with the command loop
#[test]
#[allow(clippy::unwrap_used)]
fn given_queued_answers_when_confirming_then_only_yes_accepts() {
    // Given
    let h = harness(true);
    h.line_tx.try_send("y".to_string()).unwrap();
    h.line_tx.try_send(" YES ".to_string()).unwrap();
    h.line_tx.try_send("nope".to_string()).unwrap();
    h.line_tx.try_send(String::new()).unwrap();

    // When / Then
    assert!(h.adapter.confirm("Reset recording?"));
    assert!(h.adapter.confirm("Reset recording?"));
    assert!(!h.adapter.confirm("Reset recording?"));
    assert!(!h.adapter.confirm("Reset recording?"));
}

/// WHAT: Closed input declines confirmations and cancels prompts
/// WHY: End of stdin must never be read as consent to delete
#[test]
fn given_closed_input_when_prompting_then_declined_and_cancelled() {
    // Given
    let h = harness(true);
    drop(h.line_tx);

    // When / Then
    assert!(!h.adapter.confirm("Delete the following file?\n>demo.wav"));
    assert_eq!(h.adapter.prompt_title(&[]), "");
    assert_eq!(h.adapter.prompt_rename("demo.wav"), "");
}

/// WHAT: With confirmations disabled, destructive prompts auto-accept
/// WHY: confirm_destructive = false is the scripted/unattended mode
#[test]
fn given_confirmations_disabled_when_confirming_then_accepted_without_input() {
    // Given: No input queued at all
    let h = harness(false);

    // When / Then
    assert!(h.adapter.confirm("Are you sure you want to delete all recordings?"));
}

/// WHAT: Title and rename prompts return the trimmed line
/// WHY: Stray whitespace must not become part of a file name
#[test]
#[allow(clippy::unwrap_used)]
fn given_queued_lines_when_prompting_for_names_then_trimmed() {
    // Given
    let h = harness(true);
    h.line_tx.try_send("  standup  ".to_string()).unwrap();
    h.line_tx.try_send("retro\t".to_string()).unwrap();

    // When / Then
    assert_eq!(h.adapter.prompt_title(&["demo.wav".to_string()]), "standup");
    assert_eq!(h.adapter.prompt_rename("standup.wav"), "retro");
}

/// WHAT: Timer events reach the terminal once per whole second
/// WHY: One line per hundredth would flood the prompt
#[test]
fn given_timer_ticks_when_notifying_then_forwarded_once_per_second() {
    // Given
    let mut h = harness(true);

    // When
    for hundredths in [1, 50, 99, 100, 150, 199, 200] {
        h.adapter
            .notify(RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(hundredths)));
    }

    // Then
    assert_eq!(
        drain(&mut h.events),
        vec![
            RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(1)),
            RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(100)),
            RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(200)),
        ]
    );
}

/// WHAT: A zero timer is swallowed and restarts the per-second tracking
/// WHY: After a reset the first second of the next take must show again
#[test]
fn given_timer_reset_when_notifying_then_next_take_forwarded() {
    // Given
    let mut h = harness(true);
    h.adapter
        .notify(RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(5)));

    // When
    h.adapter.notify(RecorderEvent::ElapsedTime(ElapsedTime::ZERO));
    h.adapter
        .notify(RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(7)));

    // Then
    assert_eq!(
        drain(&mut h.events),
        vec![
            RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(5)),
            RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(7)),
        ]
    );
}

/// WHAT: Non-timer events are always forwarded in order
/// WHY: State changes must never be throttled away
#[test]
fn given_state_events_when_notifying_then_all_forwarded() {
    // Given
    let mut h = harness(true);
    let sent = vec![
        RecorderEvent::CaptureStateChanged(CaptureState::Armed),
        RecorderEvent::CaptureStateChanged(CaptureState::Armed),
        RecorderEvent::SelectionChanged(None),
    ];

    // When
    for event in sent.clone() {
        h.adapter.notify(event);
    }

    // Then
    assert_eq!(drain(&mut h.events), sent);
}

/// WHAT: Events render to the lines shown at the prompt
/// WHY: Users follow the recorder through these messages
#[test]
fn given_events_when_rendering_then_expected_text() {
    // Given / When / Then
    assert_eq!(
        render(&RecorderEvent::ElapsedTime(ElapsedTime::from_hundredths(6_123))),
        Some("[rec] 01:01:23".to_string())
    );
    assert_eq!(
        render(&RecorderEvent::CaptureStateChanged(CaptureState::Paused)),
        Some("Recording paused (start to resume)".to_string())
    );
    assert_eq!(
        render(&RecorderEvent::PlaybackStateChanged {
            state: PlaybackState::Playing,
            recording: Some("demo.wav".to_string()),
        }),
        Some("Playing: demo.wav".to_string())
    );
    assert_eq!(
        render(&RecorderEvent::PlaybackStateChanged {
            state: PlaybackState::Idle,
            recording: None,
        }),
        Some("Playback stopped".to_string())
    );
    assert_eq!(
        render(&RecorderEvent::SelectionChanged(Some("demo.wav".to_string()))),
        Some("Selected: demo.wav".to_string())
    );
    assert_eq!(
        render(&RecorderEvent::InputRejected("File name already exists".to_string())),
        Some("! File name already exists".to_string())
    );
    assert_eq!(
        render(&RecorderEvent::DeviceFailed("Microphone unplugged".to_string())),
        Some("! Microphone stopped: Microphone unplugged (stop to save, start to retry)".to_string())
    );
}

/// WHAT: The list is numbered from one, newest first, or says it is empty
/// WHY: The numbers are what `play 2` and friends refer to
#[test]
fn given_names_when_rendering_list_then_numbered_lines() {
    // Given
    let names = vec!["b.wav".to_string(), "a.wav".to_string()];

    // When / Then
    assert_eq!(render_list(&names), "  1. b.wav\n  2. a.wav");
    assert_eq!(render_list(&[]), "No recordings");
}
