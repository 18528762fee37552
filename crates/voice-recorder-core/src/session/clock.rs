use crate::{
    presentation::{PresentationAdapter, RecorderEvent},
    session::SessionFlags,
};

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::debug;
use uuid::Uuid;

/// Wall time per clock unit.
pub const TICK: Duration = Duration::from_millis(10);

/// Recording duration in hundredths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct ElapsedTime(u64);

impl ElapsedTime {
    /// Zero duration.
    pub const ZERO: ElapsedTime = ElapsedTime(0);

    /// From a count of hundredths of a second.
    pub fn from_hundredths(hundredths: u64) -> Self {
        Self(hundredths)
    }

    /// Total hundredths of a second.
    pub fn as_hundredths(self) -> u64 {
        self.0
    }

    /// Whole minutes.
    pub fn minutes(self) -> u64 {
        self.0 / 100 / 60
    }

    /// Seconds within the current minute.
    pub fn seconds(self) -> u64 {
        self.0 / 100 % 60
    }

    /// Hundredths within the current second.
    pub fn hundredths(self) -> u64 {
        self.0 % 100
    }

    pub(crate) fn advanced(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.minutes(),
            self.seconds(),
            self.hundredths()
        )
    }
}

/// Clock worker: one unit per [`TICK`] while Armed, frozen while Paused,
/// returns once the capture session ends.
pub(crate) fn run_clock(flags: SessionFlags, session: Uuid, adapter: Arc<dyn PresentationAdapter>) {
    let mut next_tick = Instant::now() + TICK;

    loop {
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        }

        match flags.tick(session) {
            Some(elapsed) => {
                adapter.notify(RecorderEvent::ElapsedTime(elapsed));
                next_tick += TICK;
            }
            None => {
                if !flags.wait_while_capture_paused(session).is_active() {
                    break;
                }
                // Resumed: restart the schedule rather than catching up.
                next_tick = Instant::now() + TICK;
            }
        }
    }

    debug!(session_id = %session, "Clock stopped");
}
