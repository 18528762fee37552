use crate::{error::NameRejection, store::RecordingSet};

/// File extension of every persisted recording.
pub const RECORDING_EXTENSION: &str = "wav";

/// Longest title accepted in the save and rename prompts.
pub const MAX_TITLE_CHARS: usize = 23;

/// Turn user input into a recording identifier (`<title>.wav`).
///
/// Surrounding whitespace and one trailing `.wav` are dropped first, so
/// `"demo"` and `"demo.wav"` name the same recording.
pub fn recording_id(raw: &str) -> String {
    format!("{}.{}", title_of(raw), RECORDING_EXTENSION)
}

/// The title part of an identifier or raw input.
pub fn title_of(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix(".wav")
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

/// Check a proposed title against the naming rules and existing recordings.
///
/// Returns the identifier the recording would be stored under.
pub fn validate_title(raw: &str, existing: &RecordingSet) -> Result<String, NameRejection> {
    let title = title_of(raw);

    if title.is_empty() {
        return Err(NameRejection::Empty);
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(NameRejection::TooLong {
            max: MAX_TITLE_CHARS,
        });
    }
    if title.starts_with('.') {
        return Err(NameRejection::LeadingDot);
    }
    if let Some(c) = title
        .chars()
        .find(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
    {
        return Err(NameRejection::ForbiddenCharacter(c));
    }

    let id = recording_id(title);
    if existing.contains(&id) {
        return Err(NameRejection::Taken(id));
    }

    Ok(id)
}
