use crate::RecordingSet;

fn set(ids: &[&str]) -> RecordingSet {
    RecordingSet::from_sorted(ids.iter().map(|id| id.to_string()))
}

/// WHAT: Duplicates are dropped and display order is newest first
/// WHY: Identifiers are unique and the list view shows the latest recording on top
#[test]
fn given_listing_with_duplicate_when_building_then_unique_and_reversed_for_display() {
    // Given / When
    let recordings = set(&["a.wav", "b.wav", "a.wav", "c.wav"]);

    // Then
    assert_eq!(recordings.ids(), ["a.wav", "b.wav", "c.wav"]);
    assert_eq!(recordings.newest_first(), ["c.wav", "b.wav", "a.wav"]);
    assert_eq!(recordings.len(), 3);
}

/// WHAT: Rename replaces in place and refuses collisions
/// WHY: A renamed recording keeps its position in the list
#[test]
fn given_recordings_when_renaming_then_position_preserved_and_collision_refused() {
    // Given
    let mut recordings = set(&["a.wav", "b.wav", "c.wav"]);

    // When
    let renamed = recordings.rename("b.wav", "z.wav");
    let collided = recordings.rename("a.wav", "c.wav");
    let missing = recordings.rename("nope.wav", "y.wav");

    // Then
    assert!(renamed);
    assert!(!collided);
    assert!(!missing);
    assert_eq!(recordings.ids(), ["a.wav", "z.wav", "c.wav"]);
}

/// WHAT: Push, remove and clear report whether anything changed
/// WHY: The controller relies on these to keep the list consistent
#[test]
fn given_recordings_when_mutating_then_changes_reported() {
    // Given
    let mut recordings = set(&["a.wav"]);

    // When / Then
    assert!(recordings.push("b.wav".to_string()));
    assert!(!recordings.push("a.wav".to_string()));
    assert!(recordings.remove("a.wav"));
    assert!(!recordings.remove("a.wav"));
    assert!(recordings.contains("b.wav"));

    recordings.clear();
    assert!(recordings.is_empty());
}
