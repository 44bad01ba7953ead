//! Local song search over the fetched collection
//!
//! The backend has no search endpoint; the whole collection is loaded and
//! filtered here. A song matches when the query appears case-insensitively
//! in its title or in any of its tags.

use serde_json::Value;

pub fn filter_songs(collection: &Value, query: &str) -> Vec<Value> {
    let needle = query.trim().to_lowercase();
    let Some(songs) = collection.as_array() else {
        return Vec::new();
    };

    songs
        .iter()
        .filter(|song| song_matches(song, &needle))
        .cloned()
        .collect()
}

fn song_matches(song: &Value, needle: &str) -> bool {
    let title_matches = song
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| title.to_lowercase().contains(needle));

    let tag_matches = song
        .get("tags")
        .and_then(Value::as_array)
        .is_some_and(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .any(|tag| tag.to_lowercase().contains(needle))
        });

    title_matches || tag_matches
}
