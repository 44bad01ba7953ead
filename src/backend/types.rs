//! Outbound wire records for the Bandmate REST API
//!
//! The backend's JSON field names differ from the tool parameter names
//! (`chords-text`, `public`, `user_id`, `user_uid`); the mapping lives here
//! and nowhere else.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Body of `POST /songs`. `details` is always present on the wire, even when
/// none of its keys are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongPayload {
    pub title: String,
    #[serde(rename = "chords-text")]
    pub chords_text: String,
    pub public: bool,
    pub details: SongDetails,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "spotifyUrl", skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<String>,
    #[serde(rename = "youtubeUrl", skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(rename = "user_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Body of `POST /lists`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPayload {
    pub private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub songs: Option<Vec<String>>,
    #[serde(rename = "user_uid", skip_serializing_if = "Option::is_none")]
    pub user_uid: Option<String>,
}

/// Body of `POST /artists`. The backend derives the idempotent artist id
/// from the name; no normalization happens on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistPayload {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_song() -> SongPayload {
        SongPayload {
            title: "Foobar".to_string(),
            chords_text: "A B C".to_string(),
            public: false,
            details: SongDetails::default(),
            tags: Vec::new(),
            id: None,
            spotify_url: None,
            youtube_url: None,
            user_id: None,
        }
    }

    #[test]
    fn song_with_no_detail_fields_serializes_empty_details_object() {
        let serialized = serde_json::to_value(minimal_song()).expect("song serialization");

        assert_eq!(serialized["details"], json!({}));
        assert_eq!(serialized["chords-text"], json!("A B C"));
        assert_eq!(serialized["public"], json!(false));
        assert_eq!(serialized["tags"], json!([]));
        assert!(serialized.get("id").is_none());
        assert!(serialized.get("user_id").is_none());
    }

    #[test]
    fn song_details_serialize_only_provided_keys() {
        let mut song = minimal_song();
        song.details.bpm = Some(120);
        song.details.voice = Some("tenor".to_string());

        let serialized = serde_json::to_value(song).expect("song serialization");

        assert_eq!(serialized["details"], json!({"bpm": 120, "voice": "tenor"}));
        assert!(serialized["details"].get("key").is_none());
    }

    #[test]
    fn song_optional_fields_use_wire_names() {
        let mut song = minimal_song();
        song.spotify_url = Some("https://open.spotify.com/track/x".to_string());
        song.user_id = Some("user-1".to_string());

        let serialized = serde_json::to_value(song).expect("song serialization");

        assert_eq!(
            serialized["spotifyUrl"],
            json!("https://open.spotify.com/track/x")
        );
        assert_eq!(serialized["user_id"], json!("user-1"));
        assert!(serialized.get("spotify_url").is_none());
        assert!(serialized.get("userId").is_none());
    }

    #[test]
    fn list_serializes_private_flag_and_user_uid() {
        let list = ListPayload {
            private: true,
            id: Some("list-1".to_string()),
            name: Some("Setlist".to_string()),
            songs: Some(vec!["song-1".to_string()]),
            user_uid: Some("user-1".to_string()),
        };

        let serialized = serde_json::to_value(list).expect("list serialization");

        assert_eq!(serialized["private"], json!(true));
        assert_eq!(serialized["user_uid"], json!("user-1"));
        assert_eq!(serialized["songs"], json!(["song-1"]));
        assert!(serialized.get("isPrivate").is_none());
    }

    #[test]
    fn empty_list_serializes_only_private_flag() {
        let serialized =
            serde_json::to_value(ListPayload::default()).expect("list serialization");

        assert_eq!(serialized, json!({"private": false}));
    }
}
