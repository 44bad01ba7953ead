//! Interactive tools exposed via Model Context Protocol
//!
//! Every tool translates its parameters into one backend call and wraps the
//! backend's JSON response in a single pretty-printed text block. The only
//! local logic is the parameter reshaping for the upsert tools and the
//! in-memory filter behind `search_songs`.

use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::types::{ArtistPayload, ListPayload, SongDetails, SongPayload};
use crate::backend::SongsFilter;
use crate::domain::search::filter_songs;
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_error_with_data, json_rpc_result,
};
use crate::{errors::AppError, AppState};

#[macros::mcp_tool(
    name = "get_songs",
    description = "List songs, optionally filtered by ids or creator"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetSongsTool {
    /// Song ids to fetch. Takes precedence over userId when both are given.
    pub ids: Option<Vec<String>>,
    /// Restrict the listing to songs created by this user.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[macros::mcp_tool(name = "get_song", description = "Get one song by id")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetSongTool {
    pub id: String,
}

#[macros::mcp_tool(
    name = "get_songs_by_user",
    description = "List songs created by a user"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetSongsByUserTool {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[macros::mcp_tool(
    name = "get_songs_in_list",
    description = "List the songs contained in a list"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetSongsInListTool {
    #[serde(rename = "listId")]
    pub list_id: String,
}

#[macros::mcp_tool(
    name = "upsert_song",
    description = "Create or update a song with chord notation"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct UpsertSongTool {
    pub title: String,
    /// Chord notation body of the song.
    #[serde(rename = "chordsText")]
    pub chords_text: String,
    /// Whether the song is publicly visible. Defaults to false.
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
    pub bpm: Option<u32>,
    /// Musical key, e.g. "Am".
    pub key: Option<String>,
    pub voice: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Existing song id; omit to create a new song.
    pub id: Option<String>,
    #[serde(rename = "spotifyUrl")]
    pub spotify_url: Option<String>,
    #[serde(rename = "youtubeUrl")]
    pub youtube_url: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[macros::mcp_tool(
    name = "get_lists",
    description = "List song lists, optionally scoped to a user"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetListsTool {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[macros::mcp_tool(name = "get_list", description = "Get one song list by id")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetListTool {
    pub id: String,
}

#[macros::mcp_tool(
    name = "upsert_list",
    description = "Create or update a song list (requires a configured auth token)"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct UpsertListTool {
    /// Whether the list is private. Defaults to false.
    #[serde(rename = "isPrivate")]
    pub is_private: Option<bool>,
    /// Existing list id; omit to create a new list.
    pub id: Option<String>,
    pub name: Option<String>,
    /// Song ids contained in the list.
    pub songs: Option<Vec<String>>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[macros::mcp_tool(name = "get_artists", description = "List all artists")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetArtistsTool {}

#[macros::mcp_tool(
    name = "upsert_artist",
    description = "Create or update an artist by name"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct UpsertArtistTool {
    pub name: String,
}

#[macros::mcp_tool(
    name = "search_songs",
    description = "Search songs by title or tag, case-insensitively"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct SearchSongsTool {
    pub query: String,
    /// Restrict the search to songs created by this user.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![
        GetSongsTool::tool(),
        GetSongTool::tool(),
        GetSongsByUserTool::tool(),
        GetSongsInListTool::tool(),
        UpsertSongTool::tool(),
        GetListsTool::tool(),
        GetListTool::tool(),
        UpsertListTool::tool(),
        GetArtistsTool::tool(),
        UpsertArtistTool::tool(),
        SearchSongsTool::tool(),
    ]
}

pub fn song_payload_from(args: UpsertSongTool) -> SongPayload {
    SongPayload {
        title: args.title,
        chords_text: args.chords_text,
        public: args.is_public.unwrap_or(false),
        details: SongDetails {
            bpm: args.bpm,
            key: args.key,
            voice: args.voice,
        },
        tags: args.tags.unwrap_or_default(),
        id: args.id,
        spotify_url: args.spotify_url,
        youtube_url: args.youtube_url,
        user_id: args.user_id,
    }
}

pub fn list_payload_from(args: UpsertListTool) -> ListPayload {
    ListPayload {
        private: args.is_private.unwrap_or(false),
        id: args.id,
        name: args.name,
        songs: args.songs,
        user_uid: args.user_id,
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<serde_json::Map<String, Value>>,
) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default())).map_err(|_| {
        AppError::bad_request(
            "invalid_arguments",
            "tool arguments do not match the declared schema",
        )
    })
}

fn tool_result(id: Option<Value>, payload: &Value) -> Value {
    let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    json_rpc_result(
        id,
        serde_json::to_value(CallToolResult {
            content: vec![ContentBlock::from(TextContent::new(text, None, None))],
            is_error: None,
            meta: None,
            structured_content: None,
        })
        .expect("tool result serialization"),
    )
}

fn wrap(id: Option<Value>, outcome: Result<Value, AppError>) -> Value {
    match outcome {
        Ok(body) => tool_result(id, &body),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

pub async fn handle_tools_call(state: &AppState, id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    match tool_call.name.as_str() {
        "get_songs" => {
            let args: GetSongsTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            let filter = SongsFilter {
                ids: args.ids,
                user_id: args.user_id,
            };
            wrap(id, state.api.list_songs(&filter).await)
        }
        "get_song" => {
            let args: GetSongTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            wrap(id, state.api.get_song(&args.id).await)
        }
        "get_songs_by_user" => {
            let args: GetSongsByUserTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            wrap(id, state.api.songs_by_user(&args.user_id).await)
        }
        "get_songs_in_list" => {
            let args: GetSongsInListTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            wrap(id, state.api.songs_in_list(&args.list_id).await)
        }
        "upsert_song" => {
            let args: UpsertSongTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            let song = song_payload_from(args);
            wrap(id, state.api.upsert_song(&song).await)
        }
        "get_lists" => {
            let args: GetListsTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            wrap(id, state.api.list_lists(args.user_id.as_deref()).await)
        }
        "get_list" => {
            let args: GetListTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            wrap(id, state.api.get_list(&args.id).await)
        }
        "upsert_list" => {
            let args: UpsertListTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            let list = list_payload_from(args);
            wrap(id, state.api.upsert_list(&list).await)
        }
        "get_artists" => {
            if let Err(err) = parse_arguments::<GetArtistsTool>(tool_call.arguments) {
                return app_error_to_json_rpc(id, err);
            }
            wrap(id, state.api.list_artists().await)
        }
        "upsert_artist" => {
            let args: UpsertArtistTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            let artist = ArtistPayload { name: args.name };
            wrap(id, state.api.upsert_artist(&artist).await)
        }
        "search_songs" => {
            let args: SearchSongsTool = match parse_arguments(tool_call.arguments) {
                Ok(value) => value,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            let filter = SongsFilter {
                ids: None,
                user_id: args.user_id,
            };
            match state.api.list_songs(&filter).await {
                Ok(collection) => {
                    let matched = filter_songs(&collection, &args.query);
                    tool_result(id, &Value::Array(matched))
                }
                Err(err) => app_error_to_json_rpc(id, err),
            }
        }
        _ => json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "tool_not_found",
                "message": "unknown tool name",
                "details": {
                    "name": tool_call.name,
                },
            })),
        ),
    }
}
