use serde::{Deserialize, Serialize};

/// A track returned by the recommendation search, in service ranking order
///
/// Only `id` is consumed by the classification pipeline; the remaining fields
/// are kept so cached search results stay useful for debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

impl Track {
    /// Identifier usable for embedding, if the service supplied one
    pub fn stable_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

// ============================================================================
// Spotify Web API Types
// ============================================================================

/// Token response of the client-credentials flow
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyToken {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Response of `GET /search?type=track`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySearchResponse {
    #[serde(default)]
    pub tracks: Option<SpotifyTrackPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrackPage {
    #[serde(default)]
    pub items: Vec<Track>,
}

impl SpotifySearchResponse {
    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks.map(|page| page.items).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_id_skips_missing_and_blank() {
        let with_id = Track {
            id: Some("4uLU6hMCjMI75M1A2tKUQC".to_string()),
            name: None,
            uri: None,
        };
        let blank = Track {
            id: Some(" ".to_string()),
            name: None,
            uri: None,
        };
        let missing = Track {
            id: None,
            name: Some("Local file".to_string()),
            uri: None,
        };

        assert_eq!(with_id.stable_id(), Some("4uLU6hMCjMI75M1A2tKUQC"));
        assert_eq!(blank.stable_id(), None);
        assert_eq!(missing.stable_id(), None);
    }

    #[test]
    fn test_search_response_parses_items_in_order() {
        let body = serde_json::json!({
            "tracks": {
                "items": [
                    { "id": "a", "name": "First", "uri": "spotify:track:a", "popularity": 50 },
                    { "id": null, "name": "Local" },
                    { "id": "c", "name": "Third" }
                ]
            }
        });

        let response: SpotifySearchResponse = serde_json::from_value(body).unwrap();
        let tracks = response.into_tracks();

        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].id.as_deref(), Some("a"));
        assert_eq!(tracks[1].id, None);
        assert_eq!(tracks[2].name.as_deref(), Some("Third"));
    }

    #[test]
    fn test_search_response_without_tracks() {
        let response: SpotifySearchResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(response.into_tracks().is_empty());
    }

    #[test]
    fn test_token_default_expiry() {
        let token: SpotifyToken =
            serde_json::from_value(serde_json::json!({ "access_token": "tok" })).unwrap();
        assert_eq!(token.expires_in, 3600);
    }
}
