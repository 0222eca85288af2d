//! Voice autosuggest wire protocol
//!
//! JSON message types for the speech-to-address recognition service, the
//! query-string builder for the connection URL, and the raw sample encoding.
//! Everything here is a pure, stateless transformation.
//!
//! # Protocol Overview
//!
//! 1. Connect to the autosuggest endpoint with the API key and ranking
//!    parameters in the query string
//! 2. Send `StartRecognition` declaring the audio format — before any audio
//! 3. Stream raw audio frames as binary messages
//! 4. Receive suggestion lists as JSON text messages
//! 5. Send `EndOfStream` carrying the last frame sequence number

use serde::{Deserialize, Serialize};

/// Encoding label declared when none is chosen explicitly.
/// The service also accepts `pcm_s16le` and `mulaw`.
pub const DEFAULT_ENCODING: &str = "pcm_f32le";

/// Audio format description nested in the handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Always "raw" for PCM streams
    #[serde(rename = "type")]
    pub kind: String,
    /// Encoding label; passed through to the server, not validated here
    pub encoding: String,
    /// Samples per second
    pub sample_rate: u32,
}

// ============================================================================
// Client Messages (sent TO the service)
// ============================================================================

/// Control messages sent from client to the recognition service
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "message")]
pub enum ClientMessage {
    /// Declare the audio format; must precede any audio frame
    StartRecognition { audio_format: AudioFormat },

    /// No further audio will be sent
    EndOfStream { last_seq_no: u64 },
}

impl ClientMessage {
    /// Create the handshake for a raw PCM stream
    pub fn start_recognition(encoding: &str, sample_rate: u32) -> Self {
        Self::StartRecognition {
            audio_format: AudioFormat {
                kind: "raw".to_string(),
                encoding: encoding.to_string(),
                sample_rate,
            },
        }
    }

    /// Create the end-of-stream message from the last transmitted sequence
    /// number
    pub fn end_of_stream(last_seq_no: u64) -> Self {
        Self::EndOfStream { last_seq_no }
    }
}

/// Pack f32 samples as little-endian bytes for the `pcm_f32le` encoding
pub fn encode_samples(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

// ============================================================================
// Server Messages (received FROM the service)
// ============================================================================

/// One ranked location suggestion.
///
/// Every field is optional; `None` means the server omitted the field and is
/// meaningful, never collapsed to a zero value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    /// ISO 3166-1 alpha-2 country code
    #[serde(default)]
    pub country: Option<String>,

    /// Text description of a nearby place
    #[serde(default, rename = "nearestPlace")]
    pub nearest_place: Option<String>,

    /// The three word address
    #[serde(default)]
    pub words: Option<String>,

    /// Kilometers from the focus coordinate
    #[serde(default, rename = "distanceToFocusKm")]
    pub distance_to_focus_km: Option<u32>,

    /// Position in the list, most probable match first
    #[serde(default)]
    pub rank: Option<u32>,

    /// Two letter language code
    #[serde(default)]
    pub language: Option<String>,
}

/// Envelope wrapping an inbound suggestions payload
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionsEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<Suggestion>>,
}

/// Decode an inbound text payload into a suggestion list.
///
/// Returns `None` on any decode failure — callers treat that as "ignore this
/// message". Never panics or propagates an error past this boundary.
pub fn decode_suggestions(text: &str) -> Option<Vec<Suggestion>> {
    serde_json::from_str::<SuggestionsEnvelope>(text)
        .ok()?
        .suggestions
}

// ============================================================================
// Session parameters and the connection query string
// ============================================================================

/// A WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Parameters captured when a session is opened.
///
/// `sample_rate` and `encoding` describe the audio and travel in the
/// handshake; the rest are autosuggest ranking controls forwarded in the
/// connection query string.
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// Sample rate of the stream in samples per second. Required, > 0.
    pub sample_rate: u32,

    /// Encoding label passed to the server
    pub encoding: String,

    /// Two letter code of the language being spoken; empty falls back to
    /// "en"
    pub language: String,

    /// Number of results to return. The server clamps values above its
    /// maximum of 100; the default is 3.
    pub result_count: Option<u32>,

    /// Weight results to give preference to those near this location
    pub focus: Option<Coordinate>,

    /// How many of the results honour the focus; only emitted together with
    /// `focus`
    pub focus_count: Option<u32>,

    /// Only show results for this country
    pub country: Option<String>,

    /// Restrict results to a circle: (center, radius in kilometers). Only
    /// emitted when both halves are present.
    pub circle: Option<(Coordinate, f64)>,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            encoding: DEFAULT_ENCODING.to_string(),
            language: "en".to_string(),
            result_count: None,
            focus: None,
            focus_count: None,
            country: None,
            circle: None,
        }
    }
}

impl SessionParams {
    /// Build the autosuggest query-string fragment.
    ///
    /// Emission order is fixed: language, focus (+ focus count), circle,
    /// result count, country. The fragment starts with `&`; the caller
    /// prepends the endpoint and API key.
    pub fn query_string(&self) -> String {
        let mut query = String::new();

        let language = if self.language.is_empty() {
            "en"
        } else {
            &self.language
        };
        query.push_str(&format!("&voice-language={}", language));

        if let Some(focus) = self.focus {
            query.push_str(&format!("&focus={},{}", focus.lat, focus.lon));

            if let Some(count) = self.focus_count {
                query.push_str(&format!("&n-focus-results={}", count));
            }
        }

        if let Some((center, radius)) = self.circle {
            query.push_str(&format!(
                "&clip-to-circle={},{},{}",
                center.lat, center.lon, radius
            ));
        }

        if let Some(count) = self.result_count {
            query.push_str(&format!("&n-results={}", count));
        }

        if let Some(country) = &self.country {
            query.push_str(&format!("&clip-to-country={}", country));
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_recognition_serialization() {
        let msg = ClientMessage::start_recognition("pcm_f32le", 44100);
        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("\"message\":\"StartRecognition\""));
        assert!(json.contains("\"type\":\"raw\""));
        assert!(json.contains("\"encoding\":\"pcm_f32le\""));
        assert!(json.contains("\"sample_rate\":44100"));
    }

    #[test]
    fn test_end_of_stream_serialization() {
        let msg = ClientMessage::end_of_stream(17);
        let json = serde_json::to_string(&msg).unwrap();

        assert_eq!(json, "{\"message\":\"EndOfStream\",\"last_seq_no\":17}");
    }

    #[test]
    fn test_encode_samples_little_endian() {
        let bytes = encode_samples(&[1.0f32, -1.0]);

        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[0..4], 1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], (-1.0f32).to_le_bytes());
    }

    #[test]
    fn test_decode_sparse_suggestion_keeps_absent_fields() {
        let json = r#"{
            "message": "Suggestions",
            "suggestions": [{ "words": "filled.count.soap" }]
        }"#;

        let suggestions = decode_suggestions(json).unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].words.as_deref(), Some("filled.count.soap"));
        assert_eq!(suggestions[0].country, None);
        assert_eq!(suggestions[0].nearest_place, None);
        assert_eq!(suggestions[0].distance_to_focus_km, None);
        assert_eq!(suggestions[0].rank, None);
        assert_eq!(suggestions[0].language, None);
    }

    #[test]
    fn test_decode_full_suggestion() {
        let json = r#"{
            "message": "Suggestions",
            "suggestions": [{
                "country": "GB",
                "nearestPlace": "Bayswater, London",
                "words": "filled.count.soap",
                "distanceToFocusKm": 2,
                "rank": 1,
                "language": "en"
            }]
        }"#;

        let suggestions = decode_suggestions(json).unwrap();

        assert_eq!(suggestions[0].country.as_deref(), Some("GB"));
        assert_eq!(
            suggestions[0].nearest_place.as_deref(),
            Some("Bayswater, London")
        );
        assert_eq!(suggestions[0].distance_to_focus_km, Some(2));
        assert_eq!(suggestions[0].rank, Some(1));
    }

    #[test]
    fn test_decode_empty_list_is_delivered() {
        let json = r#"{"message": "Suggestions", "suggestions": []}"#;

        assert_eq!(decode_suggestions(json), Some(vec![]));
    }

    #[test]
    fn test_decode_failure_yields_none() {
        assert_eq!(decode_suggestions("not json at all"), None);
        assert_eq!(decode_suggestions("{\"message\": \"Info\"}"), None);
        assert_eq!(decode_suggestions(""), None);
    }

    #[test]
    fn test_query_string_basic_parameters() {
        let params = SessionParams {
            sample_rate: 16000,
            language: "fr".to_string(),
            result_count: Some(5),
            country: Some("FR".to_string()),
            ..Default::default()
        };

        assert_eq!(
            params.query_string(),
            "&voice-language=fr&n-results=5&clip-to-country=FR"
        );
    }

    #[test]
    fn test_query_string_defaults_language_to_en() {
        let params = SessionParams {
            language: String::new(),
            ..Default::default()
        };

        assert_eq!(params.query_string(), "&voice-language=en");
    }

    #[test]
    fn test_query_string_focus_count_requires_focus() {
        let without_focus = SessionParams {
            focus_count: Some(2),
            ..Default::default()
        };
        assert_eq!(without_focus.query_string(), "&voice-language=en");

        let with_focus = SessionParams {
            focus: Some(Coordinate {
                lat: 51.520847,
                lon: -0.195521,
            }),
            focus_count: Some(2),
            ..Default::default()
        };
        assert_eq!(
            with_focus.query_string(),
            "&voice-language=en&focus=51.520847,-0.195521&n-focus-results=2"
        );
    }

    #[test]
    fn test_query_string_full_ordering() {
        let params = SessionParams {
            language: "de".to_string(),
            focus: Some(Coordinate { lat: 52.5, lon: 13.4 }),
            focus_count: Some(1),
            circle: Some((Coordinate { lat: 52.0, lon: 13.0 }, 10.0)),
            result_count: Some(8),
            country: Some("DE".to_string()),
            ..Default::default()
        };

        assert_eq!(
            params.query_string(),
            "&voice-language=de&focus=52.5,13.4&n-focus-results=1\
             &clip-to-circle=52,13,10&n-results=8&clip-to-country=DE"
        );
    }
}
