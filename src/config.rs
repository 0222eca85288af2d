//! Client configuration
//!
//! Connection settings for the recognition service: the API key and the
//! WebSocket endpoint, with the key readable from the environment.

/// Production endpoint of the voice autosuggest service
pub const DEFAULT_ENDPOINT: &str = "wss://voiceapi.what3words.com/v1/autosuggest";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "W3W_API_KEY";

/// Connection settings for the autosuggest service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent in the connection query string
    pub api_key: String,
    /// WebSocket endpoint; override for self-hosted deployments
    pub endpoint: String,
}

impl ClientConfig {
    /// Config for the production endpoint with the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Replace the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Build a config with the key taken from the environment, or `None`
    /// when it is unset or empty
    pub fn from_env() -> Option<Self> {
        api_key_from_env().map(Self::new)
    }
}

/// Get the voice API key from the environment
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_production_endpoint() {
        let config = ClientConfig::new("abc123");

        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_with_endpoint_overrides() {
        let config = ClientConfig::new("abc123").with_endpoint("ws://localhost:9000/v1");

        assert_eq!(config.endpoint, "ws://localhost:9000/v1");
    }

    #[test]
    fn test_api_key_from_env_does_not_panic() {
        // Value depends on the environment; just verify the call is safe.
        let _ = api_key_from_env();
    }
}
