//! Validation of user-pasted chat-completions URLs, and provider records
//! built from them.

use {serde::Serialize, tracing::debug, url::Url};

use chatbox_config::{
    CustomProvider, ensure_unique_provider_id, normalize_provider_id,
    schema::{DEFAULT_CHAT_COMPLETIONS_PATH, DEFAULT_COMPLETIONS_PATH},
};

const CHAT_COMPLETIONS_SUFFIX: &str = "/chat/completions";
const COMPLETIONS_SUFFIX: &str = "/completions";

/// Outcome of checking a pasted endpoint. Both URLs are empty when invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEndpoint {
    pub valid: bool,
    pub chat_completions_url: String,
    pub completions_url: String,
}

impl ParsedEndpoint {
    fn invalid() -> Self {
        Self {
            valid: false,
            chat_completions_url: String::new(),
            completions_url: String::new(),
        }
    }
}

/// Accepts an absolute URL whose path ends in `/chat/completions` (any case,
/// trailing slashes ignored) and derives the sibling `/completions` URL. The
/// query string is kept on both. URLs carrying a fragment are rejected.
#[must_use]
pub fn parse_chat_completions_endpoint_url(input: &str) -> ParsedEndpoint {
    let normalized = input.trim().trim_end_matches('/');
    if normalized.is_empty() {
        return ParsedEndpoint::invalid();
    }
    let mut url = match Url::parse(normalized) {
        Ok(url) if !url.cannot_be_a_base() => url,
        Ok(_) => {
            debug!("endpoint url cannot carry a path");
            return ParsedEndpoint::invalid();
        },
        Err(error) => {
            debug!(error = %error, "endpoint url does not parse");
            return ParsedEndpoint::invalid();
        },
    };
    if url.fragment().is_some() {
        debug!("endpoint url carries a fragment");
        return ParsedEndpoint::invalid();
    }

    let path = url.path().trim_end_matches('/').to_string();
    if !path.to_ascii_lowercase().ends_with(CHAT_COMPLETIONS_SUFFIX) {
        return ParsedEndpoint::invalid();
    }
    let prefix = &path[..path.len() - CHAT_COMPLETIONS_SUFFIX.len()];

    url.set_path(&path);
    let chat_completions_url = url.as_str().trim_end_matches('/').to_string();
    url.set_path(&format!("{prefix}{COMPLETIONS_SUFFIX}"));
    let completions_url = url.as_str().trim_end_matches('/').to_string();

    ParsedEndpoint {
        valid: true,
        chat_completions_url,
        completions_url,
    }
}

/// Id for a provider about to be created: the normalized `name`, or
/// `custom-provider-{n}` when it normalizes to nothing, made unique against
/// both id lists.
#[must_use]
pub fn create_provider_id<S: AsRef<str>>(name: &str, existing_ids: &[S], reserved_ids: &[S]) -> String {
    let used = existing_ids
        .iter()
        .chain(reserved_ids)
        .map(|id| normalize_provider_id(id.as_ref()))
        .filter(|id| !id.is_empty())
        .collect();
    let preferred = match normalize_provider_id(name) {
        id if id.is_empty() => format!("custom-provider-{}", existing_ids.len() + 1),
        id => id,
    };
    ensure_unique_provider_id(&preferred, &used)
}

/// Stored record for a provider created from a validated endpoint.
#[must_use]
pub fn custom_provider_from_endpoint(
    id: impl Into<String>,
    name: impl Into<String>,
    endpoint: &ParsedEndpoint,
) -> CustomProvider {
    CustomProvider {
        id: id.into(),
        name: name.into(),
        base_url: String::new(),
        chat_completions_path: DEFAULT_CHAT_COMPLETIONS_PATH.to_string(),
        completions_path: DEFAULT_COMPLETIONS_PATH.to_string(),
        chat_completions_url: endpoint.chat_completions_url.clone(),
        completions_url: endpoint.completions_url.clone(),
        enabled: true,
        allow_legacy_response_field: true,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(
        "https://api.example.com/v1/chat/completions",
        "https://api.example.com/v1/chat/completions",
        "https://api.example.com/v1/completions"
    )]
    #[case(
        "  https://api.example.com/v1/chat/completions///  ",
        "https://api.example.com/v1/chat/completions",
        "https://api.example.com/v1/completions"
    )]
    #[case(
        "https://api.example.com/v1/chat/completions?api-version=2024-02-01",
        "https://api.example.com/v1/chat/completions?api-version=2024-02-01",
        "https://api.example.com/v1/completions?api-version=2024-02-01"
    )]
    #[case(
        "https://api.example.com/v1/chat/completions/?a=1",
        "https://api.example.com/v1/chat/completions?a=1",
        "https://api.example.com/v1/completions?a=1"
    )]
    #[case(
        "https://api.example.com/Chat/Completions",
        "https://api.example.com/Chat/Completions",
        "https://api.example.com/completions"
    )]
    #[case(
        "http://localhost:8000/chat/completions",
        "http://localhost:8000/chat/completions",
        "http://localhost:8000/completions"
    )]
    fn accepts_chat_completions_urls(
        #[case] input: &str,
        #[case] chat: &str,
        #[case] completions: &str,
    ) {
        let parsed = parse_chat_completions_endpoint_url(input);
        assert!(parsed.valid, "{input} should be accepted");
        assert_eq!(parsed.chat_completions_url, chat);
        assert_eq!(parsed.completions_url, completions);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("api.example.com/v1/chat/completions")]
    #[case("https://api.example.com/v1/chat/completions#frag")]
    #[case("https://api.example.com/v1/chat/completions#")]
    #[case("https://api.example.com/v1/completions")]
    #[case("https://api.example.com/v1/chat/completions/extra")]
    #[case("https://api.example.com/v1/chat-completions")]
    #[case("mailto:chat/completions")]
    fn rejects_other_urls(#[case] input: &str) {
        assert_eq!(
            parse_chat_completions_endpoint_url(input),
            ParsedEndpoint::invalid()
        );
    }

    #[test]
    fn derived_completions_url_round_trips() {
        let first = parse_chat_completions_endpoint_url("https://h.example.com/api/chat/completions?x=1");
        let second = parse_chat_completions_endpoint_url(&first.chat_completions_url);
        assert_eq!(first, second);
    }

    #[test]
    fn provider_id_avoids_existing_and_reserved_ids() {
        let existing = ["my-proxy".to_string()];
        let reserved = ["OpenAI".to_string()];
        assert_eq!(create_provider_id("My Proxy", &existing, &reserved), "my-proxy-2");
        assert_eq!(create_provider_id("openai", &existing, &reserved), "openai-2");
        assert_eq!(create_provider_id("!!", &existing, &reserved), "custom-provider-2");
    }

    #[test]
    fn provider_from_endpoint_uses_explicit_urls() {
        let endpoint = parse_chat_completions_endpoint_url("https://x.example.com/v1/chat/completions");
        let provider = custom_provider_from_endpoint("x", "X", &endpoint);
        assert_eq!(provider.chat_completions_url, "https://x.example.com/v1/chat/completions");
        assert_eq!(provider.completions_url, "https://x.example.com/v1/completions");
        assert!(provider.enabled);
        assert!(provider.allow_legacy_response_field);
        assert!(provider.base_url.is_empty());
    }
}
