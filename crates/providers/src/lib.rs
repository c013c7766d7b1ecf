//! Provider registry and request-time resolution for OpenAI-compatible chat
//! endpoints.
//!
//! Everything here is a pure function of a migrated [`UserConfig`] and a
//! [`Session`]. Nothing performs I/O.
//!
//! [`UserConfig`]: chatbox_config::UserConfig

pub mod endpoint;
pub mod legacy;
pub mod models;
pub mod registry;
pub mod request;
pub mod secrets;
pub mod session;

pub use {
    endpoint::{
        ParsedEndpoint, create_provider_id, custom_provider_from_endpoint,
        parse_chat_completions_endpoint_url,
    },
    models::{model_value, resolve_model_name},
    registry::{
        EndpointType, Provider, ProviderRegistry, list_providers,
        resolve_provider_chat_endpoint_url,
    },
    request::{ResolvedRequest, resolve_endpoint_type, resolve_provider_id, resolve_request},
    secrets::{build_provider_secret_update, resolve_secret},
    session::Session,
};
