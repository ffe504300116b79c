//! Embeddable authentication and authorization toolkit.
//!
//! The crate is organized around three seams:
//!
//! - [`Authenticator`] drives the identity-session lifecycle over one of
//!   three interchangeable [`backend`] storage strategies, selected at
//!   construction through [`BackendConfig`];
//! - [`Authorizer`] resolves role-based permissions with terminal per-user
//!   overrides;
//! - [`ApiKeyValidator`] checks API keys statelessly, without opening a
//!   session.
//!
//! Storage, marker transport, clock, and credential verification are all
//! injected traits, so the toolkit embeds in any host without carrying its
//! own I/O.

pub mod apikey;
pub mod authenticator;
pub mod backend;
pub mod error;
pub mod request;
pub mod resolver;
pub mod transport;
pub mod verifier;

pub use apikey::ApiKeyValidator;
pub use authenticator::{
    AuthBuilder, Authenticator, BackendConfig, Credentials, DEFAULT_EXPIRE_SECS,
    DEFAULT_SUSPEND_SECS,
};
pub use backend::{ClientBlobBackend, RecordBackend, ServerKeyedBackend, SessionBackend};
pub use error::AuthError;
pub use request::RequestMeta;
pub use resolver::{
    Authorizer, NewResource, NewRole, ResourceRecord, ResourceRef, RoleRecord, RoleRef, SubjectRef,
};
pub use transport::{InMemoryTransport, MarkerTransport, TransportError};
pub use verifier::{CredentialVerifier, FnVerifier, PlainVerifier};

#[cfg(test)]
mod integration_tests;
