//! Atlassian OAuth 2.0 (3LO): token endpoint client, state/session stores and
//! the callback flow that ties them together.

pub mod client;
pub mod flow;
pub mod session;

pub use client::{AccessibleResource, AtlassianOAuthClient, OAuthError, TokenResponse};
pub use session::{Session, SessionInfo, SessionStore, StateStore};
