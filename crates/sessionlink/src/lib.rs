//! # sessionlink
//!
//! Client-side login sessions backed by an external identity provider.
//!
//! sessionlink opens the provider's login page, trades the returned
//! credential for an access token, confirms that token with the
//! application's own user backend, and publishes the resulting user (or
//! the reason there isn't one) to every part of the application that
//! subscribes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sessionlink::prelude::*;
//!
//! # async fn run() -> Result<(), SessionLinkError> {
//! let link = SessionLinkBuilder::from_env().build().await?;
//! if let Some(url) = link.login_url() {
//!     println!("open {url}");
//! }
//! let mut watch = link.subscribe();
//! // ... the host receives the redirect and calls link.complete_login(&redirect)
//! let state = watch.wait_for(|s| s.is_authenticated()).await;
//! # let _ = state;
//! # Ok(())
//! # }
//! ```

mod error;
mod link;
mod logging;

pub use error::SessionLinkError;
pub use link::{DefaultController, SessionLink, SessionLinkBuilder};
pub use logging::{DEFAULT_FILTER, init_tracing};

pub use sessionlink_backend as backend;
pub use sessionlink_protocol as protocol;
pub use sessionlink_provider as provider;
pub use sessionlink_session as session;

/// Everything an application usually needs.
pub mod prelude {
    pub use crate::{SessionLink, SessionLinkBuilder, SessionLinkError, init_tracing};
    pub use sessionlink_backend::{BackendConfig, BackendError, HttpUserBackend, UserBackend};
    pub use sessionlink_protocol::{AccessToken, User, UserId};
    pub use sessionlink_provider::{
        CompletionEvents, IdentityProvider, OidcProvider, ProviderConfig, ProviderError, Url,
    };
    pub use sessionlink_session::{
        LoginError, SessionConfig, SessionController, SessionEvent, SessionState, SessionWatch,
    };
}
