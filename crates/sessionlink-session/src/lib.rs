//! Session control for sessionlink.
//!
//! This crate decides who is logged in:
//!
//! 1. **Handshake** ([`SessionController`]): completion signal → token
//!    exchange → backend authentication → published user
//! 2. **State** ([`SessionState`], [`SessionWatch`]): the current user or
//!    the last error, observable by any number of subscribers
//! 3. **Events** ([`SessionEvent`]): every transition, in order
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)  ← renders the user, opens the login URL
//!     ↕
//! Session Layer (this crate)  ← owns the current user
//!     ↕                    ↕
//! Provider (identity)   Backend (user directory)
//! ```

mod controller;
mod error;
mod state;
mod watch;

pub use controller::SessionController;
pub use error::LoginError;
pub use state::{SessionConfig, SessionEvent, SessionState};
pub use watch::SessionWatch;
