//! Shared types for sessionlink.
//!
//! This crate defines the values every other layer passes around:
//!
//! - **Types** ([`User`], [`AccessToken`], [`CompletionSignal`], etc.):
//!   the user record, the bearer token, and the "login finished" signal.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how HTTP bodies are
//!   turned into those types.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! ```text
//! Provider (token)  ─┐
//!                    ├→ Session controller (User state)
//! Backend (User)    ─┘
//!          ↑ all of them speak in terms of this crate's types
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{AccessToken, CompletionSignal, LoginResponse, User, UserId};
