//! Strata repository runtime.
//!
//! Wires the event log, the projections and the command handlers into one
//! [`ContentRepository`]: commands go in, events come out, and every consumer
//! observes the new events before the command call returns.
//!
//! # Modules
//!
//! - [`error`] — The top-level [`CoreError`]
//! - [`command`] — The closed [`Command`] set and [`CommandResult`]
//! - [`context`] — [`CommandContext`], the read-side facade with scoped
//!   content stream overrides
//! - [`persister`] — [`EventPersister`], the commit-then-project funnel
//! - [`repository`] — The [`ContentRepository`] entry point

pub mod command;
pub mod context;
pub mod error;
pub mod persister;
pub mod repository;

pub use command::{Command, CommandResult};
pub use context::{CommandContext, ContentStreamOverrideGuard};
pub use error::CoreError;
pub use persister::EventPersister;
pub use repository::ContentRepository;
