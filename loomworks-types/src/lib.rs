//! Shared domain types for the Loomworks offline data core.
//!
//! Loomworks is a mobile-first purchase-order and quality-record tool for
//! textile trading. This crate holds the types every other layer speaks:
//! the entity-kind tags and generic records, the durable mutation-queue
//! entries, form draft buffers, and the owner identity that scopes all
//! remote access.

mod draft;
mod entity;
mod mutation;

pub use draft::{Draft, DraftKind};
pub use entity::{next_local_id, EntityKind, OwnerId, Record};
pub use mutation::{MutationAction, QueuedMutation};
