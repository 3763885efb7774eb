//! Room membership and message distribution engine for the idobata chat
//! backend.
//!
//! This library owns room lifecycle (creation, membership changes,
//! direct-room deduplication), message ordering and persistence, read-state
//! transitions, unread accounting, and live fan-out of new messages and
//! ephemeral events to subscribed connections.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
