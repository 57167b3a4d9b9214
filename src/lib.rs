//! Authorization and messaging core for a school-management application.
//!
//! The host authenticates users and loads records; this crate decides what an
//! actor may see or change ([`policy`]) and folds a message list into
//! per-counterpart conversations ([`conversations`]). [`ipc`] exposes both to a
//! host process over newline-delimited JSON on stdio.

pub mod config;
pub mod conversations;
pub mod directory;
pub mod error;
pub mod ipc;
pub mod model;
pub mod policy;

pub use error::PolicyError;
pub use model::{Actor, Child, Message, Operation, Resource, ResourceKind, Role};
pub use policy::{authorize, can_access, filter_visible, scope_filter, Decision, ScopeFilter};
