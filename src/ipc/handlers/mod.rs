pub mod core;
pub mod messages;
pub mod policy;
