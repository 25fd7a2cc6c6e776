//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Rich domain types (validated, ready for display)
//! - `wire.rs`: Raw serde structs matching backend responses
//! - `convert.rs`: Validated decode from wire to domain types
//! - `state.rs`: State containers with update methods
//! - `client.rs`: Sub-client with HTTP methods

pub mod discount;
pub mod history;
