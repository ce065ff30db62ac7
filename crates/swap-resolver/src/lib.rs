//! swap-resolver
//!
//! Read-only query layer over the resolver registry (§3, §4.5). All
//! mutation goes through `swap_state::engine::SwapEngine`.

pub mod registry;

pub use registry::ResolverRegistry;
