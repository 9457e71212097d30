//! Resolver handlers for the Lambda host.

pub mod resolver;

pub use resolver::{HandlerError, ResolverEvent, ResolverHandler, ResolverInfo};
