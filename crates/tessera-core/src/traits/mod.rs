//! Collaborator traits consumed by the session manager.

mod resolver;
mod store;
mod transport;

pub use resolver::EndpointResolver;
pub use store::SecureStore;
pub use transport::{Method, Transport, TransportRequest, TransportResponse};
