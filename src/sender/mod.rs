pub mod http;
pub mod response;
pub mod transport;

pub use http::{ClientConfig, HttpTransport, build_bulk_endpoint, build_event_endpoint};
pub use response::{check_response, classify};
pub use transport::{Stream, Transport, TransportError, TransportResponse};
