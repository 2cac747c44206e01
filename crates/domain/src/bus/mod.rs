mod request;
mod transport;

pub use request::{ReadRequest, RegisterBank};
pub use transport::BusTransport;
