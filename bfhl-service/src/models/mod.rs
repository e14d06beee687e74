pub mod envelope;
pub mod request;

pub use envelope::{Envelope, ResultData};
pub use request::{BfhlRequest, FunctionalKey, RequestError};
