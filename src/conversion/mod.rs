//! Conversion events: request parameters, URL building and the handler
//! that sends the request.

mod handler;
mod params;

pub use handler::{ConversionHandler, NOT_SENT_MESSAGE};
pub use params::{RequestParameters, REQUIRED_FIELDS};
