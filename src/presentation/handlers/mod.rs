mod events;
mod health;
mod upload;

pub use events::{events_handler, BlobEvent, BlobEventsRequest};
pub use health::health_handler;
pub use upload::{upload_handler, ErrorResponse, UploadResponse};
