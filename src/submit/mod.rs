//! Commit submission
//!
//! Handles the workflow of pushing the staging area to the server:
//! 1. Encoding - validate uploads and build the multipart payload
//! 2. Push - refresh the session, upload, clear the store on success

mod encode;
mod progress;
mod push;

pub use encode::{
    PayloadPart, SubmissionPayload, TO_COPY_FIELD, TO_DELETE_FIELD, TO_MOVE_FIELD, encode,
};
pub use progress::{NoopProgress, Phase, ProgressCallback};
pub use push::{PushCoordinator, PushOutcome, PushState};
