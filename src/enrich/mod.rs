mod message;
mod pipeline;

pub use message::{AuditLogMessage, EnrichedMessage, OrgIdentity, PushEnvelope, PushMessage};
pub use pipeline::{Enricher, MAX_FOLDER_DEPTH};
