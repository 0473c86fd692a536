mod blob_key;
mod letter_fields;
mod letter_record;

pub use blob_key::BlobKey;
pub use letter_fields::LetterFields;
pub use letter_record::{EnrichmentUpdate, LetterRecord, RecordStatus};
