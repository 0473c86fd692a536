mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    QueueSettings, ServerSettings, Settings, StorageSettings, SummarizerSettings, UploadSettings,
};
