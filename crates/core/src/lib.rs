pub mod auth;
pub mod config;
pub mod content;
pub mod converter;
pub mod delivery;
pub mod downloader;
pub mod metrics;
pub mod pipeline;
pub mod preferences;
pub mod source;
pub mod testing;

pub use auth::{AllowList, AuthError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use content::{classify, Artifact, Classification, MimeCategory};
pub use converter::{ConverterError, FfmpegTranscoder, Transcoder};
pub use delivery::{
    Chat, ChatPlatform, ChatTarget, DeliveryDispatcher, DeliveryError, DeliveryMode,
    IncomingMessage, PhotoSize, Sender, StatusRelay, TelegramClient, Update,
};
pub use downloader::{DownloadError, HttpDownloader, ProgressEvent};
pub use pipeline::{
    DeliveryOutcome, PipelineError, PipelineOrchestrator, PipelineReport, PipelineRequest,
    PipelineStage, StatusEvent,
};
pub use preferences::{JobPreferences, PreferenceStore, UserId};
pub use source::{FetchPlan, SourceError, SourceResolver};
