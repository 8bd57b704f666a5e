//! Service modules for the analysis pipeline

pub mod archive_extractor;
pub mod batch_orchestrator;
pub mod extension_policy;
pub mod file_discoverer;
pub mod project_runner;
pub mod reasoning;

pub use archive_extractor::{ArchiveExtractor, ExtractError, ExtractionReport, ExtractionStatus};
pub use batch_orchestrator::{BatchError, BatchLimits, BatchOrchestrator};
pub use extension_policy::{detect_language, ExtensionPolicy};
pub use file_discoverer::{DiscoveryError, DiscoveryResult, FileDiscoverer};
pub use project_runner::{BatchRunReport, PersistenceSettings, ProjectRunner, RunError};
pub use reasoning::{
    ChatCompletionsProvider, ReasoningClient, ReasoningError, ReasoningProvider,
    ReasoningSettings, SlidingWindowRateLimiter,
};
