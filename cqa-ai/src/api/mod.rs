//! HTTP API handlers for cqa-ai

pub mod analytics;
pub mod archives;
pub mod assessments;
pub mod batches;
pub mod health;
pub mod kinds;
pub mod projects;

pub use analytics::analytics_routes;
pub use archives::archive_routes;
pub use assessments::assessment_routes;
pub use batches::batch_routes;
pub use health::health_routes;
pub use kinds::kind_routes;
pub use projects::project_routes;
