pub mod engine;
pub mod matching;
pub mod models;
pub mod report;
pub mod synthetic;
pub mod utils;

pub use engine::{DuplicateEngine, RunEvents, StartError};
pub use models::{AdvisorRecord, ClientRecord, DuplicateGroup, EngineEvent, StartRequest};
pub use utils::config::DetectionConfig;
