pub mod change_collector;
pub mod content_synthesizer;
pub mod summary;
pub mod tracker;

pub use change_collector::ChangeCollector;
pub use content_synthesizer::ContentSynthesizer;
pub use tracker::PublicationTracker;
