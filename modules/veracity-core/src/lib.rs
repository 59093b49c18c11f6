pub mod cache;
pub mod ledger;
pub mod normalize;
pub mod orchestrator;
pub mod progress;
pub mod prompts;
pub mod providers;
pub mod strategies;
pub mod testing;
pub mod traits;

pub use cache::{MemoryCache, ResultCache};
pub use ledger::{Caller, Identity, MemoryLedger, UsageLedger, UsageStatus};
pub use normalize::normalize;
pub use orchestrator::Orchestrator;
pub use progress::{MemoryProgressStore, MonotonicSink, ProgressSink, ProgressStore};
pub use providers::{ChatApi, ChatOutcome, ClaimJudgment, EvidencePage, GroundingApi, SearchApi, Validity};
pub use strategies::{Analyzer, RawAnalysis};
pub use traits::{BackgroundRunner, ContentSource, SessionDirectory, TokioRunner, UserDirectory};
