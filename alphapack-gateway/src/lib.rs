pub mod classify;
pub mod coordinator;
pub mod discord;
pub mod fetcher;
pub mod images;
pub mod pipeline;
pub mod report;
pub mod state;
pub mod store;
pub mod typing;

pub use coordinator::{ProcessingRequest, RequestCoordinator, RequestKind, Responder};
pub use fetcher::{FetchError, HistorySource, MessageFetcher, RetryPolicy};
pub use images::{HttpImageLoader, ImageError, ImageLoader};
pub use pipeline::{CountOutcome, CountingPipeline, OccurrenceDirection, TierResolver};
pub use state::AppState;
pub use store::{CountStore, NullCountStore, NullRarityCache, RarityCache};
pub use typing::{TypingManager, TypingPing};
