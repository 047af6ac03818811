pub mod adapter;
pub mod aggregator;
pub mod breaking_news;
pub mod business_news;
pub mod company_news;
pub mod public_feed;
pub mod sentiment_tagged;

pub use adapter::SourceAdapter;
pub use aggregator::{Aggregator, AggregationMode};
pub use breaking_news::BreakingNewsAdapter;
pub use business_news::BusinessNewsAdapter;
pub use company_news::CompanyNewsAdapter;
pub use public_feed::PublicFeedAdapter;
pub use sentiment_tagged::SentimentTaggedAdapter;
