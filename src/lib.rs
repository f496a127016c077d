pub mod aggregate;
pub mod country;
pub mod demo_feed;
pub mod feed;
pub mod http_client;
pub mod insight_fetch;
pub mod orchestrator;
pub mod state;
pub mod wca_fetch;
