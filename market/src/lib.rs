pub mod aggregator;
pub mod config;
pub mod placeholder;
pub mod poller;

pub use aggregator::Aggregator;
pub use config::{MarketConfig, PollIntervals};
pub use poller::{PollConfig, Poller, PollerState, Snapshot};
