mod analysis;
mod coin;
mod market;
mod price;
mod watchlist;

pub use analysis::{MarketAnalysis, Sentiment};
pub use coin::{color_for, CoinSnapshot};
pub use market::{Currency, Exchange};
pub use price::{HistoryPoint, TradingPair, HISTORY_LEN};
pub use watchlist::{normalize_symbol, WatchList};
