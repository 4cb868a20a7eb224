//! Maps abstract tickers to exchange-specific trading pairs.
//!
//! Resolution is a pure table lookup. A missing pair is reported as `None`
//! (unsupported), which is an expected outcome rather than an error.

use common::models::{normalize_symbol, Currency, Exchange, TradingPair};
use std::collections::HashMap;
use tracing::debug;

const MAX_SYMBOL_LEN: usize = 10;

/// An asset and the markets each exchange lists for it.
#[derive(Debug, Clone)]
pub struct Listing {
    pub symbol: String,
    pub name: String,
    /// Kraken's own asset code (XBT for BTC)
    pub kraken_base: String,
    pub binance: Vec<Currency>,
    pub kraken: Vec<Currency>,
}

impl Listing {
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            kraken_base: symbol.to_string(),
            binance: Vec::new(),
            kraken: Vec::new(),
        }
    }

    pub fn binance(mut self, quotes: &[Currency]) -> Self {
        self.binance = quotes.to_vec();
        self
    }

    pub fn kraken(mut self, quotes: &[Currency]) -> Self {
        self.kraken = quotes.to_vec();
        self
    }

    pub fn kraken_base(mut self, base: &str) -> Self {
        self.kraken_base = base.to_string();
        self
    }

    fn quotes(&self, exchange: Exchange) -> &[Currency] {
        match exchange {
            Exchange::Binance => &self.binance,
            Exchange::Kraken => &self.kraken,
        }
    }
}

const BOTH: &[Currency] = &[Currency::Usd, Currency::Eur];
const USD: &[Currency] = &[Currency::Usd];
const NONE: &[Currency] = &[];

fn default_listings() -> Vec<Listing> {
    vec![
        Listing::new("BTC", "Bitcoin").binance(BOTH).kraken(BOTH).kraken_base("XBT"),
        Listing::new("ETH", "Ethereum").binance(BOTH).kraken(BOTH),
        Listing::new("XRP", "XRP").binance(BOTH).kraken(BOTH),
        Listing::new("SOL", "Solana").binance(BOTH).kraken(BOTH),
        Listing::new("ADA", "Cardano").binance(BOTH).kraken(BOTH),
        Listing::new("DOGE", "Dogecoin").binance(BOTH).kraken(BOTH).kraken_base("XDG"),
        Listing::new("DOT", "Polkadot").binance(BOTH).kraken(BOTH),
        Listing::new("LTC", "Litecoin").binance(BOTH).kraken(BOTH),
        Listing::new("LINK", "Chainlink").binance(BOTH).kraken(BOTH),
        Listing::new("AVAX", "Avalanche").binance(BOTH).kraken(BOTH),
        Listing::new("TRX", "TRON").binance(BOTH).kraken(BOTH),
        Listing::new("SHIB", "Shiba Inu").binance(BOTH).kraken(BOTH),
        Listing::new("XLM", "Stellar").binance(BOTH).kraken(BOTH),
        Listing::new("BNB", "BNB").binance(BOTH).kraken(NONE),
        Listing::new("ATOM", "Cosmos").binance(USD).kraken(BOTH),
        Listing::new("UNI", "Uniswap").binance(USD).kraken(BOTH),
        Listing::new("ALGO", "Algorand").binance(USD).kraken(BOTH),
        Listing::new("PEPE", "Pepe").binance(BOTH).kraken(BOTH),
        Listing::new("SUI", "Sui").binance(USD).kraken(BOTH),
        Listing::new("XMR", "Monero").binance(NONE).kraken(BOTH),
    ]
}

pub struct SymbolResolver {
    listings: HashMap<String, Listing>,
    /// Resolve symbols missing from the catalog against Binance's USDT book
    unlisted_on_binance: bool,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolResolver {
    /// Resolver backed by the built-in catalog.
    pub fn new() -> Self {
        Self::from_listings(default_listings(), true)
    }

    pub fn from_listings(listings: Vec<Listing>, unlisted_on_binance: bool) -> Self {
        Self {
            listings: listings
                .into_iter()
                .map(|listing| (listing.symbol.clone(), listing))
                .collect(),
            unlisted_on_binance,
        }
    }

    /// Display name for a symbol, falling back to the symbol itself.
    pub fn display_name(&self, symbol: &str) -> String {
        let symbol = normalize_symbol(symbol);
        self.listings
            .get(&symbol)
            .map(|listing| listing.name.clone())
            .unwrap_or(symbol)
    }

    pub fn resolve(
        &self,
        symbol: &str,
        currency: Currency,
        exchange: Exchange,
    ) -> Option<TradingPair> {
        let symbol = normalize_symbol(symbol);
        if !is_valid_symbol(&symbol) {
            debug!("Rejecting malformed symbol {:?}", symbol);
            return None;
        }

        let (name, base) = match self.listings.get(&symbol) {
            Some(listing) if listing.quotes(exchange).contains(&currency) => {
                let base = match exchange {
                    Exchange::Binance => listing.symbol.clone(),
                    Exchange::Kraken => listing.kraken_base.clone(),
                };
                (listing.name.clone(), base)
            }
            Some(_) => {
                debug!("{} has no {} market on {}", symbol, currency, exchange);
                return None;
            }
            None if self.unlisted_on_binance
                && exchange == Exchange::Binance
                && currency == Currency::Usd =>
            {
                (symbol.clone(), symbol.clone())
            }
            None => {
                debug!("{} is not listed for {} on {}", symbol, currency, exchange);
                return None;
            }
        };

        let id = match exchange {
            Exchange::Binance => format!("{}{}", base, binance_quote(currency)),
            Exchange::Kraken => format!("{}{}", base, currency.code()),
        };

        Some(TradingPair {
            exchange,
            symbol,
            name,
            currency,
            id,
        })
    }
}

// Binance has no USD book on its global venue; USDT stands in for it
fn binance_quote(currency: Currency) -> &'static str {
    match currency {
        Currency::Usd => "USDT",
        Currency::Eur => "EUR",
    }
}

fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol.chars().all(|c| c.is_ascii_alphanumeric())
}
