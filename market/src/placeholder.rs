use common::models::{CoinSnapshot, Currency, WatchList};
use connectors::SymbolResolver;
use tracing::debug;

/// Deterministic zero-valued snapshot shown before the first live cycle settles.
///
/// Same ordering and schema as a live snapshot, so renderers need no special
/// case for the loading state.
pub fn initial(resolver: &SymbolResolver, currency: Currency, symbols: &WatchList) -> Vec<CoinSnapshot> {
    debug!("Placeholder snapshot for {} in {}", symbols, currency);

    symbols
        .iter()
        .map(|symbol| CoinSnapshot::placeholder(symbol, &resolver.display_name(symbol)))
        .collect()
}
