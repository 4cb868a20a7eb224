use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Trims and uppercases a ticker as typed by the user.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Ordered set of unique uppercase symbols the user wants displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct WatchList {
    symbols: Vec<String>,
}

impl WatchList {
    /// Normalizes every entry, dropping blanks and later duplicates.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for symbol in symbols {
            let symbol = normalize_symbol(symbol.as_ref());
            if !symbol.is_empty() && !list.contains(&symbol) {
                list.symbols.push(symbol);
            }
        }
        list
    }

    /// Parses a comma separated list such as `BTC,eth, XRP`.
    pub fn parse(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn add(&mut self, symbol: &str) -> Result<()> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(Error::ParseError("Symbol must not be empty".to_string()));
        }
        if self.contains(&symbol) {
            return Err(Error::Conflict(format!("{} is already in the watch-list", symbol)));
        }
        self.symbols.push(symbol);
        Ok(())
    }

    /// Removes a symbol. The last remaining symbol is kept.
    pub fn remove(&mut self, symbol: &str) -> Result<()> {
        let symbol = normalize_symbol(symbol);
        let index = self
            .symbols
            .iter()
            .position(|s| *s == symbol)
            .ok_or_else(|| Error::NotFound(format!("{} is not in the watch-list", symbol)))?;

        if self.symbols.len() == 1 {
            return Err(Error::Conflict(
                "The watch-list must keep at least one symbol".to_string(),
            ));
        }

        self.symbols.remove(index);
        Ok(())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl From<Vec<String>> for WatchList {
    fn from(symbols: Vec<String>) -> Self {
        Self::new(symbols)
    }
}

impl From<WatchList> for Vec<String> {
    fn from(list: WatchList) -> Self {
        list.symbols
    }
}

impl std::fmt::Display for WatchList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.symbols.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_deduplicates_in_order() {
        let list = WatchList::new(["btc", " ETH ", "BTC", "", "xrp"]);
        assert_eq!(list.symbols(), ["BTC", "ETH", "XRP"]);
        assert_eq!(WatchList::parse("sol, ada,SOL").symbols(), ["SOL", "ADA"]);
    }

    #[test]
    fn add_rejects_duplicates_and_blanks() {
        let mut list = WatchList::parse("BTC,ETH");
        list.add("sol").unwrap();
        assert!(matches!(list.add(" eth"), Err(Error::Conflict(_))));
        assert!(matches!(list.add("   "), Err(Error::ParseError(_))));
        assert_eq!(list.symbols(), ["BTC", "ETH", "SOL"]);
    }

    #[test]
    fn remove_keeps_the_last_symbol() {
        let mut list = WatchList::parse("BTC,ETH");
        list.remove("btc").unwrap();
        assert!(matches!(list.remove("ETH"), Err(Error::Conflict(_))));
        assert!(matches!(list.remove("DOGE"), Err(Error::NotFound(_))));
        assert_eq!(list.symbols(), ["ETH"]);
    }

    #[test]
    fn deserializes_from_array() {
        let list: WatchList = serde_json::from_str(r#"["btc","BTC","eth"]"#).unwrap();
        assert_eq!(list.to_string(), "BTC,ETH");
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["BTC","ETH"]"#);
    }
}
