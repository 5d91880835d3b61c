//! Ticker spelling rules and the static symbol catalog.
//!
//! The catalog is immutable `'static` data. Components that need it take a
//! `&SymbolCatalog` explicitly instead of reaching for globals.

/// Single-letter suffixes that denote an exchange (London, Frankfurt, Paris).
///
/// Other single letters are read as share classes (BRK.B). A single-letter
/// share class that collides with this list (e.g. a class "F") is kept as an
/// exchange suffix; that ambiguity is known and deliberately not widened.
const SINGLE_LETTER_EXCHANGES: [&str; 3] = ["L", "F", "P"];

/// Canonicalize a ticker to the provider's spelling.
///
/// - `BRK/B`, `BRK.B` -> `BRK-B` (share class)
/// - `BAC.PL` is kept: a 2+ letter uppercase suffix reads as an exchange (`NEO.TO`, `0700.HK`)
/// - `RIO.L` is kept (allow-listed single-letter exchange)
pub fn normalize_ticker_symbol(symbol: &str) -> String {
    let symbol = symbol.replace('/', "-");

    if !symbol.contains('.') {
        return symbol;
    }

    let parts: Vec<&str> = symbol.split('.').collect();
    if parts.len() == 2 && is_exchange_suffix(parts[1]) {
        return symbol;
    }

    symbol.replace('.', "-")
}

fn is_exchange_suffix(suffix: &str) -> bool {
    let len = suffix.chars().count();
    if len == 1 {
        return SINGLE_LETTER_EXCHANGES.contains(&suffix);
    }
    len >= 2 && is_uppercase_token(suffix)
}

/// At least one cased character and no lowercase ones.
fn is_uppercase_token(s: &str) -> bool {
    s.chars().any(|c| c.is_uppercase()) && !s.chars().any(|c| c.is_lowercase())
}

/// Market keys, category groupings and sector lookups.
#[derive(Debug)]
pub struct SymbolCatalog {
    market_symbols: &'static [(&'static str, &'static str)],
    categories: &'static [(&'static str, &'static [&'static str])],
    display_names: &'static [(&'static str, &'static str)],
    sector_aliases: &'static [(&'static str, &'static str)],
    sector_display_names: &'static [(&'static str, &'static str)],
    overview_keys: &'static [&'static str],
}

impl SymbolCatalog {
    pub fn standard() -> &'static SymbolCatalog {
        &STANDARD_CATALOG
    }

    /// Provider symbol for a market key (`sp500` -> `^GSPC`)
    pub fn market_symbol(&self, key: &str) -> Option<&'static str> {
        lookup(self.market_symbols, key)
    }

    pub fn is_market_key(&self, key: &str) -> bool {
        self.market_symbol(key).is_some()
    }

    /// The catalog's own copy of a market key
    pub fn market_key(&self, key: &str) -> Option<&'static str> {
        self.market_symbols
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(k, _)| *k)
    }

    /// Market keys grouped under a category name
    pub fn category(&self, name: &str) -> Option<&'static [&'static str]> {
        self.categories
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, keys)| *keys)
    }

    pub fn display_name(&self, key: &str) -> Option<&'static str> {
        lookup(self.display_names, key)
    }

    /// Sector ETF for a sector alias (`technology` -> `XLK`)
    pub fn sector_symbol(&self, alias: &str) -> Option<&'static str> {
        lookup(self.sector_aliases, alias)
    }

    pub fn sector_display_name(&self, etf_symbol: &str) -> Option<&'static str> {
        lookup(self.sector_display_names, etf_symbol)
    }

    /// Keys shown on the full markets overview
    pub fn overview_keys(&self) -> &'static [&'static str] {
        self.overview_keys
    }

    /// Categories used when a snapshot request names none.
    /// Cash indices while the US session is open, futures otherwise.
    pub fn default_snapshot_categories(&self, us_market_open: bool) -> Vec<&'static str> {
        let lead = if us_market_open { "us" } else { "futures" };
        let mut categories = vec![lead];
        categories.extend_from_slice(&[
            "volatility",
            "commodities",
            "rates",
            "sectors",
            "styles",
            "crypto",
            "europe",
            "asia",
            "currencies",
        ]);
        categories
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

static STANDARD_CATALOG: SymbolCatalog = SymbolCatalog {
    market_symbols: MARKET_SYMBOLS,
    categories: CATEGORIES,
    display_names: DISPLAY_NAMES,
    sector_aliases: SECTOR_ALIASES,
    sector_display_names: SECTOR_DISPLAY_NAMES,
    overview_keys: OVERVIEW_KEYS,
};

const MARKET_SYMBOLS: &[(&str, &str)] = &[
    // US indices
    ("sp500", "^GSPC"),
    ("nasdaq", "^IXIC"),
    ("dow", "^DJI"),
    ("russell2000", "^RUT"),
    // Futures
    ("es_futures", "ES=F"),
    ("nq_futures", "NQ=F"),
    ("ym_futures", "YM=F"),
    ("rty_futures", "RTY=F"),
    // Europe
    ("stoxx50", "^STOXX50E"),
    ("dax", "^GDAXI"),
    ("ftse", "^FTSE"),
    ("cac40", "^FCHI"),
    // Asia / Pacific
    ("nikkei", "^N225"),
    ("hangseng", "^HSI"),
    ("shanghai", "000001.SS"),
    ("kospi", "^KS11"),
    ("nifty50", "^NSEI"),
    ("asx200", "^AXJO"),
    ("taiwan", "^TWII"),
    // Latin America
    ("bovespa", "^BVSP"),
    // Crypto
    ("btc", "BTC-USD"),
    ("eth", "ETH-USD"),
    ("sol", "SOL-USD"),
    // Commodities
    ("gold", "GC=F"),
    ("silver", "SI=F"),
    ("oil_wti", "CL=F"),
    ("oil_brent", "BZ=F"),
    ("natgas", "NG=F"),
    // Rates
    ("us10y", "^TNX"),
    ("us2y", "^IRX"),
    ("us30y", "^TYX"),
    // Volatility
    ("vix", "^VIX"),
    // Currencies
    ("eurusd", "EURUSD=X"),
    ("usdjpy", "JPY=X"),
    ("usdcny", "CNY=X"),
    ("gbpusd", "GBPUSD=X"),
    ("usdcad", "CAD=X"),
    ("audusd", "AUDUSD=X"),
    // GICS sector ETFs
    ("tech", "XLK"),
    ("financials", "XLF"),
    ("energy", "XLE"),
    ("healthcare", "XLV"),
    ("consumer_disc", "XLY"),
    ("consumer_stpl", "XLP"),
    ("industrials", "XLI"),
    ("utilities", "XLU"),
    ("materials", "XLB"),
    ("real_estate", "XLRE"),
    ("communication", "XLC"),
    // Style factor ETFs
    ("momentum", "MTUM"),
    ("value", "VTV"),
    ("growth", "VUG"),
    ("quality", "QUAL"),
    ("small_cap", "IWM"),
    // Private credit proxy
    ("private_credit", "BIZD"),
];

const SECTOR_KEYS: &[&str] = &[
    "tech",
    "financials",
    "healthcare",
    "energy",
    "consumer_disc",
    "industrials",
    "materials",
    "utilities",
    "consumer_stpl",
    "real_estate",
    "communication",
];

const STYLE_KEYS: &[&str] = &["momentum", "value", "growth", "quality", "small_cap"];

const CATEGORIES: &[(&str, &[&str])] = &[
    ("us", &["sp500", "nasdaq", "dow", "russell2000"]),
    ("futures", &["es_futures", "nq_futures", "ym_futures"]),
    ("volatility", &["vix"]),
    ("commodities", &["gold", "oil_wti", "natgas"]),
    ("rates", &["us10y"]),
    ("crypto", &["btc", "eth", "sol"]),
    ("europe", &["stoxx50", "dax", "ftse", "cac40"]),
    ("asia", &["nikkei", "hangseng", "shanghai"]),
    (
        "currencies",
        &["eurusd", "usdjpy", "usdcny", "gbpusd", "usdcad", "audusd"],
    ),
    ("bonds", &["us10y", "us2y", "us30y"]),
    ("sectors", SECTOR_KEYS),
    ("styles", STYLE_KEYS),
    ("factors", &["vix", "gold", "oil_wti", "natgas", "us10y"]),
    (
        "all",
        &[
            "es_futures", "nq_futures", "ym_futures",
            "vix", "gold", "oil_wti", "natgas", "us10y",
            "sp500", "nasdaq", "dow", "russell2000",
            "stoxx50", "dax", "ftse", "cac40",
            "nikkei", "hangseng", "shanghai",
            "btc", "eth", "sol",
            "eurusd", "usdjpy", "usdcny", "gbpusd", "usdcad", "audusd",
            "tech", "financials", "healthcare", "energy", "consumer_disc",
            "industrials", "materials", "utilities", "consumer_stpl", "real_estate", "communication",
            "momentum", "value", "growth", "quality", "small_cap",
        ],
    ),
];

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("es_futures", "S&P 500"),
    ("nq_futures", "Nasdaq"),
    ("ym_futures", "Dow"),
    ("gold", "Gold"),
    ("btc", "Bitcoin"),
    ("vix", "VIX"),
    ("oil_wti", "Oil WTI"),
    ("natgas", "Nat Gas"),
    ("us10y", "US 10Y"),
    ("sp500", "S&P 500"),
    ("nasdaq", "Nasdaq"),
    ("dow", "Dow"),
    ("russell2000", "Russell 2000"),
    ("stoxx50", "EU Stoxx50"),
    ("dax", "DE DAX"),
    ("ftse", "UK FTSE"),
    ("cac40", "FR CAC40"),
    ("nikkei", "JP Nikkei"),
    ("hangseng", "HK HSI"),
    ("shanghai", "CN Shanghai"),
    ("kospi", "KR KOSPI"),
    ("nifty50", "IN Nifty50"),
    ("asx200", "AU ASX200"),
    ("taiwan", "TW TWSE"),
    ("bovespa", "BR Bovespa"),
    ("eth", "Ethereum"),
    ("sol", "Solana"),
    ("eurusd", "EUR/USD"),
    ("usdjpy", "USD/JPY"),
    ("usdcny", "USD/CNY"),
    ("gbpusd", "GBP/USD"),
    ("usdcad", "USD/CAD"),
    ("audusd", "AUD/USD"),
    ("tech", "Technology"),
    ("financials", "Financials"),
    ("healthcare", "Healthcare"),
    ("energy", "Energy"),
    ("consumer_disc", "Cons Discr"),
    ("industrials", "Industrials"),
    ("materials", "Materials"),
    ("utilities", "Utilities"),
    ("consumer_stpl", "Cons Staples"),
    ("real_estate", "Real Estate"),
    ("communication", "Communication"),
    ("momentum", "Momentum"),
    ("value", "Value"),
    ("growth", "Growth"),
    ("quality", "Quality"),
    ("small_cap", "Small Cap"),
    ("private_credit", "Private Credit"),
];

const SECTOR_ALIASES: &[(&str, &str)] = &[
    ("tech", "XLK"),
    ("technology", "XLK"),
    ("financials", "XLF"),
    ("healthcare", "XLV"),
    ("health", "XLV"),
    ("energy", "XLE"),
    ("consumer_disc", "XLY"),
    ("consumer_discretionary", "XLY"),
    ("industrials", "XLI"),
    ("materials", "XLB"),
    ("utilities", "XLU"),
    ("consumer_stpl", "XLP"),
    ("consumer_staples", "XLP"),
    ("real_estate", "XLRE"),
    ("realestate", "XLRE"),
    ("communication", "XLC"),
    ("communications", "XLC"),
    ("comm", "XLC"),
];

const SECTOR_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("XLK", "Technology"),
    ("XLF", "Financials"),
    ("XLV", "Healthcare"),
    ("XLE", "Energy"),
    ("XLY", "Consumer Discretionary"),
    ("XLI", "Industrials"),
    ("XLB", "Materials"),
    ("XLU", "Utilities"),
    ("XLP", "Consumer Staples"),
    ("XLRE", "Real Estate"),
    ("XLC", "Communication Services"),
];

const OVERVIEW_KEYS: &[&str] = &[
    "sp500", "nasdaq", "dow", "russell2000",
    "es_futures", "nq_futures", "ym_futures",
    "nikkei", "hangseng", "shanghai", "kospi", "nifty50", "asx200", "taiwan",
    "stoxx50",
    "bovespa",
    "btc", "eth", "sol",
    "tech", "financials", "healthcare", "energy", "consumer_disc", "consumer_stpl",
    "industrials", "utilities", "materials", "real_estate", "communication",
    "momentum", "value", "growth", "quality", "small_cap",
    "private_credit",
    "gold", "oil_wti", "natgas",
    "vix", "us10y",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_becomes_hyphen() {
        assert_eq!(normalize_ticker_symbol("BRK/B"), "BRK-B");
        assert_eq!(normalize_ticker_symbol("BAC/PL"), "BAC-PL");
    }

    #[test]
    fn test_share_class_period_becomes_hyphen() {
        assert_eq!(normalize_ticker_symbol("BRK.B"), "BRK-B");
        assert_eq!(normalize_ticker_symbol("BRK.A"), "BRK-A");
        assert_eq!(normalize_ticker_symbol("brk.b"), "brk-b");
    }

    #[test]
    fn test_exchange_suffix_kept() {
        assert_eq!(normalize_ticker_symbol("NEO.TO"), "NEO.TO");
        assert_eq!(normalize_ticker_symbol("0700.HK"), "0700.HK");
        assert_eq!(normalize_ticker_symbol("BHP.AX"), "BHP.AX");
        assert_eq!(normalize_ticker_symbol("RIO.L"), "RIO.L");
        assert_eq!(normalize_ticker_symbol("SAP.F"), "SAP.F");
    }

    #[test]
    fn test_lowercase_suffix_is_not_exchange() {
        assert_eq!(normalize_ticker_symbol("ABC.to"), "ABC-to");
    }

    #[test]
    fn test_multiple_periods_all_replaced() {
        assert_eq!(normalize_ticker_symbol("A.B.C"), "A-B-C");
    }

    #[test]
    fn test_plain_symbols_pass_through() {
        for s in ["AAPL", "^GSPC", "ES=F", "BTC-USD", ""] {
            assert_eq!(normalize_ticker_symbol(s), s);
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["BRK.B", "BRK/B", "NEO.TO", "RIO.L", "A.B.C", "0700.HK", "ABC.to", "AAPL"] {
            let once = normalize_ticker_symbol(raw);
            assert_eq!(normalize_ticker_symbol(&once), once, "not idempotent for {}", raw);
        }
    }

    #[test]
    fn test_catalog_lookups() {
        let catalog = SymbolCatalog::standard();
        assert_eq!(catalog.market_symbol("sp500"), Some("^GSPC"));
        assert_eq!(catalog.sector_symbol("technology"), Some("XLK"));
        assert_eq!(catalog.sector_display_name("XLRE"), Some("Real Estate"));
        assert_eq!(catalog.display_name("vix"), Some("VIX"));
        assert!(catalog.category("nope").is_none());
        assert_eq!(catalog.category("sectors").map(|k| k.len()), Some(11));
    }

    #[test]
    fn test_every_category_key_resolves() {
        let catalog = SymbolCatalog::standard();
        for (name, keys) in CATEGORIES {
            for key in keys.iter() {
                assert!(catalog.is_market_key(key), "{} in {} has no symbol", key, name);
            }
        }
        for key in catalog.overview_keys() {
            assert!(catalog.is_market_key(key), "overview key {} has no symbol", key);
        }
    }

    #[test]
    fn test_default_snapshot_categories_follow_session() {
        let catalog = SymbolCatalog::standard();
        assert_eq!(catalog.default_snapshot_categories(true)[0], "us");
        assert_eq!(catalog.default_snapshot_categories(false)[0], "futures");
        assert_eq!(catalog.default_snapshot_categories(false).len(), 10);
    }
}
