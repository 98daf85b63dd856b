use super::{Sector, SymbolInfo, SymbolUniverse, UniverseOrigin};

const EMBEDDED_SYMBOLS: [(&str, Sector, f64); 29] = [
    ("AAPL", Sector::Technology, 185.0),
    ("MSFT", Sector::Technology, 410.0),
    ("GOOGL", Sector::Technology, 140.0),
    ("NVDA", Sector::Technology, 480.0),
    ("AMD", Sector::Technology, 160.0),
    ("INTC", Sector::Technology, 45.0),
    ("JNJ", Sector::Healthcare, 160.0),
    ("UNH", Sector::Healthcare, 520.0),
    ("PFE", Sector::Healthcare, 30.0),
    ("ABBV", Sector::Healthcare, 155.0),
    ("JPM", Sector::Financial, 170.0),
    ("BAC", Sector::Financial, 34.0),
    ("GS", Sector::Financial, 385.0),
    ("V", Sector::Financial, 260.0),
    ("MA", Sector::Financial, 420.0),
    ("AMZN", Sector::Consumer, 150.0),
    ("TSLA", Sector::Consumer, 240.0),
    ("WMT", Sector::Consumer, 160.0),
    ("HD", Sector::Consumer, 345.0),
    ("NKE", Sector::Consumer, 105.0),
    ("META", Sector::Communication, 350.0),
    ("NFLX", Sector::Communication, 480.0),
    ("DIS", Sector::Communication, 92.0),
    ("T", Sector::Communication, 17.0),
    ("XOM", Sector::Energy, 105.0),
    ("CVX", Sector::Energy, 150.0),
    ("COP", Sector::Energy, 115.0),
    ("LIN", Sector::Materials, 410.0),
    ("FCX", Sector::Materials, 40.0),
];

pub fn embedded_symbols() -> Vec<SymbolInfo> {
    EMBEDDED_SYMBOLS
        .iter()
        .map(|(ticker, sector, price)| SymbolInfo::new(ticker, *sector, *price))
        .collect()
}

/// Fixed universe used whenever the external store cannot supply one.
pub fn embedded_universe(reason: impl Into<String>) -> SymbolUniverse {
    SymbolUniverse::new(
        embedded_symbols(),
        UniverseOrigin::Embedded {
            reason: reason.into(),
        },
    )
}
