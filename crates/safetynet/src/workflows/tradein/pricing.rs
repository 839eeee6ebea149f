use super::domain::{DeviceCondition, Pesos};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Price returned when no key matches: low-end budget handset.
pub const DEFAULT_BASE_PRICE: Pesos = 4000;

/// Second-hand buyback prices for excellent-condition devices.
///
/// Entries are matched in order against the lowercased model name, so specific keys must
/// precede their prefixes (`iphone 15 pro max` before `iphone 15`).
const STANDARD_PRICES: &[(&str, Pesos)] = &[
    ("iphone 15 pro max", 52_000),
    ("iphone 15 pro", 45_000),
    ("iphone 15", 38_000),
    ("iphone 14 pro max", 42_000),
    ("iphone 14 pro", 36_000),
    ("iphone 14", 29_000),
    ("samsung s24 ultra", 50_000),
    ("samsung s24", 35_000),
    ("samsung s23 ultra", 34_000),
    ("samsung s23", 26_000),
    ("samsung galaxy a54", 14_000),
    ("google pixel 8", 24_000),
    ("xiaomi 13t pro", 22_000),
    ("xiaomi 13t", 16_000),
    ("tecno camon 20", 5_500),
    ("realme 11", 9_000),
    ("ipad pro", 38_000),
    ("ipad air", 24_000),
    ("ipad 9", 11_000),
    ("samsung tab s9", 32_000),
    ("galaxy tab s9", 32_000),
    ("xiaomi pad 6", 14_000),
    ("macbook air m2", 42_000),
    ("macbook air m1", 30_000),
    ("macbook pro", 55_000),
    ("dell xps", 35_000),
    ("acer nitro", 25_000),
    ("lenovo yoga", 28_000),
    ("hp pavilion", 18_000),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEntry {
    pub key: String,
    pub price: Pesos,
}

/// Ordered substring price list with a default for unknown models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    entries: Vec<PriceEntry>,
    default_price: Pesos,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl PriceTable {
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_PRICES
                .iter()
                .map(|(key, price)| PriceEntry {
                    key: (*key).to_string(),
                    price: *price,
                })
                .collect(),
            default_price: DEFAULT_BASE_PRICE,
        }
    }

    pub fn entries(&self) -> &[PriceEntry] {
        &self.entries
    }

    pub fn default_price(&self) -> Pesos {
        self.default_price
    }

    /// First key contained in the lowercased model name wins.
    pub fn base_price(&self, model_name: &str) -> Pesos {
        let normalized = model_name.to_lowercase();
        self.entries
            .iter()
            .find(|entry| normalized.contains(entry.key.as_str()))
            .map(|entry| entry.price)
            .unwrap_or(self.default_price)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PriceTableImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Loads `key,price` rows, keeping file order for matching.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PriceTableImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();

        for (index, row) in csv_reader.deserialize::<PriceRow>().enumerate() {
            let row = row?;
            let key = row.key.to_lowercase();
            if key.is_empty() {
                return Err(PriceTableImportError::BlankKey { row: index + 1 });
            }
            entries.push(PriceEntry {
                key,
                price: row.price,
            });
        }

        if entries.is_empty() {
            return Err(PriceTableImportError::Empty);
        }

        Ok(Self {
            entries,
            default_price: DEFAULT_BASE_PRICE,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    key: String,
    price: Pesos,
}

/// Applies the condition penalty and rounds to the nearest whole peso.
pub fn adjust_for_condition(base: Pesos, condition: DeviceCondition) -> Pesos {
    (f64::from(base) * condition.retention()).round() as Pesos
}

#[derive(Debug)]
pub enum PriceTableImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    BlankKey { row: usize },
    Empty,
}

impl std::fmt::Display for PriceTableImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceTableImportError::Io(err) => write!(f, "failed to read price table: {err}"),
            PriceTableImportError::Csv(err) => write!(f, "invalid price table CSV: {err}"),
            PriceTableImportError::BlankKey { row } => {
                write!(f, "price table row {row} has a blank key")
            }
            PriceTableImportError::Empty => write!(f, "price table contains no entries"),
        }
    }
}

impl std::error::Error for PriceTableImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PriceTableImportError::Io(err) => Some(err),
            PriceTableImportError::Csv(err) => Some(err),
            PriceTableImportError::BlankKey { .. } | PriceTableImportError::Empty => None,
        }
    }
}

impl From<std::io::Error> for PriceTableImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PriceTableImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}
