use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use analysis_core::ExpirationSelector;
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

pub const USAGE: &str = "\
Usage:
  market-analytics ticker SYMBOL...
  market-analytics options SYMBOL [--expiration YYYY-MM-DD]
  market-analytics snapshot [CATEGORY...] [--momentum]
  market-analytics markets
  market-analytics sector NAME";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ticker { symbols: Vec<String> },
    Options { symbol: String, expiration: ExpirationSelector },
    Snapshot { categories: Vec<String>, momentum: bool },
    Markets,
    Sector { name: String },
}

/// Parse everything after the program name
pub fn parse_args(args: &[String]) -> Result<Command> {
    let (name, rest) = args.split_first().ok_or_else(|| anyhow!("missing command"))?;

    let command = match name.as_str() {
        "ticker" => {
            if rest.is_empty() {
                bail!("ticker needs at least one symbol");
            }
            Command::Ticker { symbols: rest.to_vec() }
        }
        "options" => {
            let flag = rest.iter().position(|a| a == "--expiration");
            let expiration = match flag {
                Some(i) => {
                    let raw = rest
                        .get(i + 1)
                        .ok_or_else(|| anyhow!("--expiration needs a date"))?;
                    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .with_context(|| format!("invalid expiration date {raw}"))?;
                    ExpirationSelector::Date(date)
                }
                None => ExpirationSelector::Nearest,
            };
            let symbol = rest
                .iter()
                .enumerate()
                .find(|(i, a)| !a.starts_with("--") && flag.map(|f| f + 1) != Some(*i))
                .map(|(_, a)| a.clone())
                .ok_or_else(|| anyhow!("options needs a symbol"))?;
            Command::Options { symbol, expiration }
        }
        "snapshot" => Command::Snapshot {
            categories: rest.iter().filter(|a| !a.starts_with("--")).cloned().collect(),
            momentum: rest.iter().any(|a| a == "--momentum"),
        },
        "markets" => Command::Markets,
        "sector" => {
            if rest.is_empty() {
                bail!("sector needs a name");
            }
            // "consumer staples" may arrive as two words
            Command::Sector { name: rest.join(" ") }
        }
        other => bail!("unknown command {other}"),
    };

    Ok(command)
}

pub fn error_line(err: impl Display) -> String {
    format!("ERROR: {err}")
}

/// Record as JSON, or the error line in its place
pub fn entry_value<T: Serialize, E: Display>(result: Result<T, E>) -> Result<Value> {
    match result {
        Ok(record) => Ok(serde_json::to_value(record)?),
        Err(e) => Ok(Value::String(error_line(e))),
    }
}

/// Keyed results sorted by key for stable output
pub fn keyed_values<T: Serialize, E: Display>(
    results: HashMap<String, Result<T, E>>,
) -> Result<BTreeMap<String, Value>> {
    results
        .into_iter()
        .map(|(key, result)| Ok((key, entry_value(result)?)))
        .collect()
}
