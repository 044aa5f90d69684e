//! Ticker symbols used as item identifiers, plus list parsing helpers.
//!
//! The dispatch core only relies on equality and hashing of `Ticker`; display and
//! case-insensitive parsing exist for logging and for the command line.

use std::collections::HashSet;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::DispatchError;

/// Parses a list of tickers such as `"AAPL,msft GOOGL"`.
///
/// Symbols may be separated by commas and/or whitespace; duplicates collapse into
/// one entry. Returns `DispatchError::Format` on the first unknown symbol.
pub fn parse_ticker_list(input: &str) -> Result<HashSet<Ticker>, DispatchError> {
    let mut tickers = HashSet::new();

    for symbol in input.split(|c: char| c == ',' || c.is_whitespace()) {
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed.parse::<Ticker>() {
            Ok(ticker) => {
                tickers.insert(ticker);
            }
            Err(e) => {
                return Err(DispatchError::Format(format!(
                    "unknown ticker '{}': {}",
                    trimmed, e
                )));
            }
        }
    }
    Ok(tickers)
}

/// Set of supported ticker symbols.
#[allow(missing_docs)]
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[clap(rename_all = "lower")]
#[strum(ascii_case_insensitive)]
pub enum Ticker {
    AAPL,
    MSFT,
    GOOGL,
    AMZN,
    NVDA,
    META,
    TSLA,
    JPM,
    JNJ,
    V,
    PG,
    UNH,
    HD,
    DIS,
    PYPL,
    NFLX,
    ADBE,
    CRM,
    INTC,
    CSCO,
    PFE,
    ABT,
    TMO,
    ABBV,
    LLY,
    PEP,
    COST,
    TXN,
    AVGO,
    ACN,
    QCOM,
    DHR,
    MDT,
    NKE,
    UPS,
    RTX,
    HON,
    ORCL,
    LIN,
    AMGN,
    LOW,
    SBUX,
    SPGI,
    INTU,
    ISRG,
    T,
    BMY,
    DE,
    PLD,
    CI,
    CAT,
    GS,
    UNP,
    AMT,
    AXP,
    MS,
    BLK,
    GE,
    SYK,
    GILD,
    MMM,
    MO,
    LMT,
    FISV,
    ADI,
    BKNG,
    C,
    SO,
    NEE,
    ZTS,
    TGT,
    DUK,
    ICE,
    BDX,
    PNC,
    CMCSA,
    SCHW,
    MDLZ,
    TJX,
    USB,
    CL,
    EMR,
    APD,
    COF,
    FDX,
    AON,
    WM,
    ECL,
    ITW,
    VRTX,
    D,
    NSC,
    PGR,
    ETN,
    FIS,
    PSA,
    KLAC,
    MCD,
    ADP,
    APTV,
    AEP,
    MCO,
    SHW,
    DD,
    ROP,
    SLB,
    HUM,
    BSX,
    NOC,
    EW,
    KO,
}
