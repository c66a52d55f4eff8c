//! Token Overview Risk Flags
//!
//! Advisory statistics for the tracked token: hourly trade counts, price-change
//! figures and social links. A price change below -80% in any window flags a
//! possible rug pull. Nothing here blocks execution.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Any price-change figure (percent) below this flags a possible rug pull
pub const RUG_PULL_PRICE_CHANGE_PCT: f64 = -80.0;

/// Default minimum number of trades in the last hour for a token to look alive
pub const DEFAULT_MIN_TRADES_LAST_HOUR: u64 = 100;

/// Link found in a token description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialLink {
    Telegram(String),
    Twitter(String),
    Website(String),
}

/// Overview statistics for one token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenOverview {
    pub address: String,
    pub buy_1h: u64,
    pub sell_1h: u64,
    /// Price change per window, keyed by the provider's field name (e.g. `priceChange1hPercent`)
    pub price_changes: BTreeMap<String, f64>,
    pub unique_wallets_24h: u64,
    pub volume_24h_usd: f64,
    pub watch: u64,
    pub view_24h: u64,
    pub liquidity_usd: f64,
    pub links: Vec<SocialLink>,
}

impl TokenOverview {
    pub fn trade_1h(&self) -> u64 {
        self.buy_1h + self.sell_1h
    }

    pub fn buy_percentage(&self) -> f64 {
        match self.trade_1h() {
            0 => 0.0,
            total => self.buy_1h as f64 / total as f64 * 100.0,
        }
    }

    pub fn sell_percentage(&self) -> f64 {
        match self.trade_1h() {
            0 => 0.0,
            total => self.sell_1h as f64 / total as f64 * 100.0,
        }
    }

    pub fn minimum_trades_met(&self, min_trades_last_hour: u64) -> bool {
        self.trade_1h() >= min_trades_last_hour
    }

    /// Window with the largest drop
    pub fn worst_price_change(&self) -> Option<(&str, f64)> {
        self.price_changes
            .iter()
            .map(|(window, change)| (window.as_str(), *change))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn is_possible_rug(&self) -> bool {
        self.price_changes
            .values()
            .any(|change| *change < RUG_PULL_PRICE_CHANGE_PCT)
    }

    pub fn assess(&self, min_trades_last_hour: u64) -> RiskAssessment {
        RiskAssessment {
            rug_pull: self.is_possible_rug(),
            minimum_trades_met: self.minimum_trades_met(min_trades_last_hour),
            worst_price_change_pct: self.worst_price_change().map(|(_, change)| change),
        }
    }
}

/// Summary of the advisory checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub rug_pull: bool,
    pub minimum_trades_met: bool,
    pub worst_price_change_pct: Option<f64>,
}

impl RiskAssessment {
    pub fn is_clean(&self) -> bool {
        !self.rug_pull && self.minimum_trades_met
    }
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r"https?://(?:[a-zA-Z0-9$\-_@.&+!*(),]|%[0-9a-fA-F]{2})+(?:/[^\s]*)?")
            .expect("url pattern is valid")
    })
}

/// Pull telegram, twitter and website links out of a free-text description.
/// YouTube links are ignored.
pub fn extract_links(description: &str) -> Vec<SocialLink> {
    url_regex()
        .find_iter(description)
        .filter_map(|m| {
            let url = m.as_str().to_string();
            if url.contains("t.me") {
                Some(SocialLink::Telegram(url))
            } else if url.contains("twitter.com") || url.contains("x.com/") {
                Some(SocialLink::Twitter(url))
            } else if url.contains("youtube") {
                None
            } else {
                Some(SocialLink::Website(url))
            }
        })
        .collect()
}
