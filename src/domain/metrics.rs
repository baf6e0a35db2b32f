//! Canonical metric schema and time-series record types.
//!
//! The floor-report template maps positionally onto [`CANONICAL_COLUMNS`]:
//! the machine and session identifying columns followed by the numeric
//! metric columns in [`Metric::ALL`] order. Records carry the metrics as
//! a fixed-size array indexed by [`Metric`], so the column count is a
//! structural invariant rather than a convention.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Number of numeric metric columns in the canonical schema.
pub const METRIC_COUNT: usize = 18;

/// Numeric metric columns of the canonical schema, in physical template
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Metric {
    /// Total credits wagered (coin-in meter).
    AmountWagered,
    /// Total credits won (coin-out meter).
    AmountWon,
    /// Value accepted by the bill acceptor.
    BillsAccepted,
    /// Ticket-in value.
    TicketsIn,
    /// Ticket-out value.
    TicketsOut,
    /// Redeemable promotional credits issued.
    PromoRedeemable,
    /// Redeemable promotional credits played.
    PromoRedeemablePlayed,
    /// Non-redeemable promotional credits issued.
    PromoNonRedeemable,
    /// Non-redeemable promotional credits played.
    PromoNonRedeemablePlayed,
    /// Jackpot amount paid.
    Jackpot,
    /// Manual (attendant) payout amount.
    ManualPayout,
    /// Total-in for the session.
    TotalIn,
    /// Total-out for the session.
    TotalOut,
    /// Re-in meter.
    ReIn,
    /// Re-out meter.
    ReOut,
    /// Number of plays.
    GamesPlayed,
    /// Average bet.
    AverageBet,
    /// Number of winning plays.
    WinningGames,
}

impl Metric {
    /// All metrics in canonical column order.
    pub const ALL: [Self; METRIC_COUNT] = [
        Self::AmountWagered,
        Self::AmountWon,
        Self::BillsAccepted,
        Self::TicketsIn,
        Self::TicketsOut,
        Self::PromoRedeemable,
        Self::PromoRedeemablePlayed,
        Self::PromoNonRedeemable,
        Self::PromoNonRedeemablePlayed,
        Self::Jackpot,
        Self::ManualPayout,
        Self::TotalIn,
        Self::TotalOut,
        Self::ReIn,
        Self::ReOut,
        Self::GamesPlayed,
        Self::AverageBet,
        Self::WinningGames,
    ];

    /// Canonical snake_case column name.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::AmountWagered => "amount_wagered",
            Self::AmountWon => "amount_won",
            Self::BillsAccepted => "bills_accepted",
            Self::TicketsIn => "tickets_in",
            Self::TicketsOut => "tickets_out",
            Self::PromoRedeemable => "promo_redeemable",
            Self::PromoRedeemablePlayed => "promo_redeemable_played",
            Self::PromoNonRedeemable => "promo_non_redeemable",
            Self::PromoNonRedeemablePlayed => "promo_non_redeemable_played",
            Self::Jackpot => "jackpot",
            Self::ManualPayout => "manual_payout",
            Self::TotalIn => "total_in",
            Self::TotalOut => "total_out",
            Self::ReIn => "re_in",
            Self::ReOut => "re_out",
            Self::GamesPlayed => "games_played",
            Self::AverageBet => "average_bet",
            Self::WinningGames => "winning_games",
        }
    }
}

/// Full canonical column list: identifying columns, then the metrics in
/// [`Metric::ALL`] order. The trimmed physical extract must have exactly
/// this many columns.
pub const CANONICAL_COLUMNS: [&str; METRIC_COUNT + 2] = [
    "machine",
    "session",
    "amount_wagered",
    "amount_won",
    "bills_accepted",
    "tickets_in",
    "tickets_out",
    "promo_redeemable",
    "promo_redeemable_played",
    "promo_non_redeemable",
    "promo_non_redeemable_played",
    "jackpot",
    "manual_payout",
    "total_in",
    "total_out",
    "re_in",
    "re_out",
    "games_played",
    "average_bet",
    "winning_games",
];

/// Natural composite key of the time-series store: the *raw* machine and
/// session labels, compared exactly (not normalized).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Raw machine label as it appears in the extract.
    pub machine_label: String,
    /// Raw session label as it appears in the extract.
    pub session_label: String,
}

/// One spreadsheet row after banner/column trimming and positional
/// renaming. Ephemeral: exists only during a single import request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExtractRow {
    /// Free-text machine label.
    pub machine: String,
    /// Free-text session label, usually `DD/MM/YYYY HH:MM`.
    pub session: String,
    /// Metric values in [`Metric::ALL`] order; `None` is a missing value.
    pub metrics: [Option<f64>; METRIC_COUNT],
}

impl RawExtractRow {
    /// Returns one metric value by canonical column.
    #[must_use]
    pub fn metric(&self, m: Metric) -> Option<f64> {
        self.metrics.get(m as usize).copied().flatten()
    }
}

/// Canonical persisted row of the time-series store: one per raw
/// `(machine_label, session_label)` pair. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Raw machine label.
    pub machine_label: String,
    /// Raw session label.
    pub session_label: String,
    /// Calendar date derived from the session label, when parseable.
    /// Rows without a date never contribute to period KPIs.
    pub session_date: Option<NaiveDate>,
    /// Metric values in [`Metric::ALL`] order.
    pub metrics: [Option<f64>; METRIC_COUNT],
}

impl PerformanceRecord {
    /// Returns the store key for this record.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey {
            machine_label: self.machine_label.clone(),
            session_label: self.session_label.clone(),
        }
    }

    /// Returns one metric value by canonical column.
    #[must_use]
    pub fn metric(&self, m: Metric) -> Option<f64> {
        self.metrics.get(m as usize).copied().flatten()
    }
}

/// Missing-value markers that coerce to `None` instead of a number.
const NULL_MARKERS: [&str; 5] = ["", "-", "--", "N/A", "NA"];

/// Coerces a free-text numeric cell into a float.
///
/// Accepts thousands-separator strings (`"1,234.5"`) and the template's
/// missing-value markers. Anything else unparseable is `None`; per-row
/// coercion failures never abort a batch.
#[must_use]
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if NULL_MARKERS
        .iter()
        .any(|m| trimmed.eq_ignore_ascii_case(m))
    {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    cleaned.parse().ok()
}

/// Parses a session label (`DD/MM/YYYY HH:MM`, with seconds or bare date
/// tolerated) into a calendar date.
#[must_use]
pub fn parse_session_date(label: &str) -> Option<NaiveDate> {
    let trimmed = label.trim();
    for fmt in ["%d/%m/%Y %H:%M", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").ok()
}
