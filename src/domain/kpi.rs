//! Guarded KPI arithmetic for the hold aggregation tiers.
//!
//! Every metric family lives in its own pure function over already
//! materialized session slices, and every division goes through
//! [`safe_div`]. The same [`tier`] function computes both the global
//! (floor-wide) and the filtered (model/day drill-down) tier; only the
//! row subset and therefore the denominators differ.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use utoipa::ToSchema;

/// Minimal per-session view the KPI math needs: raw machine label,
/// day-of-month, and the two totals meters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSlice {
    /// Raw machine label of the session row.
    pub machine: String,
    /// Day of month (1–31) the session belongs to.
    pub day: u32,
    /// Total-in meter for the session.
    pub total_in: f64,
    /// Total-out meter for the session.
    pub total_out: f64,
}

/// Raw currency totals over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct PeriodTotals {
    /// Total credits wagered in (`Σ total_in`), local currency.
    pub credits_in: f64,
    /// Net win (`Σ (total_in − total_out)`), local currency.
    pub net_win: f64,
}

/// Activity counts over a period.
///
/// `avg_active_days_per_machine` and `avg_daily_active_machines` are the
/// two day-normalization quantities the floor reports use as different
/// KPI denominators; they are deliberately kept as separate figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct ActivityStats {
    /// Distinct machines with strictly positive wagering activity.
    pub active_machines: u64,
    /// Distinct calendar days with any stored session in the period.
    pub active_days: u64,
    /// Mean over active machines of their distinct positive-activity
    /// day counts.
    pub avg_active_days_per_machine: f64,
    /// Mean over active days of the count of machines active that day.
    pub avg_daily_active_machines: f64,
}

/// Per-machine-per-day averages in the reference currency.
///
/// All four are `0.0` when the exchange rate is missing; the
/// same-currency figures in [`PeriodTotals`] stay valid regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct DerivedAverages {
    /// Net win per machine per period day, converted.
    pub win_per_machine_day: f64,
    /// Net win per machine per positive-activity day, converted.
    pub win_per_machine_active_day: f64,
    /// Credits-in per machine per period day, converted.
    pub credits_per_machine_day: f64,
    /// Credits-in per machine per positive-activity day, converted.
    pub credits_per_machine_active_day: f64,
}

/// One full KPI tier: totals, activity counts, converted averages, and
/// retention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct KpiTier {
    /// Raw local-currency totals.
    pub totals: PeriodTotals,
    /// Activity counts and day-normalization averages.
    pub activity: ActivityStats,
    /// Currency-converted per-machine-per-day averages.
    pub averages: DerivedAverages,
    /// Retention percentage (`net_win / credits_in × 100`, floored at
    /// zero).
    pub retention_pct: f64,
}

/// Division that can never panic or produce a non-finite value.
///
/// Returns `0.0` when the denominator is zero, when either operand is
/// non-finite, or when the quotient itself would be non-finite.
#[must_use]
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 || !den.is_finite() || !num.is_finite() {
        return 0.0;
    }
    let q = num / den;
    if q.is_finite() { q } else { 0.0 }
}

/// Retention percentage: net win over credits-in, `0.0` when nothing
/// was wagered.
///
/// Clamped at zero: a losing period (payouts exceeding wagering, e.g.
/// a jackpot-heavy day) reads as `0.0` retention, not a negative one.
#[must_use]
pub fn retention_pct(net_win: f64, credits_in: f64) -> f64 {
    (safe_div(net_win, credits_in) * 100.0).max(0.0)
}

/// Sums the period's currency totals.
#[must_use]
pub fn totals(rows: &[SessionSlice]) -> PeriodTotals {
    let mut t = PeriodTotals::default();
    for row in rows {
        t.credits_in += row.total_in;
        t.net_win += row.total_in - row.total_out;
    }
    t
}

/// Computes activity counts and the two day-normalization averages.
#[must_use]
pub fn activity(rows: &[SessionSlice]) -> ActivityStats {
    let mut days_any: HashSet<u32> = HashSet::new();
    let mut machine_days: HashMap<&str, HashSet<u32>> = HashMap::new();
    let mut day_machines: HashMap<u32, HashSet<&str>> = HashMap::new();

    for row in rows {
        days_any.insert(row.day);
        if row.total_in > 0.0 {
            machine_days
                .entry(row.machine.as_str())
                .or_default()
                .insert(row.day);
            day_machines
                .entry(row.day)
                .or_default()
                .insert(row.machine.as_str());
        }
    }

    let active_machines = machine_days.len() as u64;
    let total_machine_days: f64 = machine_days.values().map(|d| d.len() as f64).sum();
    let total_day_machines: f64 = day_machines.values().map(|m| m.len() as f64).sum();

    ActivityStats {
        active_machines,
        active_days: days_any.len() as u64,
        avg_active_days_per_machine: safe_div(total_machine_days, active_machines as f64),
        avg_daily_active_machines: safe_div(total_day_machines, day_machines.len() as f64),
    }
}

/// Computes the converted per-machine-per-day averages from already
/// resolved totals and denominators.
///
/// A missing exchange rate zeroes all four figures.
#[must_use]
pub fn derived_averages(
    totals: PeriodTotals,
    activity: ActivityStats,
    rate: Option<f64>,
) -> DerivedAverages {
    let rate = rate.unwrap_or(0.0);
    let machines = activity.active_machines as f64;
    let per_machine = |amount: f64, days: f64| {
        safe_div(safe_div(safe_div(amount, days), machines), rate)
    };

    DerivedAverages {
        win_per_machine_day: per_machine(totals.net_win, activity.active_days as f64),
        win_per_machine_active_day: per_machine(
            totals.net_win,
            activity.avg_active_days_per_machine,
        ),
        credits_per_machine_day: per_machine(totals.credits_in, activity.active_days as f64),
        credits_per_machine_active_day: per_machine(
            totals.credits_in,
            activity.avg_active_days_per_machine,
        ),
    }
}

/// Computes one full KPI tier from a period's session slices.
#[must_use]
pub fn tier(rows: &[SessionSlice], rate: Option<f64>) -> KpiTier {
    let totals = totals(rows);
    let activity = activity(rows);
    KpiTier {
        totals,
        activity,
        averages: derived_averages(totals, activity, rate),
        retention_pct: retention_pct(totals.net_win, totals.credits_in),
    }
}
