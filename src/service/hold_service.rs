//! Hold context builder: filter resolution and two-tier KPI assembly.
//!
//! A context build is one bounded sequence of read queries (option
//! discovery, exchange rate, one month of session rows, the machine
//! registry) followed by pure in-memory assembly. The global tier
//! aggregates the whole floor for the resolved year and month; the
//! filtered tier restricts the same rows by optional day and model
//! through the normalized-label registry join, with its own
//! denominators. Conflating the two would misstate per-machine
//! averages, so they are computed from explicitly different row
//! subsets.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::kpi::{self, KpiTier, SessionSlice};
use crate::domain::{month_name, normalize_label};
use crate::error::AnalyticsError;
use crate::persistence::{MachineRegistryEntry, PostgresStore, SessionRow};

/// Fully resolved filter selection for one context build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Selection {
    /// Resolved calendar year.
    pub year: i32,
    /// Resolved month (1–12).
    pub month: u32,
    /// Day-of-month restriction; `None` means all days.
    pub day: Option<u32>,
    /// Model restriction; `None` means all models.
    pub model_id: Option<i32>,
}

/// Filter option lists for the UI selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilterOptions {
    /// Years with data, plus the current real-world year.
    pub years: Vec<i32>,
    /// Months with data in the selected year, plus the current month
    /// when the selected year is the current year.
    pub months: Vec<u32>,
    /// Days with data in the selected year and month.
    pub days: Vec<u32>,
}

/// Distinct active machines for one model in the selected window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ModelActivity {
    /// Model identifier.
    pub model_id: i32,
    /// Model display name.
    pub model_name: String,
    /// Distinct registry machines with positive wagering activity.
    pub active_machines: u64,
}

/// Computed KPI snapshot for one selection. Never persisted; recomputed
/// on every request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HoldContext {
    /// The resolved selection the snapshot answers.
    pub selection: Selection,
    /// Display name of the resolved month.
    pub month_label: String,
    /// Available filter options.
    pub options: FilterOptions,
    /// Exchange rate used for currency conversion, when stored.
    pub exchange_rate: Option<f64>,
    /// Floor-wide tier for the resolved year and month.
    pub global: KpiTier,
    /// Drill-down tier restricted by day/model through the registry.
    pub filtered: KpiTier,
    /// Per-model active machine counts (day-filtered, model filter
    /// ignored so the sidebar can drive re-selection).
    pub models: Vec<ModelActivity>,
}

/// Builds [`HoldContext`] snapshots from the store.
#[derive(Debug, Clone)]
pub struct HoldService {
    store: PostgresStore,
}

impl HoldService {
    /// Creates a new `HoldService`.
    #[must_use]
    pub fn new(store: PostgresStore) -> Self {
        Self { store }
    }

    /// Builds the KPI snapshot for the requested (all-optional) filters.
    ///
    /// Missing reference data degrades to zero-valued figures; the only
    /// failures are storage-level.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] when a read query fails.
    pub async fn build_context(
        &self,
        year: Option<i32>,
        month: Option<u32>,
        day: Option<u32>,
        model_id: Option<i32>,
    ) -> Result<HoldContext, AnalyticsError> {
        let today = chrono::Local::now().date_naive();

        let year = year.unwrap_or_else(|| today.year());
        let mut years = self.store.distinct_years().await?;
        ensure_present(&mut years, today.year());

        let mut months = self.store.distinct_months(year).await?;
        if year == today.year() {
            ensure_present(&mut months, today.month());
        }
        let month = resolve_month(month, &months, today);

        let days = self.store.distinct_days(year, month).await?;
        let day = resolve_day(day, &days);

        let rate = match month_name(month) {
            Some(name) => self.store.exchange_rate(year, name).await?,
            None => None,
        };

        let rows = self.store.month_rows(year, month).await?;
        let registry = self.store.machine_registry().await?;

        let selection = Selection {
            year,
            month,
            day,
            model_id,
        };
        let options = FilterOptions { years, months, days };

        tracing::debug!(
            year,
            month,
            sessions = rows.len(),
            "hold context assembled"
        );
        Ok(assemble_context(selection, options, &rows, &registry, rate))
    }
}

/// Inserts a value into a sorted option list when absent.
fn ensure_present<T: Ord + Copy>(options: &mut Vec<T>, value: T) {
    if !options.contains(&value) {
        options.push(value);
        options.sort_unstable();
    }
}

/// Resolves the effective month: the requested month when it has data,
/// otherwise the current month when it has data, otherwise the first
/// month with data, otherwise the requested/current month as-is.
fn resolve_month(requested: Option<u32>, months: &[u32], today: NaiveDate) -> u32 {
    let wanted = requested.unwrap_or_else(|| today.month());
    if months.contains(&wanted) {
        return wanted;
    }
    if months.contains(&today.month()) {
        return today.month();
    }
    months.first().copied().unwrap_or(wanted)
}

/// Resolves the day filter: a day with no matching data means "all
/// days", never an empty result.
fn resolve_day(requested: Option<u32>, days: &[u32]) -> Option<u32> {
    requested.filter(|d| days.contains(d))
}

/// Pure context assembly over prefetched inputs.
#[must_use]
pub fn assemble_context(
    selection: Selection,
    options: FilterOptions,
    rows: &[SessionRow],
    registry: &[MachineRegistryEntry],
    rate: Option<f64>,
) -> HoldContext {
    let by_key: HashMap<String, &MachineRegistryEntry> = registry
        .iter()
        .map(|entry| (normalize_label(&entry.machine_number), entry))
        .collect();

    let global_slices: Vec<SessionSlice> = rows.iter().map(to_slice).collect();

    let filtered_slices: Vec<SessionSlice> = rows
        .iter()
        .filter(|row| selection.day.is_none_or(|d| row.session_date.day() == d))
        .filter(|row| {
            let entry = by_key.get(&normalize_label(&row.machine_label));
            match (entry, selection.model_id) {
                (Some(entry), Some(wanted)) => entry.model_id == Some(wanted),
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
        .map(to_slice)
        .collect();

    HoldContext {
        month_label: month_name(selection.month).unwrap_or_default().to_string(),
        models: model_sidebar(selection.day, rows, &by_key),
        global: kpi::tier(&global_slices, rate),
        filtered: kpi::tier(&filtered_slices, rate),
        exchange_rate: rate,
        selection,
        options,
    }
}

/// Projects a stored session row into the KPI view.
fn to_slice(row: &SessionRow) -> SessionSlice {
    SessionSlice {
        machine: row.machine_label.clone(),
        day: row.session_date.day(),
        total_in: row.total_in,
        total_out: row.total_out,
    }
}

/// Counts distinct active registry machines per model in the selected
/// window, ignoring the model filter; zero-activity models are omitted.
fn model_sidebar(
    day: Option<u32>,
    rows: &[SessionRow],
    by_key: &HashMap<String, &MachineRegistryEntry>,
) -> Vec<ModelActivity> {
    let mut machines_per_model: HashMap<(i32, &str), std::collections::HashSet<&str>> =
        HashMap::new();

    for row in rows {
        if row.total_in <= 0.0 {
            continue;
        }
        if day.is_some_and(|d| row.session_date.day() != d) {
            continue;
        }
        let Some(entry) = by_key.get(&normalize_label(&row.machine_label)) else {
            continue;
        };
        let (Some(model_id), Some(model_name)) = (entry.model_id, entry.model_name.as_deref())
        else {
            continue;
        };
        machines_per_model
            .entry((model_id, model_name))
            .or_default()
            .insert(entry.machine_number.as_str());
    }

    let mut sidebar: Vec<ModelActivity> = machines_per_model
        .into_iter()
        .map(|((model_id, model_name), machines)| ModelActivity {
            model_id,
            model_name: model_name.to_string(),
            active_machines: machines.len() as u64,
        })
        .collect();
    sidebar.sort_by(|a, b| a.model_name.cmp(&b.model_name).then(a.model_id.cmp(&b.model_id)));
    sidebar
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    fn session(machine: &str, d: u32, total_in: f64, total_out: f64) -> SessionRow {
        SessionRow {
            machine_label: machine.to_string(),
            session_date: date(2024, 3, d),
            total_in,
            total_out,
        }
    }

    fn registry_entry(number: &str, model_id: i32, model_name: &str) -> MachineRegistryEntry {
        MachineRegistryEntry {
            machine_number: number.to_string(),
            model_id: Some(model_id),
            model_name: Some(model_name.to_string()),
            provider_name: Some("Acme Gaming".to_string()),
            status: Some("Activo".to_string()),
        }
    }

    fn selection(day: Option<u32>, model_id: Option<i32>) -> Selection {
        Selection {
            year: 2024,
            month: 3,
            day,
            model_id,
        }
    }

    #[test]
    fn month_resolution_prefers_requested_then_current_then_first() {
        let today = date(2024, 8, 26);
        assert_eq!(resolve_month(Some(3), &[2, 3, 8], today), 3);
        assert_eq!(resolve_month(Some(5), &[2, 3, 8], today), 8);
        assert_eq!(resolve_month(Some(5), &[2, 3], today), 2);
        assert_eq!(resolve_month(None, &[2, 3, 8], today), 8);
        // empty store: keep the request so the UI shows the right label
        assert_eq!(resolve_month(Some(5), &[], today), 5);
        assert_eq!(resolve_month(None, &[], today), 8);
    }

    #[test]
    fn day_without_data_falls_back_to_all_days() {
        assert_eq!(resolve_day(Some(15), &[1, 2, 15]), Some(15));
        assert_eq!(resolve_day(Some(20), &[1, 2, 15]), None);
        assert_eq!(resolve_day(None, &[1, 2, 15]), None);
    }

    #[test]
    fn ensure_present_keeps_options_sorted() {
        let mut years = vec![2022, 2023];
        ensure_present(&mut years, 2026);
        ensure_present(&mut years, 2023);
        assert_eq!(years, vec![2022, 2023, 2026]);
    }

    #[test]
    fn empty_month_yields_zeroed_context_without_error() {
        let ctx = assemble_context(
            selection(None, None),
            FilterOptions::default(),
            &[],
            &[],
            Some(36.5),
        );
        assert_eq!(ctx.global.activity.active_machines, 0);
        assert_eq!(ctx.global.activity.active_days, 0);
        assert_eq!(ctx.global.averages.win_per_machine_day, 0.0);
        assert_eq!(ctx.filtered.retention_pct, 0.0);
        assert!(ctx.models.is_empty());
    }

    #[test]
    fn registry_join_is_normalized_but_global_tier_is_not() {
        let rows = vec![session("M-0012", 1, 100.0, 40.0), session("9999", 1, 50.0, 0.0)];
        let registry = vec![registry_entry("0012", 7, "Fu Xuan")];

        let ctx = assemble_context(selection(None, None), FilterOptions::default(), &rows, &registry, Some(1.0));

        // global counts both machines; filtered only the registry match
        assert_eq!(ctx.global.activity.active_machines, 2);
        assert_eq!(ctx.filtered.activity.active_machines, 1);
        assert!((ctx.filtered.totals.credits_in - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn model_filter_restricts_totals_and_denominators() {
        let rows = vec![
            session("0012", 1, 100.0, 40.0),
            session("0450", 1, 200.0, 120.0),
            session("0450", 2, 50.0, 10.0),
        ];
        let registry = vec![
            registry_entry("0012", 7, "Fu Xuan"),
            registry_entry("0450", 9, "Dragon Link"),
        ];

        let ctx = assemble_context(selection(None, Some(9)), FilterOptions::default(), &rows, &registry, Some(1.0));

        assert!((ctx.filtered.totals.credits_in - 250.0).abs() < f64::EPSILON);
        assert!((ctx.filtered.totals.net_win - 120.0).abs() < f64::EPSILON);
        assert_eq!(ctx.filtered.activity.active_machines, 1);
        assert_eq!(ctx.global.activity.active_machines, 2);
        // sidebar ignores the model filter
        assert_eq!(ctx.models.len(), 2);
    }

    #[test]
    fn day_filter_restricts_filtered_tier_only() {
        let rows = vec![session("0012", 1, 100.0, 40.0), session("0012", 2, 50.0, 50.0)];
        let registry = vec![registry_entry("0012", 7, "Fu Xuan")];

        let ctx = assemble_context(selection(Some(2), None), FilterOptions::default(), &rows, &registry, Some(1.0));

        assert!((ctx.global.totals.credits_in - 150.0).abs() < f64::EPSILON);
        assert!((ctx.filtered.totals.credits_in - 50.0).abs() < f64::EPSILON);
        assert_eq!(ctx.filtered.totals.net_win, 0.0);
    }

    #[test]
    fn sidebar_counts_distinct_machines_and_omits_idle_models() {
        let rows = vec![
            session("0012", 1, 100.0, 40.0),
            session("M-0012", 2, 10.0, 0.0),
            session("0450", 1, 0.0, 0.0),
        ];
        let registry = vec![
            registry_entry("0012", 7, "Fu Xuan"),
            registry_entry("0450", 9, "Dragon Link"),
        ];

        let ctx = assemble_context(selection(None, None), FilterOptions::default(), &rows, &registry, None);

        // both labels normalize to registry machine 0012 → one machine,
        // one model; Dragon Link had no positive wagering
        let Some(first) = ctx.models.first() else {
            panic!("expected one sidebar entry");
        };
        assert_eq!(ctx.models.len(), 1);
        assert_eq!(first.model_id, 7);
        assert_eq!(first.active_machines, 1);
    }

    #[test]
    fn missing_rate_keeps_same_currency_figures() {
        let rows = vec![session("0012", 1, 100.0, 40.0)];
        let registry = vec![registry_entry("0012", 7, "Fu Xuan")];

        let ctx = assemble_context(selection(None, None), FilterOptions::default(), &rows, &registry, None);

        assert!(ctx.global.totals.credits_in > 0.0);
        assert!(ctx.global.retention_pct > 0.0);
        assert_eq!(ctx.global.averages.credits_per_machine_day, 0.0);
        assert_eq!(ctx.filtered.averages.win_per_machine_active_day, 0.0);
    }
}
