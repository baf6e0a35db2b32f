//! Machine-label normalization and month-name lookup.
//!
//! Floor exports and the machine registry format the same machine
//! inconsistently (`"M-0012"` vs `"0012"`). [`normalize_label`] reduces
//! both sides to lowercase alphanumerics so the registry join matches
//! semantically identical machines. Deduplication of stored records is
//! *not* normalized: it compares raw labels exactly, so two genuinely
//! distinct source labels never collapse into one session.

/// Month names as the floor system records them in the exchange-rate
/// table, indexed by `month - 1`.
pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Canonicalizes a free-text machine label for registry joins.
///
/// Lowercases and strips every character outside `[0-9a-z]`. Idempotent:
/// normalizing an already-normalized label is a no-op.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            c.is_ascii_alphanumeric().then_some(c)
        })
        .collect()
}

/// Returns the exchange-rate month name for a 1-based month number.
#[must_use]
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalize_label("M-0012"), "m0012");
        assert_eq!(normalize_label("m0012"), "m0012");
        assert_eq!(normalize_label("  MAQ 077 / B "), "maq077b");
    }

    #[test]
    fn is_idempotent() {
        for label in ["M-0012", "  A.b.C ", "0450", "∆x-9"] {
            let once = normalize_label(label);
            assert_eq!(normalize_label(&once), once);
        }
    }

    #[test]
    fn drops_non_ascii_entirely() {
        assert_eq!(normalize_label("Ñ-12ü"), "12");
        assert_eq!(normalize_label("   "), "");
    }

    #[test]
    fn month_names_cover_the_year() {
        assert_eq!(month_name(1), Some("Enero"));
        assert_eq!(month_name(12), Some("Diciembre"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }
}
