//! The record type served by the `incidents` resource.
//!
//! Each incident is a case opened by an organisation (an "ONG") asking for a
//! monetary contribution.  The backend joins the organisation's contact
//! details into every row, so they travel with the incident.

use serde::Deserialize;

/// A single incident as returned by the backend.
///
/// The loader only relies on [`id`](Incident::id); everything else is for
/// display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Incident {
    /// Stable unique identifier, used as the list key.
    pub id: i64,

    /// Short case title.
    pub title: String,

    /// Longer description of the case.
    #[serde(default)]
    pub description: String,

    /// Amount requested, in reais.
    #[serde(default)]
    pub value: f64,

    /// Name of the organisation that opened the case.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub whatsapp: String,

    #[serde(default)]
    pub city: String,

    /// Two-letter state code.
    #[serde(default)]
    pub uf: String,
}

impl Incident {
    /// The requested amount formatted as Brazilian currency, e.g. `R$ 1.234,56`.
    pub fn value_brl(&self) -> String {
        format_brl(self.value)
    }
}

fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let (units, frac) = (cents / 100, cents % 100);

    // Group the integer part in threes with '.' separators.
    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac:02}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
