//! Discount grid model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One tier of a progressive discount grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountTier {
    /// Percentage of the unit price, expected in [0, 100].
    pub percent: Decimal,
    pub label: String,
}

/// Named, tiered discount policy applied to subscriptions by seniority.
///
/// Read-only during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountGrid {
    pub name: String,
    pub active: bool,
    pub default: bool,
    /// Year 1, year 2, year 3 and beyond.
    pub tiers: [DiscountTier; 3],
}

impl DiscountGrid {
    /// Tier applicable to the month being billed (1-based).
    ///
    /// Months 1-12 fall in tier 1, 13-24 in tier 2, 25 and later in tier 3.
    pub fn tier_for_month(&self, month: u32) -> &DiscountTier {
        if month <= 12 {
            &self.tiers[0]
        } else if month <= 24 {
            &self.tiers[1]
        } else {
            &self.tiers[2]
        }
    }
}

/// Raw discount grid fields as returned by the store.
///
/// Percentages pass through unchanged; the grid is used as configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountGridFields {
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Active", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "Default", default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(rename = "Year 1 Discount", default, skip_serializing_if = "Option::is_none")]
    pub year1_percent: Option<Decimal>,
    #[serde(rename = "Year 1 Label", default, skip_serializing_if = "Option::is_none")]
    pub year1_label: Option<String>,
    #[serde(rename = "Year 2 Discount", default, skip_serializing_if = "Option::is_none")]
    pub year2_percent: Option<Decimal>,
    #[serde(rename = "Year 2 Label", default, skip_serializing_if = "Option::is_none")]
    pub year2_label: Option<String>,
    #[serde(rename = "Year 3+ Discount", default, skip_serializing_if = "Option::is_none")]
    pub year3_percent: Option<Decimal>,
    #[serde(rename = "Year 3+ Label", default, skip_serializing_if = "Option::is_none")]
    pub year3_label: Option<String>,
}

impl From<DiscountGridFields> for DiscountGrid {
    fn from(fields: DiscountGridFields) -> Self {
        Self {
            name: fields.name.unwrap_or_default(),
            active: fields.active.unwrap_or(false),
            default: fields.default.unwrap_or(false),
            tiers: [
                DiscountTier {
                    percent: fields.year1_percent.unwrap_or(Decimal::ZERO),
                    label: fields.year1_label.unwrap_or_default(),
                },
                DiscountTier {
                    percent: fields.year2_percent.unwrap_or(Decimal::ZERO),
                    label: fields.year2_label.unwrap_or_default(),
                },
                DiscountTier {
                    percent: fields.year3_percent.unwrap_or(Decimal::ZERO),
                    label: fields.year3_label.unwrap_or_default(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> DiscountGrid {
        DiscountGrid {
            name: "Loyalty".to_string(),
            active: true,
            default: true,
            tiers: [
                DiscountTier {
                    percent: Decimal::from(20),
                    label: "Year 1".to_string(),
                },
                DiscountTier {
                    percent: Decimal::from(10),
                    label: "Year 2".to_string(),
                },
                DiscountTier {
                    percent: Decimal::from(5),
                    label: "Year 3+".to_string(),
                },
            ],
        }
    }

    #[test]
    fn tier_boundaries() {
        let grid = grid();
        assert_eq!(grid.tier_for_month(1).percent, Decimal::from(20));
        assert_eq!(grid.tier_for_month(12).percent, Decimal::from(20));
        assert_eq!(grid.tier_for_month(13).percent, Decimal::from(10));
        assert_eq!(grid.tier_for_month(24).percent, Decimal::from(10));
        assert_eq!(grid.tier_for_month(25).percent, Decimal::from(5));
        assert_eq!(grid.tier_for_month(120).percent, Decimal::from(5));
    }

    #[test]
    fn absent_fields_become_inert_grid() {
        let grid = DiscountGrid::from(DiscountGridFields::default());
        assert!(!grid.active);
        assert!(!grid.default);
        assert_eq!(grid.tier_for_month(1).percent, Decimal::ZERO);
        assert!(grid.tier_for_month(1).label.is_empty());
    }
}
