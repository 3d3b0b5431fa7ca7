//! Budget domain types
//!
//! A budget belongs to a project and holds an ordered list of line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{lenient_amount, lenient_optional_amount};
use crate::cost::{BudgetSummary, BudgetTotal};

/// Budget line item category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCategory {
    Material,
    Labor,
    Equipment,
    Subcontractor,
    Overhead,
    Other,
}

impl Default for BudgetCategory {
    fn default() -> Self {
        Self::Other
    }
}

impl BudgetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Labor => "labor",
            Self::Equipment => "equipment",
            Self::Subcontractor => "subcontractor",
            Self::Overhead => "overhead",
            Self::Other => "other",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "material" => Self::Material,
            "labor" => Self::Labor,
            "equipment" => Self::Equipment,
            "subcontractor" => Self::Subcontractor,
            "overhead" => Self::Overhead,
            _ => Self::Other,
        }
    }
}

/// Budget line item
///
/// `available` is derived and may go negative when the line is overcommitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BudgetLineItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub category: BudgetCategory,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub budgeted_amount: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub allocated_amount: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub committed_amount: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub spent_amount: f64,
}

impl BudgetLineItem {
    pub fn new(category: BudgetCategory, budgeted_amount: f64) -> Self {
        Self {
            category,
            budgeted_amount,
            ..Default::default()
        }
    }

    pub fn available(&self) -> f64 {
        self.budgeted_amount - self.allocated_amount - self.committed_amount - self.spent_amount
    }
}

/// Budget entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub version: i32,
    pub is_approved: bool,
    pub contingency_percentage: f64,
    pub notes: Option<String>,
    pub line_items: Vec<BudgetLineItem>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a budget
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBudgetRequest {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub contingency_percentage: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Vec<BudgetLineItem>,
}

/// Request DTO for updating a budget
///
/// When `line_items` is present it replaces the stored items wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBudgetRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub contingency_percentage: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Option<Vec<BudgetLineItem>>,
}

/// Line item as returned to clients, with its derived availability
#[derive(Debug, Clone, Serialize)]
pub struct BudgetLineItemResponse {
    pub id: Option<Uuid>,
    pub category: BudgetCategory,
    pub description: Option<String>,
    pub budgeted_amount: f64,
    pub allocated_amount: f64,
    pub committed_amount: f64,
    pub spent_amount: f64,
    pub available_amount: f64,
}

impl From<&BudgetLineItem> for BudgetLineItemResponse {
    fn from(item: &BudgetLineItem) -> Self {
        Self {
            id: item.id,
            category: item.category,
            description: item.description.clone(),
            budgeted_amount: item.budgeted_amount,
            allocated_amount: item.allocated_amount,
            committed_amount: item.committed_amount,
            spent_amount: item.spent_amount,
            available_amount: item.available(),
        }
    }
}

/// Response DTO for budget, with totals recomputed from its line items
#[derive(Debug, Clone, Serialize)]
pub struct BudgetResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub version: i32,
    pub is_approved: bool,
    pub contingency_percentage: f64,
    pub notes: Option<String>,
    pub line_items: Vec<BudgetLineItemResponse>,
    pub total: BudgetTotal,
    pub summary: BudgetSummary,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Budget> for BudgetResponse {
    fn from(b: Budget) -> Self {
        let total = crate::cost::budget_total(&b.line_items, b.contingency_percentage);
        let summary = crate::cost::aggregate_budget(&b.line_items);

        Self {
            id: b.id,
            project_id: b.project_id,
            name: b.name,
            version: b.version,
            is_approved: b.is_approved,
            contingency_percentage: b.contingency_percentage,
            notes: b.notes,
            line_items: b.line_items.iter().map(Into::into).collect(),
            total,
            summary,
            approved_at: b.approved_at,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_can_go_negative() {
        let item = BudgetLineItem {
            budgeted_amount: 1_000.0,
            allocated_amount: 400.0,
            committed_amount: 500.0,
            spent_amount: 300.0,
            ..BudgetLineItem::new(BudgetCategory::Labor, 1_000.0)
        };

        assert_eq!(item.available(), -200.0);
    }

    #[test]
    fn category_round_trips_through_db_text() {
        for category in [
            BudgetCategory::Material,
            BudgetCategory::Labor,
            BudgetCategory::Equipment,
            BudgetCategory::Subcontractor,
            BudgetCategory::Overhead,
            BudgetCategory::Other,
        ] {
            assert_eq!(BudgetCategory::from_db(category.as_str()), category);
        }
        assert_eq!(BudgetCategory::from_db("landscaping"), BudgetCategory::Other);
    }

    #[test]
    fn line_item_tolerates_partial_json() {
        let item: BudgetLineItem = serde_json::from_str(
            r#"{"category": "material", "budgeted_amount": "2500", "spent_amount": null}"#,
        )
        .unwrap();

        assert_eq!(item.category, BudgetCategory::Material);
        assert_eq!(item.budgeted_amount, 2_500.0);
        assert_eq!(item.spent_amount, 0.0);
        assert_eq!(item.available(), 2_500.0);
    }
}
