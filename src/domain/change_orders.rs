//! Change order domain types
//!
//! Change orders modify the contract after signing. Their monetary amount is
//! always derived from line items; status follows a small approval workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{lenient_amount, lenient_days, lenient_optional_amount, lenient_optional_days};
use crate::cost::ChangeOrderImpact;

/// Change order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrderStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Implemented,
}

impl Default for ChangeOrderStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ChangeOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Implemented => "implemented",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "submitted" => Self::Submitted,
            "under_review" => Self::UnderReview,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "implemented" => Self::Implemented,
            _ => Self::Draft,
        }
    }

    /// Statuses reachable in one step from this one.
    pub fn allowed_transitions(&self) -> &'static [ChangeOrderStatus] {
        match self {
            Self::Draft => &[Self::Submitted],
            Self::Submitted => &[Self::UnderReview],
            Self::UnderReview => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Implemented],
            Self::Rejected | Self::Implemented => &[],
        }
    }

    pub fn can_transition_to(&self, next: ChangeOrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Whether the change order still counts toward the revised contract baseline.
    pub fn counts_toward_baseline(&self) -> bool {
        matches!(self, Self::Approved | Self::Implemented)
    }

    /// Line items and amounts may only change before a decision is made.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Submitted | Self::UnderReview)
    }
}

impl std::fmt::Display for ChangeOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the change was requested
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrderReason {
    OwnerRequest,
    DesignChange,
    UnforeseenCondition,
    RegulatoryRequirement,
    ValueEngineering,
    ErrorOrOmission,
    Other,
}

impl Default for ChangeOrderReason {
    fn default() -> Self {
        Self::OwnerRequest
    }
}

impl ChangeOrderReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnerRequest => "owner_request",
            Self::DesignChange => "design_change",
            Self::UnforeseenCondition => "unforeseen_condition",
            Self::RegulatoryRequirement => "regulatory_requirement",
            Self::ValueEngineering => "value_engineering",
            Self::ErrorOrOmission => "error_or_omission",
            Self::Other => "other",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "owner_request" => Self::OwnerRequest,
            "design_change" => Self::DesignChange,
            "unforeseen_condition" => Self::UnforeseenCondition,
            "regulatory_requirement" => Self::RegulatoryRequirement,
            "value_engineering" => Self::ValueEngineering,
            "error_or_omission" => Self::ErrorOrOmission,
            _ => Self::Other,
        }
    }
}

/// What part of the contract the change touches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrderCategory {
    Scope,
    Design,
    Schedule,
    SiteCondition,
    Other,
}

impl Default for ChangeOrderCategory {
    fn default() -> Self {
        Self::Scope
    }
}

impl ChangeOrderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scope => "scope",
            Self::Design => "design",
            Self::Schedule => "schedule",
            Self::SiteCondition => "site_condition",
            Self::Other => "other",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "scope" => Self::Scope,
            "design" => Self::Design,
            "schedule" => Self::Schedule,
            "site_condition" => Self::SiteCondition,
            _ => Self::Other,
        }
    }
}

/// Change order priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrderPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for ChangeOrderPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl ChangeOrderPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Medium,
        }
    }
}

/// Change order line item type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrderItemType {
    Material,
    Labor,
    Equipment,
    Subcontractor,
    Other,
}

impl Default for ChangeOrderItemType {
    fn default() -> Self {
        Self::Other
    }
}

impl ChangeOrderItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Labor => "labor",
            Self::Equipment => "equipment",
            Self::Subcontractor => "subcontractor",
            Self::Other => "other",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "material" => Self::Material,
            "labor" => Self::Labor,
            "equipment" => Self::Equipment,
            "subcontractor" => Self::Subcontractor,
            _ => Self::Other,
        }
    }
}

/// Change order line item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeOrderLineItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub item_type: ChangeOrderItemType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_rate: f64,
}

impl ChangeOrderLineItem {
    pub fn new(item_type: ChangeOrderItemType, quantity: f64, unit_rate: f64) -> Self {
        Self {
            item_type,
            quantity,
            unit_rate,
            ..Default::default()
        }
    }

    pub fn total_cost(&self) -> f64 {
        crate::cost::line_item_total(self)
    }
}

/// Change order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeOrder {
    pub id: Uuid,
    pub project_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub number: i32, // Sequential per project
    pub title: String,
    pub description: Option<String>,
    pub reason: ChangeOrderReason,
    pub category: ChangeOrderCategory,
    pub priority: ChangeOrderPriority,
    pub status: ChangeOrderStatus,
    pub original_contract_amount: f64,
    pub schedule_impact_days: i64,
    pub original_completion_date: Option<DateTime<Utc>>,
    pub revised_completion_date: Option<DateTime<Utc>>,
    pub line_items: Vec<ChangeOrderLineItem>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChangeOrder {
    /// Cost and schedule impact, recomputed from the line items.
    pub fn impact(&self) -> ChangeOrderImpact {
        crate::cost::assess_change_order(
            &self.line_items,
            self.original_contract_amount,
            self.schedule_impact_days,
        )
    }

    /// Merge an update request; the schedule impact is re-derived from the
    /// completion dates when both are known.
    pub fn apply_update(&mut self, req: UpdateChangeOrderRequest) {
        if let Some(title) = req.title {
            self.title = title;
        }
        if req.description.is_some() {
            self.description = req.description;
        }
        if req.customer_id.is_some() {
            self.customer_id = req.customer_id;
        }
        if let Some(reason) = req.reason {
            self.reason = reason;
        }
        if let Some(category) = req.category {
            self.category = category;
        }
        if let Some(priority) = req.priority {
            self.priority = priority;
        }
        if let Some(amount) = req.original_contract_amount {
            self.original_contract_amount = amount;
        }
        if let Some(days) = req.schedule_impact_days {
            self.schedule_impact_days = days;
        }
        if req.original_completion_date.is_some() {
            self.original_completion_date = req.original_completion_date;
        }
        if req.revised_completion_date.is_some() {
            self.revised_completion_date = req.revised_completion_date;
        }
        if let Some(items) = req.line_items {
            self.line_items = items;
        }

        self.schedule_impact_days = resolve_schedule_impact(
            self.schedule_impact_days,
            self.original_completion_date,
            self.revised_completion_date,
        );
    }
}

/// Change order as supplied to the stateless calculators
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeOrderInput {
    #[serde(default)]
    pub status: ChangeOrderStatus,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub original_contract_amount: f64,
    #[serde(default, deserialize_with = "lenient_days")]
    pub schedule_impact_days: i64,
    #[serde(default)]
    pub original_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revised_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_items: Vec<ChangeOrderLineItem>,
}

impl ChangeOrderInput {
    /// Schedule impact in days, preferring the completion dates when both are given.
    pub fn effective_schedule_impact_days(&self) -> i64 {
        resolve_schedule_impact(
            self.schedule_impact_days,
            self.original_completion_date,
            self.revised_completion_date,
        )
    }
}

/// Completion dates win over a hand-entered day count when both dates are known.
pub fn resolve_schedule_impact(
    days: i64,
    original_completion_date: Option<DateTime<Utc>>,
    revised_completion_date: Option<DateTime<Utc>>,
) -> i64 {
    match (original_completion_date, revised_completion_date) {
        (Some(original), Some(revised)) => crate::cost::time_impact(original, revised),
        _ => days,
    }
}

/// Request DTO for creating a change order
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChangeOrderRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub reason: ChangeOrderReason,
    #[serde(default)]
    pub category: ChangeOrderCategory,
    #[serde(default)]
    pub priority: ChangeOrderPriority,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub original_contract_amount: f64,
    #[serde(default, deserialize_with = "lenient_days")]
    pub schedule_impact_days: i64,
    #[serde(default)]
    pub original_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revised_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_items: Vec<ChangeOrderLineItem>,
}

/// Request DTO for updating a change order
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateChangeOrderRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub reason: Option<ChangeOrderReason>,
    #[serde(default)]
    pub category: Option<ChangeOrderCategory>,
    #[serde(default)]
    pub priority: Option<ChangeOrderPriority>,
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub original_contract_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_optional_days")]
    pub schedule_impact_days: Option<i64>,
    #[serde(default)]
    pub original_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revised_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_items: Option<Vec<ChangeOrderLineItem>>,
}

/// Request DTO for moving a change order through its workflow
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionChangeOrderRequest {
    pub status: ChangeOrderStatus,
}

/// Line item as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ChangeOrderLineItemResponse {
    pub id: Option<Uuid>,
    pub item_type: ChangeOrderItemType,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: f64,
    pub unit_rate: f64,
    pub total_cost: f64,
}

impl From<&ChangeOrderLineItem> for ChangeOrderLineItemResponse {
    fn from(item: &ChangeOrderLineItem) -> Self {
        Self {
            id: item.id,
            item_type: item.item_type,
            description: item.description.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            unit_rate: item.unit_rate,
            total_cost: item.total_cost(),
        }
    }
}

/// Response DTO for change order
#[derive(Debug, Clone, Serialize)]
pub struct ChangeOrderResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub number: i32,
    pub title: String,
    pub description: Option<String>,
    pub reason: ChangeOrderReason,
    pub category: ChangeOrderCategory,
    pub priority: ChangeOrderPriority,
    pub status: ChangeOrderStatus,
    pub allowed_transitions: Vec<ChangeOrderStatus>,
    pub original_contract_amount: f64,
    pub schedule_impact_days: i64,
    pub original_completion_date: Option<DateTime<Utc>>,
    pub revised_completion_date: Option<DateTime<Utc>>,
    pub line_items: Vec<ChangeOrderLineItemResponse>,
    pub impact: ChangeOrderImpact,
    pub submitted_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChangeOrder> for ChangeOrderResponse {
    fn from(c: ChangeOrder) -> Self {
        let impact = c.impact();

        Self {
            id: c.id,
            project_id: c.project_id,
            customer_id: c.customer_id,
            number: c.number,
            title: c.title,
            description: c.description,
            reason: c.reason,
            category: c.category,
            priority: c.priority,
            status: c.status,
            allowed_transitions: c.status.allowed_transitions().to_vec(),
            original_contract_amount: c.original_contract_amount,
            schedule_impact_days: c.schedule_impact_days,
            original_completion_date: c.original_completion_date,
            revised_completion_date: c.revised_completion_date,
            line_items: c.line_items.iter().map(Into::into).collect(),
            impact,
            submitted_at: c.submitted_at,
            decided_at: c.decided_at,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
