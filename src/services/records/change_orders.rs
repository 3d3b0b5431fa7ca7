//! Change order persistence
//!
//! Derived amounts are written alongside each change order so listings can
//! sort and filter on them, but readers always recompute from line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::Page;
use crate::db::{decimal_to_f64, f64_to_decimal, f64_to_decimal_precise};
use crate::domain::{
    resolve_schedule_impact, ChangeOrder, ChangeOrderCategory, ChangeOrderItemType,
    ChangeOrderLineItem, ChangeOrderPriority, ChangeOrderReason, ChangeOrderStatus,
    CreateChangeOrderRequest,
};

#[derive(Debug, sqlx::FromRow)]
struct ChangeOrderRow {
    id: Uuid,
    project_id: Uuid,
    customer_id: Option<Uuid>,
    number: i32,
    title: String,
    description: Option<String>,
    reason: String,
    category: String,
    priority: String,
    status: String,
    original_contract_amount: Decimal,
    schedule_impact_days: i64,
    original_completion_date: Option<DateTime<Utc>>,
    revised_completion_date: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChangeOrderRow {
    fn into_change_order(self, line_items: Vec<ChangeOrderLineItem>) -> ChangeOrder {
        ChangeOrder {
            id: self.id,
            project_id: self.project_id,
            customer_id: self.customer_id,
            number: self.number,
            title: self.title,
            description: self.description,
            reason: ChangeOrderReason::from_db(&self.reason),
            category: ChangeOrderCategory::from_db(&self.category),
            priority: ChangeOrderPriority::from_db(&self.priority),
            status: ChangeOrderStatus::from_db(&self.status),
            original_contract_amount: decimal_to_f64(self.original_contract_amount),
            schedule_impact_days: self.schedule_impact_days,
            original_completion_date: self.original_completion_date,
            revised_completion_date: self.revised_completion_date,
            line_items,
            submitted_at: self.submitted_at,
            decided_at: self.decided_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChangeOrderLineItemRow {
    id: Uuid,
    change_order_id: Uuid,
    item_type: String,
    description: Option<String>,
    unit: Option<String>,
    quantity: Decimal,
    unit_rate: Decimal,
}

impl From<ChangeOrderLineItemRow> for ChangeOrderLineItem {
    fn from(row: ChangeOrderLineItemRow) -> Self {
        Self {
            id: Some(row.id),
            item_type: ChangeOrderItemType::from_db(&row.item_type),
            description: row.description,
            unit: row.unit,
            quantity: decimal_to_f64(row.quantity),
            unit_rate: decimal_to_f64(row.unit_rate),
        }
    }
}

const CHANGE_ORDER_COLUMNS: &str = "id, project_id, customer_id, number, title, description, \
                                    reason, category, priority, status, original_contract_amount, \
                                    schedule_impact_days, original_completion_date, \
                                    revised_completion_date, submitted_at, decided_at, \
                                    created_at, updated_at";

async fn with_line_items(
    db: &PgPool,
    rows: Vec<ChangeOrderRow>,
) -> Result<Vec<ChangeOrder>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, ChangeOrderLineItemRow>(
        r#"
        SELECT id, change_order_id, item_type, description, unit, quantity, unit_rate
        FROM change_order_line_items
        WHERE change_order_id = ANY($1)
        ORDER BY change_order_id, position ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<ChangeOrderLineItem>> = HashMap::new();
    for row in item_rows {
        grouped.entry(row.change_order_id).or_default().push(row.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = grouped.remove(&row.id).unwrap_or_default();
            row.into_change_order(items)
        })
        .collect())
}

pub async fn fetch_change_order(
    db: &PgPool,
    project_id: Uuid,
    change_order_id: Uuid,
) -> Result<Option<ChangeOrder>, sqlx::Error> {
    let row = sqlx::query_as::<_, ChangeOrderRow>(&format!(
        "SELECT {CHANGE_ORDER_COLUMNS} FROM change_orders WHERE id = $1 AND project_id = $2"
    ))
    .bind(change_order_id)
    .bind(project_id)
    .fetch_optional(db)
    .await?;

    match row {
        Some(row) => Ok(with_line_items(db, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn list_change_orders(
    db: &PgPool,
    project_id: Uuid,
    status: Option<ChangeOrderStatus>,
    limit: i64,
    offset: i64,
) -> Result<Page<ChangeOrder>, sqlx::Error> {
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM change_orders WHERE project_id = $1 AND ($2::text IS NULL OR status = $2)",
    )
    .bind(project_id)
    .bind(status)
    .fetch_one(db)
    .await?;

    let rows = sqlx::query_as::<_, ChangeOrderRow>(&format!(
        "SELECT {CHANGE_ORDER_COLUMNS} FROM change_orders \
         WHERE project_id = $1 AND ($2::text IS NULL OR status = $2) \
         ORDER BY number DESC LIMIT $3 OFFSET $4"
    ))
    .bind(project_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    Ok(Page {
        items: with_line_items(db, rows).await?,
        total,
    })
}

/// Every change order of a project, in number order.
pub async fn fetch_project_change_orders(
    db: &PgPool,
    project_id: Uuid,
) -> Result<Vec<ChangeOrder>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ChangeOrderRow>(&format!(
        "SELECT {CHANGE_ORDER_COLUMNS} FROM change_orders WHERE project_id = $1 ORDER BY number ASC"
    ))
    .bind(project_id)
    .fetch_all(db)
    .await?;

    with_line_items(db, rows).await
}

async fn replace_line_items(
    tx: &mut Transaction<'_, Postgres>,
    change_order_id: Uuid,
    items: &[ChangeOrderLineItem],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM change_order_line_items WHERE change_order_id = $1")
        .bind(change_order_id)
        .execute(&mut **tx)
        .await?;

    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO change_order_line_items (change_order_id, position, item_type,
                description, unit, quantity, unit_rate, total_cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(change_order_id)
        .bind(position as i32)
        .bind(item.item_type.as_str())
        .bind(&item.description)
        .bind(&item.unit)
        .bind(f64_to_decimal_precise(item.quantity)?)
        .bind(f64_to_decimal_precise(item.unit_rate)?)
        .bind(f64_to_decimal(item.total_cost())?)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Insert a draft change order with the next sequential number for its project.
pub async fn insert_change_order(
    db: &PgPool,
    project_id: Uuid,
    req: &CreateChangeOrderRequest,
) -> Result<ChangeOrder, sqlx::Error> {
    let schedule_impact_days = resolve_schedule_impact(
        req.schedule_impact_days,
        req.original_completion_date,
        req.revised_completion_date,
    );
    let impact = crate::cost::assess_change_order(
        &req.line_items,
        req.original_contract_amount,
        schedule_impact_days,
    );

    let mut tx = db.begin().await?;

    let number: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(number), 0) + 1 FROM change_orders WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(&mut *tx)
    .await?;

    let change_order_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO change_orders (project_id, customer_id, number, title, description,
            reason, category, priority, status, original_contract_amount, change_order_amount,
            revised_contract_amount, schedule_impact_days, original_completion_date,
            revised_completion_date, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft', $9, $10, $11, $12, $13, $14, NOW(), NOW())
        RETURNING id
        "#,
    )
    .bind(project_id)
    .bind(req.customer_id)
    .bind(number)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.reason.as_str())
    .bind(req.category.as_str())
    .bind(req.priority.as_str())
    .bind(f64_to_decimal(req.original_contract_amount)?)
    .bind(f64_to_decimal(impact.change_order_amount)?)
    .bind(f64_to_decimal(impact.revised_contract_amount)?)
    .bind(schedule_impact_days)
    .bind(req.original_completion_date)
    .bind(req.revised_completion_date)
    .fetch_one(&mut *tx)
    .await?;

    replace_line_items(&mut tx, change_order_id, &req.line_items).await?;
    tx.commit().await?;

    fetch_change_order(db, project_id, change_order_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Persist an edited change order, replacing its line items. Only matches
/// change orders that are still editable.
pub async fn save_change_order(
    db: &PgPool,
    change_order: &ChangeOrder,
) -> Result<Option<ChangeOrder>, sqlx::Error> {
    let impact = change_order.impact();
    let mut tx = db.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE change_orders SET
            customer_id = $3,
            title = $4,
            description = $5,
            reason = $6,
            category = $7,
            priority = $8,
            original_contract_amount = $9,
            change_order_amount = $10,
            revised_contract_amount = $11,
            schedule_impact_days = $12,
            original_completion_date = $13,
            revised_completion_date = $14,
            updated_at = NOW()
        WHERE id = $1 AND project_id = $2
          AND status IN ('draft', 'submitted', 'under_review')
        "#,
    )
    .bind(change_order.id)
    .bind(change_order.project_id)
    .bind(change_order.customer_id)
    .bind(&change_order.title)
    .bind(&change_order.description)
    .bind(change_order.reason.as_str())
    .bind(change_order.category.as_str())
    .bind(change_order.priority.as_str())
    .bind(f64_to_decimal(change_order.original_contract_amount)?)
    .bind(f64_to_decimal(impact.change_order_amount)?)
    .bind(f64_to_decimal(impact.revised_contract_amount)?)
    .bind(change_order.schedule_impact_days)
    .bind(change_order.original_completion_date)
    .bind(change_order.revised_completion_date)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    replace_line_items(&mut tx, change_order.id, &change_order.line_items).await?;
    tx.commit().await?;

    fetch_change_order(db, change_order.project_id, change_order.id).await
}

/// Move a change order from `from` to `to`. Returns `None` when the change
/// order is no longer in `from`, so concurrent transitions cannot both win.
pub async fn transition_change_order(
    db: &PgPool,
    project_id: Uuid,
    change_order_id: Uuid,
    from: ChangeOrderStatus,
    to: ChangeOrderStatus,
) -> Result<Option<ChangeOrder>, sqlx::Error> {
    let updated = sqlx::query(
        r#"
        UPDATE change_orders SET
            status = $4,
            submitted_at = CASE WHEN $4 = 'submitted' THEN NOW() ELSE submitted_at END,
            decided_at = CASE WHEN $4 IN ('approved', 'rejected') THEN NOW() ELSE decided_at END,
            updated_at = NOW()
        WHERE id = $1 AND project_id = $2 AND status = $3
        "#,
    )
    .bind(change_order_id)
    .bind(project_id)
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(db)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    fetch_change_order(db, project_id, change_order_id).await
}

/// Delete a change order that is still editable. Returns whether a row was removed.
pub async fn delete_change_order(
    db: &PgPool,
    project_id: Uuid,
    change_order_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM change_orders
        WHERE id = $1 AND project_id = $2
          AND status IN ('draft', 'submitted', 'under_review')
        "#,
    )
    .bind(change_order_id)
    .bind(project_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
