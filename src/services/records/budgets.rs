//! Budget persistence

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::Page;
use crate::db::{decimal_to_f64, f64_to_decimal, f64_to_decimal_precise};
use crate::domain::{Budget, BudgetCategory, BudgetLineItem, CreateBudgetRequest, UpdateBudgetRequest};

#[derive(Debug, sqlx::FromRow)]
struct BudgetRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    version: i32,
    is_approved: bool,
    contingency_percentage: Decimal,
    notes: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BudgetRow {
    fn into_budget(self, line_items: Vec<BudgetLineItem>) -> Budget {
        Budget {
            id: self.id,
            project_id: self.project_id,
            name: self.name,
            version: self.version,
            is_approved: self.is_approved,
            contingency_percentage: decimal_to_f64(self.contingency_percentage),
            notes: self.notes,
            line_items,
            approved_at: self.approved_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BudgetLineItemRow {
    id: Uuid,
    budget_id: Uuid,
    category: String,
    description: Option<String>,
    budgeted_amount: Decimal,
    allocated_amount: Decimal,
    committed_amount: Decimal,
    spent_amount: Decimal,
}

impl From<BudgetLineItemRow> for BudgetLineItem {
    fn from(row: BudgetLineItemRow) -> Self {
        Self {
            id: Some(row.id),
            category: BudgetCategory::from_db(&row.category),
            description: row.description,
            budgeted_amount: decimal_to_f64(row.budgeted_amount),
            allocated_amount: decimal_to_f64(row.allocated_amount),
            committed_amount: decimal_to_f64(row.committed_amount),
            spent_amount: decimal_to_f64(row.spent_amount),
        }
    }
}

const BUDGET_COLUMNS: &str = "id, project_id, name, version, is_approved, contingency_percentage, \
                              notes, approved_at, created_at, updated_at";

/// Attach line items to budget rows, keeping each budget's item order.
async fn with_line_items(db: &PgPool, rows: Vec<BudgetRow>) -> Result<Vec<Budget>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, BudgetLineItemRow>(
        r#"
        SELECT id, budget_id, category, description,
               budgeted_amount, allocated_amount, committed_amount, spent_amount
        FROM budget_line_items
        WHERE budget_id = ANY($1)
        ORDER BY budget_id, position ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<BudgetLineItem>> = HashMap::new();
    for row in item_rows {
        grouped.entry(row.budget_id).or_default().push(row.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = grouped.remove(&row.id).unwrap_or_default();
            row.into_budget(items)
        })
        .collect())
}

pub async fn fetch_budget(
    db: &PgPool,
    project_id: Uuid,
    budget_id: Uuid,
) -> Result<Option<Budget>, sqlx::Error> {
    let row = sqlx::query_as::<_, BudgetRow>(&format!(
        "SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = $1 AND project_id = $2"
    ))
    .bind(budget_id)
    .bind(project_id)
    .fetch_optional(db)
    .await?;

    match row {
        Some(row) => Ok(with_line_items(db, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// The highest budget version of a project.
pub async fn fetch_latest_budget(db: &PgPool, project_id: Uuid) -> Result<Option<Budget>, sqlx::Error> {
    let row = sqlx::query_as::<_, BudgetRow>(&format!(
        "SELECT {BUDGET_COLUMNS} FROM budgets WHERE project_id = $1 ORDER BY version DESC LIMIT 1"
    ))
    .bind(project_id)
    .fetch_optional(db)
    .await?;

    match row {
        Some(row) => Ok(with_line_items(db, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn list_budgets(
    db: &PgPool,
    project_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Page<Budget>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM budgets WHERE project_id = $1")
        .bind(project_id)
        .fetch_one(db)
        .await?;

    let rows = sqlx::query_as::<_, BudgetRow>(&format!(
        "SELECT {BUDGET_COLUMNS} FROM budgets WHERE project_id = $1 \
         ORDER BY version DESC LIMIT $2 OFFSET $3"
    ))
    .bind(project_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    Ok(Page {
        items: with_line_items(db, rows).await?,
        total,
    })
}

async fn insert_line_items(
    tx: &mut Transaction<'_, Postgres>,
    budget_id: Uuid,
    items: &[BudgetLineItem],
) -> Result<(), sqlx::Error> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO budget_line_items (budget_id, position, category, description,
                budgeted_amount, allocated_amount, committed_amount, spent_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(budget_id)
        .bind(position as i32)
        .bind(item.category.as_str())
        .bind(&item.description)
        .bind(f64_to_decimal(item.budgeted_amount)?)
        .bind(f64_to_decimal(item.allocated_amount)?)
        .bind(f64_to_decimal(item.committed_amount)?)
        .bind(f64_to_decimal(item.spent_amount)?)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Insert a new budget as the next version for its project.
pub async fn insert_budget(
    db: &PgPool,
    project_id: Uuid,
    req: &CreateBudgetRequest,
) -> Result<Budget, sqlx::Error> {
    let mut tx = db.begin().await?;

    let version: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(version), 0) + 1 FROM budgets WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(&mut *tx)
    .await?;

    let budget_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO budgets (project_id, name, version, contingency_percentage, notes,
                             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        RETURNING id
        "#,
    )
    .bind(project_id)
    .bind(&req.name)
    .bind(version)
    .bind(f64_to_decimal_precise(req.contingency_percentage)?)
    .bind(&req.notes)
    .fetch_one(&mut *tx)
    .await?;

    insert_line_items(&mut tx, budget_id, &req.line_items).await?;
    tx.commit().await?;

    fetch_budget(db, project_id, budget_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Apply an update to a draft budget. Returns `None` when no unapproved
/// budget matched.
pub async fn update_budget(
    db: &PgPool,
    project_id: Uuid,
    budget_id: Uuid,
    req: &UpdateBudgetRequest,
) -> Result<Option<Budget>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let contingency = req
        .contingency_percentage
        .map(f64_to_decimal_precise)
        .transpose()?;

    let updated = sqlx::query(
        r#"
        UPDATE budgets SET
            name = COALESCE($3, name),
            contingency_percentage = COALESCE($4, contingency_percentage),
            notes = COALESCE($5, notes),
            updated_at = NOW()
        WHERE id = $1 AND project_id = $2 AND is_approved = FALSE
        "#,
    )
    .bind(budget_id)
    .bind(project_id)
    .bind(&req.name)
    .bind(contingency)
    .bind(&req.notes)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    if let Some(items) = &req.line_items {
        sqlx::query("DELETE FROM budget_line_items WHERE budget_id = $1")
            .bind(budget_id)
            .execute(&mut *tx)
            .await?;
        insert_line_items(&mut tx, budget_id, items).await?;
    }

    tx.commit().await?;
    fetch_budget(db, project_id, budget_id).await
}

/// Mark a budget approved. Approval is one-way.
pub async fn approve_budget(
    db: &PgPool,
    project_id: Uuid,
    budget_id: Uuid,
) -> Result<Option<Budget>, sqlx::Error> {
    let updated = sqlx::query(
        r#"
        UPDATE budgets SET is_approved = TRUE, approved_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND project_id = $2 AND is_approved = FALSE
        "#,
    )
    .bind(budget_id)
    .bind(project_id)
    .execute(db)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    fetch_budget(db, project_id, budget_id).await
}

/// Delete a budget; its line items go with it. Returns whether a row was removed.
pub async fn delete_budget(db: &PgPool, project_id: Uuid, budget_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND project_id = $2")
        .bind(budget_id)
        .bind(project_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}
