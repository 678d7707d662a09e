/// Movements: the expenses and incomes of a family
///
/// Every movement has a kind, and its category must belong to that kind.
/// Expenses also carry a [`Responsibility`] (personal or shared with the
/// family); incomes never do. Both rules are enforced by the service layer
/// and again by a CHECK constraint.
///
/// # Categories
///
/// | Kind    | Categories |
/// |---------|------------|
/// | expense | groceries, transport, housing, health, leisure, education, taxes, pets, extraordinary |
/// | income  | salary, occasional, benefits, interest |

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Expense,
    Income,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Expense => "expense",
            MovementKind::Income => "income",
        }
    }

    /// Categories a movement of this kind may use
    pub fn categories(&self) -> &'static [Category] {
        match self {
            MovementKind::Expense => &Category::EXPENSE,
            MovementKind::Income => &Category::INCOME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Groceries,
    Transport,
    Housing,
    Health,
    Leisure,
    Education,
    Taxes,
    Pets,
    Extraordinary,
    Salary,
    Occasional,
    Benefits,
    Interest,
}

impl Category {
    pub const EXPENSE: [Category; 9] = [
        Category::Groceries,
        Category::Transport,
        Category::Housing,
        Category::Health,
        Category::Leisure,
        Category::Education,
        Category::Taxes,
        Category::Pets,
        Category::Extraordinary,
    ];

    pub const INCOME: [Category; 4] = [
        Category::Salary,
        Category::Occasional,
        Category::Benefits,
        Category::Interest,
    ];

    pub fn kind(&self) -> MovementKind {
        match self {
            Category::Salary | Category::Occasional | Category::Benefits | Category::Interest => {
                MovementKind::Income
            }
            _ => MovementKind::Expense,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Groceries => "groceries",
            Category::Transport => "transport",
            Category::Housing => "housing",
            Category::Health => "health",
            Category::Leisure => "leisure",
            Category::Education => "education",
            Category::Taxes => "taxes",
            Category::Pets => "pets",
            Category::Extraordinary => "extraordinary",
            Category::Salary => "salary",
            Category::Occasional => "occasional",
            Category::Benefits => "benefits",
            Category::Interest => "interest",
        }
    }

    /// Colour used for this category in charts
    pub fn color(&self) -> &'static str {
        match self {
            Category::Groceries => "#10b981",
            Category::Transport => "#3b82f6",
            Category::Housing => "#8b5cf6",
            Category::Health => "#ef4444",
            Category::Leisure => "#f59e0b",
            Category::Education => "#06b6d4",
            Category::Taxes => "#6366f1",
            Category::Pets => "#ec4899",
            Category::Extraordinary => "#84cc16",
            Category::Salary => "#22c55e",
            Category::Occasional => "#0ea5e9",
            Category::Benefits => "#a855f7",
            Category::Interest => "#14b8a6",
        }
    }
}

/// Who an expense is charged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "responsibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Responsibility {
    Personal,
    Family,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub kind: MovementKind,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Category,
    pub responsibility: Option<Responsibility>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A movement as listed to the family: author names and category colour
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovementDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub movement: Movement,
    pub author_first_name: String,
    pub author_last_name: String,
    #[sqlx(skip)]
    pub category_color: String,
}

#[derive(Debug, Clone)]
pub struct CreateMovement {
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub kind: MovementKind,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Category,
    pub responsibility: Option<Responsibility>,
}

/// Field changes; `None` keeps the stored value. The kind never changes.
#[derive(Debug, Clone, Default)]
pub struct UpdateMovement {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category: Option<Category>,
    pub responsibility: Option<Responsibility>,
}

/// Narrowing applied to a family's movement list; empty means "everything"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovementFilter {
    pub kinds: Vec<MovementKind>,
    pub categories: Vec<Category>,
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
    pub responsibility: Option<Responsibility>,
    pub user_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

const MOVEMENT_COLUMNS: &str = "id, family_id, user_id, kind, description, amount, date, \
     category, responsibility, created_at, updated_at";

impl MovementFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if !self.kinds.is_empty() {
            qb.push(" AND m.kind IN (");
            let mut list = qb.separated(", ");
            for kind in &self.kinds {
                list.push_bind(*kind);
            }
            list.push_unseparated(")");
        }

        if !self.categories.is_empty() {
            qb.push(" AND m.category IN (");
            let mut list = qb.separated(", ");
            for category in &self.categories {
                list.push_bind(*category);
            }
            list.push_unseparated(")");
        }

        if let Some(min) = self.amount_min {
            qb.push(" AND m.amount >= ").push_bind(min);
        }
        if let Some(max) = self.amount_max {
            qb.push(" AND m.amount <= ").push_bind(max);
        }
        if let Some(responsibility) = self.responsibility {
            qb.push(" AND m.responsibility = ").push_bind(responsibility);
        }
        if let Some(user_id) = self.user_id {
            qb.push(" AND m.user_id = ").push_bind(user_id);
        }
        if let Some(from) = self.date_from {
            qb.push(" AND m.date >= ").push_bind(from);
        }
        if let Some(to) = self.date_to {
            qb.push(" AND m.date <= ").push_bind(to);
        }
    }
}

impl Movement {
    pub async fn create(pool: &PgPool, data: CreateMovement) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Movement>(&format!(
            r#"
            INSERT INTO movements
                (family_id, user_id, kind, description, amount, date, category, responsibility)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(data.family_id)
        .bind(data.user_id)
        .bind(data.kind)
        .bind(data.description)
        .bind(data.amount)
        .bind(data.date)
        .bind(data.category)
        .bind(data.responsibility)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Family movements matching the filter, newest first
    pub async fn list_for_family(
        pool: &PgPool,
        family_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Vec<MovementDetail>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT m.id, m.family_id, m.user_id, m.kind, m.description, m.amount, m.date,
                   m.category, m.responsibility, m.created_at, m.updated_at,
                   u.first_name AS author_first_name, u.last_name AS author_last_name
            FROM movements m
            JOIN users u ON u.id = m.user_id
            WHERE m.family_id = "#,
        );
        qb.push_bind(family_id);
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY m.date DESC, m.created_at DESC");

        let mut rows = qb.build_query_as::<MovementDetail>().fetch_all(pool).await?;
        for row in &mut rows {
            row.category_color = row.movement.category.color().to_string();
        }

        Ok(rows)
    }

    /// One user's movements dated in `[from, until)`, newest first
    pub async fn list_for_user_between(
        pool: &PgPool,
        user_id: Uuid,
        kind: Option<MovementKind>,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Movement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM movements
            WHERE user_id = $1
              AND ($2::movement_kind IS NULL OR kind = $2)
              AND date >= $3 AND date < $4
            ORDER BY date DESC, created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(kind)
        .bind(from)
        .bind(until)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateMovement) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Movement>(&format!(
            r#"
            UPDATE movements
            SET description = COALESCE($2, description),
                amount = COALESCE($3, amount),
                date = COALESCE($4, date),
                category = COALESCE($5, category),
                responsibility = COALESCE($6, responsibility),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.description)
        .bind(data.amount)
        .bind(data.date)
        .bind(data.category)
        .bind(data.responsibility)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movements WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_partition_by_kind() {
        for category in Category::EXPENSE {
            assert_eq!(category.kind(), MovementKind::Expense, "{:?}", category);
        }
        for category in Category::INCOME {
            assert_eq!(category.kind(), MovementKind::Income, "{:?}", category);
        }
        assert_eq!(
            MovementKind::Expense.categories().len() + MovementKind::Income.categories().len(),
            13
        );
    }

    #[test]
    fn test_category_colors_are_distinct_hex() {
        let mut seen = std::collections::HashSet::new();
        for category in Category::EXPENSE.iter().chain(Category::INCOME.iter()) {
            let color = category.color();
            assert!(color.starts_with('#') && color.len() == 7, "{}", color);
            assert!(seen.insert(color), "duplicate colour {}", color);
        }
    }

    #[test]
    fn test_category_serde_matches_as_str() {
        for category in Category::EXPENSE.iter().chain(Category::INCOME.iter()) {
            let json = serde_json::to_string(category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_filter_conditions_bind_in_order() {
        let filter = MovementFilter {
            kinds: vec![MovementKind::Expense],
            categories: vec![Category::Groceries, Category::Pets],
            amount_min: Some(Decimal::new(1000, 2)),
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM movements m WHERE m.family_id = ");
        qb.push_bind(Uuid::new_v4());
        filter.push_conditions(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM movements m WHERE m.family_id = $1 AND m.kind IN ($2) \
             AND m.category IN ($3, $4) AND m.amount >= $5 AND m.user_id = $6"
        );
    }

    #[test]
    fn test_empty_filter_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        MovementFilter::default().push_conditions(&mut qb);
        assert_eq!(qb.sql(), "SELECT 1");
    }
}
