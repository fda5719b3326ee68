//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use orders_types::{
    Order, OrderId, OrderRepository, PaymentMethod, PaymentMethodId, PaymentMethodRepository,
    RepoError, UserId,
};

use crate::types::{DbOrder, DbPaymentMethod, ORDER_COLUMNS, PAYMENT_METHOD_COLUMNS, db_error};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository implementation.
///
/// Order updates are a single conditional `UPDATE`, so no row locks are held
/// between reading an order and writing it back.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> anyhow::Result<()> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        let repo = Self { pool };
        repo.run_migrations().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run_migrations(&self) -> anyhow::Result<()> {
        execute_migration(
            &self.pool,
            include_str!("../migrations/0001_create_orders_pg.sql"),
            "0001",
        )
        .await?;
        execute_migration(
            &self.pool,
            include_str!("../migrations/0002_create_payment_methods_pg.sql"),
            "0002",
        )
        .await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OrderRepository for PostgresRepo {
    async fn insert_order(&self, order: &Order) -> Result<(), RepoError> {
        let row = DbOrder::from_domain(order);

        sqlx::query(&format!(
            "INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
            ORDER_COLUMNS
        ))
        .bind(&row.id)
        .bind(&row.product_id)
        .bind(row.user_id)
        .bind(row.quantity)
        .bind(row.unit_price)
        .bind(row.fee)
        .bind(row.total)
        .bind(&row.status)
        .bind(&row.payment_status)
        .bind(&row.payment_method_id)
        .bind(&row.payment_error)
        .bind(row.refund_amount)
        .bind(&row.notes)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(DbOrder::into_domain).transpose()
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(DbOrder::into_domain).collect()
    }

    async fn update_order(&self, order: &Order) -> Result<Order, RepoError> {
        let row = DbOrder::from_domain(order);

        let result = sqlx::query(
            r#"UPDATE orders
               SET status = $1, payment_status = $2, payment_method_id = $3, payment_error = $4,
                   refund_amount = $5, notes = $6, updated_at = $7, version = version + 1
               WHERE id = $8 AND version = $9"#,
        )
        .bind(&row.status)
        .bind(&row.payment_status)
        .bind(&row.payment_method_id)
        .bind(&row.payment_error)
        .bind(row.refund_amount)
        .bind(&row.notes)
        .bind(row.updated_at)
        .bind(&row.id)
        .bind(row.version)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM orders WHERE id = $1")
                .bind(&row.id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

            return match exists {
                None => Err(RepoError::NotFound),
                Some((current,)) => Err(RepoError::Conflict(format!(
                    "Order {} version {} is stale (current {})",
                    row.id, row.version, current
                ))),
            };
        }

        Ok(order.clone().with_next_version())
    }
}

#[async_trait]
impl PaymentMethodRepository for PostgresRepo {
    async fn insert_payment_method(&self, method: &PaymentMethod) -> Result<(), RepoError> {
        let row = DbPaymentMethod::from_domain(method);

        sqlx::query(&format!(
            "INSERT INTO payment_methods ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            PAYMENT_METHOD_COLUMNS
        ))
        .bind(&row.id)
        .bind(row.user_id)
        .bind(&row.method_type)
        .bind(&row.details)
        .bind(row.is_default)
        .bind(row.is_active)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.last_used_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn get_payment_method(
        &self,
        id: PaymentMethodId,
    ) -> Result<Option<PaymentMethod>, RepoError> {
        let row: Option<DbPaymentMethod> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_methods WHERE id = $1",
            PAYMENT_METHOD_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(DbPaymentMethod::into_domain).transpose()
    }

    async fn list_payment_methods_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethod>, RepoError> {
        let rows: Vec<DbPaymentMethod> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_methods WHERE user_id = $1 ORDER BY created_at ASC",
            PAYMENT_METHOD_COLUMNS
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(DbPaymentMethod::into_domain).collect()
    }

    async fn update_payment_method(&self, method: &PaymentMethod) -> Result<(), RepoError> {
        let row = DbPaymentMethod::from_domain(method);

        let result = sqlx::query(
            r#"UPDATE payment_methods
               SET method_type = ?, details = ?, is_default = ?, is_active = ?,
                   updated_at = ?, last_used_at = ?
               WHERE id = $1"#,
        )
        .bind(&row.method_type)
        .bind(&row.details)
        .bind(row.is_default)
        .bind(row.is_active)
        .bind(row.updated_at)
        .bind(row.last_used_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn mark_payment_method_used(&self, id: PaymentMethodId) -> Result<(), RepoError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE payment_methods SET last_used_at = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
