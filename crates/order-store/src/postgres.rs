use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Entity, OrderId, OrderItemId, OrderItemRow, OrderRow, Result, Status, StoreError, Version,
    store::OrderStore,
};

const UNIQUE_ORDER_SKU_EMAIL: &str = "unique_order_sku_email";
const ORDER_ITEMS_ORDER_FK: &str = "order_items_order_id_fkey";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<OrderRow> {
        Ok(OrderRow {
            id: OrderId::new(row.try_get("id")?),
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            received: row.try_get("received")?,
            status: Status::from_code(row.try_get("status")?)?,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItemRow> {
        Ok(OrderItemRow {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            sku: row.try_get("sku")?,
            email: row.try_get("email")?,
            status: Status::from_code(row.try_get("status")?)?,
            version: Version::new(row.try_get("version")?),
        })
    }

    /// Builds the error for a conditional update that touched no row.
    fn conflict_or_missing(
        entity: Entity,
        id: String,
        current: Option<i64>,
        expected: Version,
    ) -> StoreError {
        match current {
            Some(actual) => {
                tracing::debug!(%entity, %id, %expected, actual, "version check failed");
                StoreError::ConcurrentModification {
                    entity,
                    id,
                    expected,
                    actual: Version::new(actual),
                }
            }
            None => StoreError::NotFound { entity, id },
        }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert_order(&self, order: OrderRow) -> Result<OrderId> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, email, first_name, last_name, received, status, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_i64())
        .bind(&order.email)
        .bind(&order.first_name)
        .bind(&order.last_name)
        .bind(order.received)
        .bind(order.status.code())
        .bind(order.version.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::DuplicateOrder(order.id);
            }
            StoreError::Database(e)
        })?;

        Ok(order.id)
    }

    async fn get_order(&self, id: OrderId) -> Result<OrderRow> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, email, first_name, last_name, received, status, version
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::not_found(Entity::Order, id)),
        }
    }

    async fn save_order_if_version(&self, order: &OrderRow, expected: Version) -> Result<Version> {
        let next = expected.next();
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, version = $2
            WHERE id = $3 AND version = $4
            "#,
        )
        .bind(order.status.code())
        .bind(next.as_i64())
        .bind(order.id.as_i64())
        .bind(expected.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(next);
        }

        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(order.id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Err(Self::conflict_or_missing(
            Entity::Order,
            order.id.to_string(),
            current,
            expected,
        ))
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::not_found(Entity::Order, id)),
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some(ORDER_ITEMS_ORDER_FK) =>
            {
                let items: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
                        .bind(id.as_i64())
                        .fetch_one(&self.pool)
                        .await?;
                Err(StoreError::ReferencedByChildren {
                    order_id: id,
                    items: items as usize,
                })
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    async fn insert_order_item(&self, item: OrderItemRow) -> Result<OrderItemId> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, sku, email, status, version)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.order_id.as_i64())
        .bind(&item.sku)
        .bind(&item.email)
        .bind(item.status.code())
        .bind(item.version.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                match db_err.constraint() {
                    Some(UNIQUE_ORDER_SKU_EMAIL) => {
                        return StoreError::DuplicateItem {
                            order_id: item.order_id,
                            sku: item.sku.clone(),
                            email: item.email.clone(),
                        };
                    }
                    Some(ORDER_ITEMS_ORDER_FK) => return StoreError::OrderNotFound(item.order_id),
                    _ => {}
                }
            }
            StoreError::Database(e)
        })?;

        Ok(item.id)
    }

    async fn get_order_item(&self, id: OrderItemId) -> Result<OrderItemRow> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, order_id, sku, email, status, version
            FROM order_items
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_item(row),
            None => Err(StoreError::not_found(Entity::OrderItem, id)),
        }
    }

    async fn save_order_item_if_version(
        &self,
        item: &OrderItemRow,
        expected: Version,
    ) -> Result<Version> {
        let next = expected.next();
        let result = sqlx::query(
            r#"
            UPDATE order_items
            SET status = $1, version = $2
            WHERE id = $3 AND version = $4
            "#,
        )
        .bind(item.status.code())
        .bind(next.as_i64())
        .bind(item.id.as_uuid())
        .bind(expected.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(next);
        }

        let current: Option<i64> =
            sqlx::query_scalar("SELECT version FROM order_items WHERE id = $1")
                .bind(item.id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Err(Self::conflict_or_missing(
            Entity::OrderItem,
            item.id.to_string(),
            current,
            expected,
        ))
    }

    async fn get_items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItemRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, sku, email, status, version
            FROM order_items
            WHERE order_id = $1
            ORDER BY sku ASC, email ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }
}
