use crate::models::{BoundingBox, CatalogRow, Condition, Item, OrderBy, Predicate, Property};
use crate::services::store::{CatalogStore, ItemStore, PropertyStore, StoreError};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;

// Postgres caps bind parameters per statement at 65535
const INSERT_CHUNK_SIZE: usize = 1000;

/// Table layout of one catalog
trait SqlTable: CatalogRow + for<'r> FromRow<'r, PgRow> + Unpin {
    const TABLE: &'static str;
    const PRICE_COLUMN: &'static str;
    const COLUMNS: &'static str;

    fn push_values(row: &Self, values: &mut Separated<'_, '_, Postgres, &'static str>);
}

impl SqlTable for Item {
    const TABLE: &'static str = "items";
    const PRICE_COLUMN: &'static str = "price";
    const COLUMNS: &'static str = "id, name, description, thumbnail, price, height, width, depth, \
        color, features, kind, popularity, stock, features_array, \
        price_range, height_range, width_range, depth_range";

    fn push_values(row: &Self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(row.id)
            .push_bind(row.name.clone())
            .push_bind(row.description.clone())
            .push_bind(row.thumbnail.clone())
            .push_bind(row.price)
            .push_bind(row.height)
            .push_bind(row.width)
            .push_bind(row.depth)
            .push_bind(row.color.clone())
            .push_bind(row.features.clone())
            .push_bind(row.kind.clone())
            .push_bind(row.popularity)
            .push_bind(row.stock)
            .push_bind(row.features_array.clone())
            .push_bind(row.price_range)
            .push_bind(row.height_range)
            .push_bind(row.width_range)
            .push_bind(row.depth_range);
    }
}

impl SqlTable for Property {
    const TABLE: &'static str = "properties";
    const PRICE_COLUMN: &'static str = "rent";
    const COLUMNS: &'static str = "id, thumbnail, name, description, latitude, longitude, \
        address, rent, door_height, door_width, features, popularity, features_array, \
        rent_range, door_height_range, door_width_range";

    fn push_values(row: &Self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(row.id)
            .push_bind(row.thumbnail.clone())
            .push_bind(row.name.clone())
            .push_bind(row.description.clone())
            .push_bind(row.latitude)
            .push_bind(row.longitude)
            .push_bind(row.address.clone())
            .push_bind(row.rent)
            .push_bind(row.door_height)
            .push_bind(row.door_width)
            .push_bind(row.features.clone())
            .push_bind(row.popularity)
            .push_bind(row.features_array.clone())
            .push_bind(row.rent_range)
            .push_bind(row.door_height_range)
            .push_bind(row.door_width_range);
    }
}

/// A primary key collision is bad input, not an outage
fn insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            tracing::warn!("Insert rejected: {}", db_err.message());
            return StoreError::InvalidInput(format!("duplicate id: {}", db_err.message()));
        }
    }
    StoreError::SqlxError(err)
}

/// Append ` WHERE ...` for a non-empty predicate
fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    if predicate.is_empty() {
        return;
    }

    builder.push(" WHERE ");
    let mut conditions = builder.separated(" AND ");
    for condition in &predicate.conditions {
        match condition {
            Condition::Equals { column, value } => {
                conditions.push(column.as_sql());
                conditions.push_unseparated(" = ");
                conditions.push_bind_unseparated(*value);
            }
            Condition::TextEquals { column, value } => {
                conditions.push(column.as_sql());
                conditions.push_unseparated(" = ");
                conditions.push_bind_unseparated(value.clone());
            }
            Condition::AtLeast { column, value } => {
                conditions.push(column.as_sql());
                conditions.push_unseparated(" >= ");
                conditions.push_bind_unseparated(*value);
            }
            Condition::TagsContain(tags) => {
                conditions.push("features_array @> ");
                conditions.push_bind_unseparated(tags.clone());
            }
            Condition::InStock => {
                conditions.push("stock > 0");
            }
        }
    }
}

fn order_clause<R: SqlTable>(order: OrderBy) -> String {
    match order {
        OrderBy::Popularity => " ORDER BY popularity DESC, id ASC".to_string(),
        OrderBy::LowestPrice => format!(" ORDER BY {} ASC, id ASC", R::PRICE_COLUMN),
    }
}

/// PostgreSQL client backing one catalog
///
/// Items and properties live in separate databases in production; each gets
/// its own client and pool. Both tables are created by the migrations so any
/// client can serve either catalog.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn count_rows<R: SqlTable>(&self, predicate: &Predicate) -> Result<i64, StoreError> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", R::TABLE));
        push_predicate(&mut builder, predicate);

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.try_get(0)?)
    }

    async fn select_rows<R: SqlTable>(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<R>, StoreError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM {}", R::COLUMNS, R::TABLE));
        push_predicate(&mut builder, predicate);
        builder.push(order_clause::<R>(order));
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let rows = builder.build_query_as::<R>().fetch_all(&self.pool).await?;
        tracing::debug!("Selected {} rows from {}", rows.len(), R::TABLE);
        Ok(rows)
    }

    async fn row_by_id<R: SqlTable>(&self, id: i64) -> Result<Option<R>, StoreError> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", R::COLUMNS, R::TABLE);
        Ok(sqlx::query_as::<_, R>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_rows<R: SqlTable>(&self, rows: &[R]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let mut builder =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", R::TABLE, R::COLUMNS));
            builder.push_values(chunk, |mut values, row| R::push_values(row, &mut values));
            inserted += builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(insert_error)?
                .rows_affected();
        }

        tx.commit().await?;
        tracing::info!("Inserted {} rows into {}", inserted, R::TABLE);
        Ok(inserted)
    }

    async fn truncate<R: SqlTable>(&self) -> Result<(), StoreError> {
        sqlx::query(&format!("TRUNCATE TABLE {}", R::TABLE))
            .execute(&self.pool)
            .await?;
        tracing::info!("Truncated {}", R::TABLE);
        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl CatalogStore<Item> for PostgresClient {
    async fn count(&self, predicate: &Predicate) -> Result<i64, StoreError> {
        self.count_rows::<Item>(predicate).await
    }

    async fn select(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Item>, StoreError> {
        self.select_rows(predicate, order, limit, offset).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Item>, StoreError> {
        self.row_by_id(id).await
    }

    async fn insert(&self, rows: &[Item]) -> Result<u64, StoreError> {
        self.insert_rows(rows).await
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.truncate::<Item>().await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        PostgresClient::health_check(self).await
    }
}

#[async_trait]
impl ItemStore for PostgresClient {
    async fn conditional_decrement(&self, id: i64) -> Result<Option<i64>, StoreError> {
        let query = r#"
            UPDATE items
            SET stock = stock - 1
            WHERE id = $1 AND stock > 0
            RETURNING stock
        "#;

        let row = sqlx::query(query).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.get("stock")))
    }
}

#[async_trait]
impl CatalogStore<Property> for PostgresClient {
    async fn count(&self, predicate: &Predicate) -> Result<i64, StoreError> {
        self.count_rows::<Property>(predicate).await
    }

    async fn select(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Property>, StoreError> {
        self.select_rows(predicate, order, limit, offset).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Property>, StoreError> {
        self.row_by_id(id).await
    }

    async fn insert(&self, rows: &[Property]) -> Result<u64, StoreError> {
        self.insert_rows(rows).await
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.truncate::<Property>().await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        PostgresClient::health_check(self).await
    }
}

#[async_trait]
impl PropertyStore for PostgresClient {
    async fn select_box(
        &self,
        bbox: &BoundingBox,
        order: OrderBy,
    ) -> Result<Vec<Property>, StoreError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE latitude >= ",
            Property::COLUMNS,
            Property::TABLE
        ));
        builder.push_bind(bbox.min_lat);
        builder.push(" AND latitude <= ").push_bind(bbox.max_lat);
        builder.push(" AND longitude >= ").push_bind(bbox.min_lon);
        builder.push(" AND longitude <= ").push_bind(bbox.max_lon);
        builder.push(order_clause::<Property>(order));

        let rows = builder
            .build_query_as::<Property>()
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!("Bounding box query returned {} candidates", rows.len());
        Ok(rows)
    }
}
