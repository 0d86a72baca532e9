// src/db/queries/stock.rs
//
// Stationery stock levels. Submission validates quantities against these
// rows; completing a request consumes them.
use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

/// Available stock keyed by lower-cased item name.
pub async fn get_stock_map(pool: &PgPool) -> Result<HashMap<String, i32>, sqlx::Error> {
    let rows: Vec<(String, i32)> =
        sqlx::query_as("SELECT item, available FROM stationery_stock")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(item, available)| (item.to_lowercase(), available))
        .collect())
}

/// Consume `quantity` of an item. Returns false when the row is missing or
/// the remaining stock is insufficient; nothing is written in that case.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    item: &str,
    quantity: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE stationery_stock
        SET available = available - $2
        WHERE lower(item) = lower($1) AND available >= $2
        "#,
    )
    .bind(item)
    .bind(quantity)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
