use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    export::ShoppingList,
    schema::{Id, ShoppingListRow},
};

/// Sums the ingredient amounts of every recipe in the user's cart, one row
/// per (name, unit) pair, in alphabetical order of name. Case is ignored;
/// letters beyond ASCII follow the database collation.
pub async fn list_shopping_cart(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListRow>, Error> {
    let rows: Vec<ShoppingListRow> = sqlx::query_as(
        r#"
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ir.amount)::BIGINT AS amount
        FROM carts c
        INNER JOIN ingredient_recipes ir ON ir.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ir.ingredient_id
        WHERE c.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY LOWER(i.name), i.name, LOWER(i.measurement_unit), i.measurement_unit
    "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn shopping_list(user_id: Id, pool: &Pool<Postgres>) -> Result<ShoppingList, Error> {
    let rows = list_shopping_cart(user_id, pool).await?;
    log::trace!("Shopping list for user {user_id} has {} lines", rows.len());

    Ok(ShoppingList::new(rows))
}
