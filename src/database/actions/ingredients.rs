use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{Error, HtmlError, QueryError, TypeError},
    schema::{Id, Ingredient},
    serializers::IngredientPayload,
};

// Postgres accepts at most 65535 bind parameters per statement
const IMPORT_BATCH_SIZE: usize = 65535 / 2;

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Ingredients whose name starts with `name` (case-insensitive), or all of
/// them.
pub async fn list_ingredients(
    name: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let prefix = format!("{}%", escape_like(name.unwrap_or("").trim()));

    let rows: Vec<Ingredient> = sqlx::query_as(
        "SELECT id, name, measurement_unit FROM ingredients WHERE name ILIKE $1 ORDER BY name, id",
    )
    .bind(prefix)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> =
        sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn create_ingredient(
    ingredient: IngredientPayload,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, Error> {
    let row: Option<Ingredient> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        RETURNING id, name, measurement_unit
    ",
    )
    .bind(ingredient.name)
    .bind(ingredient.measurement_unit)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    let ingredient = row.ok_or_else(|| {
        HtmlError::InvalidRequest.new("Ingredient with this measurement unit already exists")
    })?;
    log::info!("Created ingredient {} ({})", ingredient.name, ingredient.id);

    Ok(ingredient)
}

pub async fn delete_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("No ingredient exists with specified id"));
    }

    log::info!("Deleted ingredient {id}");
    Ok(())
}

/// Inserts every (name, unit) pair that does not exist yet. Returns how many
/// rows were added.
pub async fn import_ingredients(
    ingredients: &[IngredientPayload],
    pool: &Pool<Postgres>,
) -> Result<u64, Error> {
    let mut inserted = 0;

    for batch in ingredients.chunks(IMPORT_BATCH_SIZE) {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");

        query_builder.push_values(batch, |mut b, ingredient| {
            b.push_bind(ingredient.name.clone())
                .push_bind(ingredient.measurement_unit.clone());
        });
        query_builder.push(" ON CONFLICT DO NOTHING");

        inserted += query_builder
            .build()
            .execute(pool)
            .await
            .map_err(QueryError::from)?
            .rows_affected();
    }

    log::info!(
        "Imported {inserted} of {} ingredients",
        ingredients.len()
    );
    Ok(inserted)
}

/// One CSV record and the line it starts on.
struct CsvRecord {
    line: usize,
    fields: Vec<String>,
}

/// Splits `content` into records. Quoted fields may hold commas, doubled
/// quotes and line breaks.
fn read_csv_records(content: &str) -> Result<Vec<CsvRecord>, TypeError> {
    let mut records = vec![];
    let mut fields = vec![];
    let mut field = String::new();
    let mut quoted = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field)),
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                fields.push(std::mem::take(&mut field));
                records.push(CsvRecord {
                    line: record_line,
                    fields: std::mem::take(&mut fields),
                });
                line += 1;
                record_line = line;
            }
            ('\n', true) => {
                field.push(c);
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if quoted {
        return Err(TypeError::new(&format!(
            "Line {record_line}: unterminated quoted field"
        )));
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(CsvRecord {
            line: record_line,
            fields,
        });
    }

    Ok(records
        .into_iter()
        .filter(|record| !record.fields.iter().all(|f| f.trim().is_empty()))
        .collect())
}

/// Reads `name,measurement_unit` records. Blank lines are skipped.
pub fn parse_ingredient_csv(content: &str) -> Result<Vec<IngredientPayload>, TypeError> {
    read_csv_records(content)?
        .into_iter()
        .map(|CsvRecord { line, fields }| match <[String; 2]>::try_from(fields) {
            Ok([name, measurement_unit]) => IngredientPayload {
                name,
                measurement_unit,
            }
            .validate()
            .map_err(|e| TypeError::new(&format!("Line {line}: {}", e.info.unwrap_or_default()))),
            Err(fields) => Err(TypeError::new(&format!(
                "Line {line}: expected 2 fields, found {}",
                fields.len()
            ))),
        })
        .collect()
}
