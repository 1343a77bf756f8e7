use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::job::{Job, JobStatus};
use crate::models::product::{ProductRecord, RowRecord, RowResult};

/// Insert a new batch job with its input rows
pub async fn create_job(pool: &PgPool, rows: &[RowRecord]) -> Result<Job, sqlx::Error> {
    let input_rows = serde_json::to_value(rows).map_err(into_sqlx_encode)?;

    let row = sqlx::query(
        r#"
        INSERT INTO jobs (status, input_rows)
        VALUES ('pending', $1)
        RETURNING id, input_rows, output_path, error, created_at, updated_at
        "#,
    )
    .bind(&input_rows)
    .fetch_one(pool)
    .await?;

    Ok(Job {
        id: row.try_get("id")?,
        status: JobStatus::Pending,
        input_rows: decode_json(row.try_get("input_rows")?)?,
        results: Vec::new(),
        output_path: row.try_get("output_path")?,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Get a job by ID, with its row results assembled in submission order
pub async fn get_job(pool: &PgPool, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, status, input_rows, output_path, error, created_at, updated_at
        FROM jobs
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    let Some(r) = row else {
        return Ok(None);
    };

    let status_str: String = r.try_get("status")?;
    let status = status_str.parse().unwrap_or(JobStatus::Pending);

    let result_rows = sqlx::query(
        r#"
        SELECT result
        FROM job_rows
        WHERE job_id = $1
        ORDER BY row_index ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    let results = result_rows
        .into_iter()
        .map(|r| decode_json::<RowResult>(r.try_get("result")?))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Job {
        id: r.try_get("id")?,
        status,
        input_rows: decode_json(r.try_get("input_rows")?)?,
        results,
        output_path: r.try_get("output_path")?,
        error: r.try_get("error")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    }))
}

/// Move a pending job to processing. Guarded so a job that already left
/// pending (including terminal states) is not touched.
pub async fn mark_processing(pool: &PgPool, job_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET status = 'processing',
            processing_started_at = NOW(),
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record one row's result at its submission index.
/// `ON CONFLICT DO NOTHING` makes reapplying the same index a no-op.
pub async fn append_row_result(
    pool: &PgPool,
    job_id: Uuid,
    index: usize,
    result: &RowResult,
) -> Result<(), sqlx::Error> {
    let result_json = serde_json::to_value(result).map_err(into_sqlx_encode)?;

    sqlx::query(
        r#"
        INSERT INTO job_rows (job_id, row_index, result)
        VALUES ($1, $2, $3)
        ON CONFLICT (job_id, row_index) DO NOTHING
        "#,
    )
    .bind(job_id)
    .bind(index as i32)
    .bind(&result_json)
    .execute(pool)
    .await?;

    Ok(())
}

/// Move a job to a terminal state. Guarded: once completed or failed the
/// record is immutable, so a duplicate finalize is a no-op.
pub async fn finalize_job(
    pool: &PgPool,
    job_id: Uuid,
    status: JobStatus,
    output_path: Option<&str>,
    error: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET status = $1,
            output_path = $2,
            error = $3,
            processing_completed_at = NOW(),
            updated_at = NOW()
        WHERE id = $4 AND status NOT IN ('completed', 'failed')
        "#,
    )
    .bind(status.to_string())
    .bind(output_path)
    .bind(error)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Atomic upsert of the product record keyed by serial number.
/// Concurrent batches referencing the same serial never produce duplicates.
pub async fn upsert_product(pool: &PgPool, result: &RowResult) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO products (serial_number, product_name, input_image_urls, output_image_urls, processed)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (serial_number) DO UPDATE
        SET product_name = EXCLUDED.product_name,
            input_image_urls = EXCLUDED.input_image_urls,
            output_image_urls = EXCLUDED.output_image_urls,
            processed = EXCLUDED.processed
        "#,
    )
    .bind(result.serial_number)
    .bind(&result.product_name)
    .bind(result.input_urls_joined())
    .bind(result.output_urls_joined())
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a product record by serial number
pub async fn get_product(
    pool: &PgPool,
    serial_number: i64,
) -> Result<Option<ProductRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT serial_number, product_name, input_image_urls, output_image_urls, processed
        FROM products
        WHERE serial_number = $1
        "#,
    )
    .bind(serial_number)
    .fetch_optional(pool)
    .await?;

    Ok(match row {
        Some(r) => Some(ProductRecord {
            serial_number: r.try_get("serial_number")?,
            product_name: r.try_get("product_name")?,
            input_image_urls: r.try_get("input_image_urls")?,
            output_image_urls: r.try_get("output_image_urls")?,
            processed: r.try_get("processed")?,
        }),
        None => None,
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, sqlx::Error> {
    serde_json::from_value(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn into_sqlx_encode(e: serde_json::Error) -> sqlx::Error {
    sqlx::Error::Encode(Box::new(e))
}
