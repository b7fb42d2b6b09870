//! Key-value document tables stored as JSONB rows in `kv_documents`.

use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use crate::{Error, Result, db::Db};

/// Range key used by tables that are addressed by a single key.
pub const NO_RANGE_KEY: &str = "";

/// A case-insensitive substring criterion on a top-level string field of the document.
#[derive(Clone, Debug)]
pub struct ScanCriterion {
	pub field: String,
	pub contains: String,
}

pub async fn get_by_key(db: &Db, table: &str, key: &str) -> Result<Option<Value>> {
	get_by_composite_key(db, table, key, NO_RANGE_KEY).await
}

pub async fn get_by_composite_key(
	db: &Db,
	table: &str,
	hash_key: &str,
	range_key: &str,
) -> Result<Option<Value>> {
	let doc: Option<Value> = sqlx::query_scalar(
		"\
SELECT doc
FROM kv_documents
WHERE table_name = $1 AND hash_key = $2 AND range_key = $3",
	)
	.bind(table)
	.bind(hash_key)
	.bind(range_key)
	.fetch_optional(&db.pool)
	.await?;

	Ok(doc)
}

/// Inserts or replaces one document and returns what was stored.
pub async fn put(
	db: &Db,
	table: &str,
	hash_key: &str,
	range_key: &str,
	doc: &Value,
) -> Result<Value> {
	if !doc.is_object() {
		return Err(Error::InvalidArgument(format!(
			"Documents in {table} must be JSON objects."
		)));
	}

	let stored: Value = sqlx::query_scalar(
		"\
INSERT INTO kv_documents (table_name, hash_key, range_key, doc, updated_at)
VALUES ($1, $2, $3, $4, now())
ON CONFLICT (table_name, hash_key, range_key)
DO UPDATE SET doc = EXCLUDED.doc, updated_at = EXCLUDED.updated_at
RETURNING doc",
	)
	.bind(table)
	.bind(hash_key)
	.bind(range_key)
	.bind(doc)
	.fetch_one(&db.pool)
	.await?;

	Ok(stored)
}

/// Returns every document in `table` matching all criteria, in key order.
pub async fn scan(db: &Db, table: &str, criteria: &[ScanCriterion]) -> Result<Vec<Value>> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT doc FROM kv_documents WHERE table_name = ");

	builder.push_bind(table);

	for criterion in criteria {
		builder.push(" AND strpos(lower(doc ->> ");
		builder.push_bind(criterion.field.as_str());
		builder.push("), lower(");
		builder.push_bind(criterion.contains.as_str());
		builder.push(")) > 0");
	}

	builder.push(" ORDER BY hash_key, range_key");

	let docs: Vec<Value> = builder.build_query_scalar().fetch_all(&db.pool).await?;

	Ok(docs)
}
