// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Audit log writes. Write-only from mutation paths; there is no read
//! endpoint in this implementation (`spec.md` §6 names no such route).

use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::error::Result;

pub async fn record(
	tx: &mut Transaction<'_, Sqlite>,
	entity_type: &str,
	entity_id: &str,
	action: &str,
	actor: Option<&str>,
	diff: &impl Serialize,
) -> Result<()> {
	let diff_json = serde_json::to_string(diff)?;

	sqlx::query(
		r#"
		INSERT INTO audit_log (id, entity_type, entity_id, action, actor, diff, created_at)
		VALUES (?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(Uuid::new_v4().to_string())
	.bind(entity_type)
	.bind(entity_id)
	.bind(action)
	.bind(actor)
	.bind(diff_json)
	.bind(Utc::now().to_rfc3339())
	.execute(&mut **tx)
	.await?;

	Ok(())
}
