//! History extraction over a scoped copy of the foreign `History` database.

use crate::chrome::ChromeProfile;
use crate::common::{
    chrome_epoch_to_utc, is_http_url, open_readonly, ChromiumQueries, DataFiles, TempDbCopy,
};
use crate::error::MigrateResult;
use crate::types::HistoryRecord;
use std::path::Path;
use tracing::{info, warn};

/// Reads the most recent visited-URL records, newest first, capped at
/// `row_limit` rows. Absence of the database is an empty result; any later
/// failure degrades to whatever was already accumulated.
pub fn extract_history(profile: &ChromeProfile, row_limit: usize) -> Vec<HistoryRecord> {
    let db_path = profile.path.join(DataFiles::HISTORY_DB);
    if !db_path.is_file() {
        return Vec::new();
    }

    let mut records = Vec::new();
    match collect_history(&db_path, row_limit, &mut records) {
        Ok(()) => info!(
            "extracted {} history records from profile {}",
            records.len(),
            profile.id
        ),
        Err(e) => warn!(
            "history extraction stopped after {} records: {}",
            records.len(),
            e
        ),
    }
    records
}

fn collect_history(
    db_path: &Path,
    row_limit: usize,
    out: &mut Vec<HistoryRecord>,
) -> MigrateResult<()> {
    let copy = TempDbCopy::create(db_path)?;
    let conn = open_readonly(copy.path())?;

    let mut stmt = conn.prepare(ChromiumQueries::HISTORY)?;
    let rows = stmt.query_map([row_limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    for row in rows {
        let (url, title, last_visit_time) = row?;
        if !is_http_url(&url) {
            continue;
        }
        let title = title.unwrap_or_default();
        out.push(HistoryRecord {
            title: if title.is_empty() { url.clone() } else { title },
            visited_at: chrome_epoch_to_utc(last_visit_time),
            url,
        });
    }

    Ok(())
}
