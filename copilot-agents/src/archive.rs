//! Archive of finished campaigns backed by SQLite.
//!
//! Only finalized [`CampaignResult`]s are stored. Campaign state itself never
//! outlives its run.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::workflow::CampaignResult;

/// Summary row for a stored campaign.
#[derive(Debug, Clone)]
pub struct ArchivedCampaign {
    pub id: i64,
    pub brief: String,
    pub is_approved: bool,
    pub attempts: u32,
    pub final_copy: String,
    pub image_reference: String,
    pub duration_ms: u64,
    pub created_at: String,
}

/// Campaign archive store.
pub struct Archive {
    db: Mutex<Connection>,
}

impl Archive {
    /// Open or create an archive database.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Connection::open(path).context("Failed to open archive database")?;
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS campaigns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                brief TEXT NOT NULL,
                is_approved INTEGER NOT NULL,
                attempts INTEGER NOT NULL,
                final_copy TEXT NOT NULL,
                image_reference TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                result_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_campaigns_created
                ON campaigns(created_at);",
        )?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| anyhow!("archive lock poisoned"))
    }

    /// Store a finished campaign, returning its row id.
    pub fn record(&self, result: &CampaignResult) -> Result<i64> {
        let json = serde_json::to_string(result).context("Failed to serialize campaign")?;
        let db = self.conn()?;
        let now = Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO campaigns
                (brief, is_approved, attempts, final_copy, image_reference, duration_ms, result_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                result.brief,
                result.is_approved,
                result.attempt_count,
                result.final_copy,
                result.image_reference,
                result.duration.as_millis() as i64,
                json,
                now
            ],
        )?;
        Ok(db.last_insert_rowid())
    }

    /// Most recent campaigns, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<ArchivedCampaign>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT id, brief, is_approved, attempts, final_copy, image_reference, duration_ms, created_at
             FROM campaigns ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(rusqlite::params![limit as i64], |row| {
                Ok(ArchivedCampaign {
                    id: row.get(0)?,
                    brief: row.get(1)?,
                    is_approved: row.get(2)?,
                    attempts: row.get(3)?,
                    final_copy: row.get(4)?,
                    image_reference: row.get(5)?,
                    duration_ms: row.get::<_, i64>(6)? as u64,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Full stored result for a campaign.
    pub fn get(&self, id: i64) -> Result<Option<CampaignResult>> {
        let db = self.conn()?;
        let mut stmt = db.prepare("SELECT result_json FROM campaigns WHERE id = ?1")?;
        let json = stmt
            .query_row(rusqlite::params![id], |row| row.get::<_, String>(0))
            .optional()?;
        json.map(|j| serde_json::from_str(&j).context("Corrupt archived campaign"))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(brief: &str, approved: bool) -> CampaignResult {
        CampaignResult {
            brief: brief.to_string(),
            approved_text: approved.then(|| "copy".to_string()),
            final_copy: "copy".to_string(),
            image_reference: "campaign_output_1.png".to_string(),
            attempt_count: 2,
            iteration_count: 3,
            feedback_history: vec!["[TONE] flat".into(), "APPROVED".into()],
            compliance_flags: vec!["[TONE] flat".into()],
            is_approved: approved,
            steps: 5,
            duration: Duration::from_millis(1500),
            execution_log: vec![],
        }
    }

    #[test]
    fn record_and_list_newest_first() {
        let archive = Archive::in_memory().unwrap();
        archive.record(&result("first", true)).unwrap();
        archive.record(&result("second", false)).unwrap();

        let recent = archive.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].brief, "second");
        assert!(!recent[0].is_approved);
        assert_eq!(recent[1].brief, "first");
        assert_eq!(recent[1].attempts, 2);
        assert_eq!(recent[1].duration_ms, 1500);
    }

    #[test]
    fn recent_respects_limit() {
        let archive = Archive::in_memory().unwrap();
        for i in 0..5 {
            archive.record(&result(&format!("brief {i}"), true)).unwrap();
        }
        assert_eq!(archive.recent(3).unwrap().len(), 3);
    }

    #[test]
    fn get_returns_full_result() {
        let archive = Archive::in_memory().unwrap();
        let original = result("bottle", true);
        let id = archive.record(&original).unwrap();
        assert_eq!(archive.get(id).unwrap(), Some(original));
        assert_eq!(archive.get(id + 100).unwrap(), None);
    }
}
