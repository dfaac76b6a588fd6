//! Candidate store
//!
//! Job postings persisted in SQLite. The search pipeline only reads them; the
//! store is filled by importing JSON exports of the posting table.

mod database;

pub use database::{Database, DbPool};

use crate::error::{ExpboardError, Result};
use crate::model::Candidate;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;

const SELECT_COLUMNS: &str = "id, title, company_name, location, location_type, \
                              duration_label, skill_level, industry, skills";

/// Raw row before the vocabulary columns are parsed
struct PostingRow {
    id: String,
    title: String,
    company_name: String,
    location: String,
    location_type: String,
    duration_label: String,
    skill_level: String,
    industry: String,
    skills: String,
}

impl PostingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            company_name: row.get(2)?,
            location: row.get(3)?,
            location_type: row.get(4)?,
            duration_label: row.get(5)?,
            skill_level: row.get(6)?,
            industry: row.get(7)?,
            skills: row.get(8)?,
        })
    }

    fn into_candidate(self) -> Result<Candidate> {
        let skills: Vec<String> =
            serde_json::from_str(&self.skills).map_err(|e| ExpboardError::Json {
                source: e,
                context: format!("Invalid skills column for posting {}", self.id),
            })?;

        Ok(Candidate {
            location_type: self.location_type.parse()?,
            duration_label: self.duration_label.parse()?,
            skill_level: self.skill_level.parse()?,
            industry: self.industry.parse()?,
            id: self.id,
            title: self.title,
            company_name: self.company_name,
            location: self.location,
            skills,
        })
    }
}

/// Persistent source of candidates
pub struct CandidateStore {
    database: Database,
}

impl CandidateStore {
    /// Open the store at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            database: Database::new(db_path)?,
        })
    }

    /// Insert or replace one posting
    pub fn upsert(&self, candidate: &Candidate) -> Result<()> {
        self.upsert_many(std::slice::from_ref(candidate))
            .map(|_| ())
    }

    /// Insert or replace many postings in one transaction
    pub fn upsert_many(&self, candidates: &[Candidate]) -> Result<usize> {
        let mut conn = self.database.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().timestamp();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO postings (id, title, company_name, location, location_type,
                                       duration_label, skill_level, industry, skills, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    company_name = excluded.company_name,
                    location = excluded.location,
                    location_type = excluded.location_type,
                    duration_label = excluded.duration_label,
                    skill_level = excluded.skill_level,
                    industry = excluded.industry,
                    skills = excluded.skills,
                    updated_at = excluded.updated_at",
            )?;

            for candidate in candidates {
                let skills =
                    serde_json::to_string(&candidate.skills).map_err(|e| ExpboardError::Json {
                        source: e,
                        context: format!("Failed to encode skills for {}", candidate.id),
                    })?;

                stmt.execute(params![
                    candidate.id,
                    candidate.title,
                    candidate.company_name,
                    candidate.location,
                    candidate.location_type.as_str(),
                    candidate.duration_label.as_str(),
                    candidate.skill_level.as_str(),
                    candidate.industry.as_str(),
                    skills,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(candidates.len())
    }

    /// Fetch one posting by id
    pub fn get(&self, id: &str) -> Result<Option<Candidate>> {
        let conn = self.database.get_conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM postings WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                PostingRow::from_row,
            )
            .optional()?;

        row.map(PostingRow::into_candidate).transpose()
    }

    /// All postings in insertion order
    pub fn list_all(&self) -> Result<Vec<Candidate>> {
        let conn = self.database.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM postings ORDER BY seq",
            SELECT_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], PostingRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(PostingRow::into_candidate).collect()
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.database.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM postings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Remove a posting. Errors if it does not exist.
    pub fn delete(&self, id: &str) -> Result<()> {
        let conn = self.database.get_conn()?;
        let removed = conn.execute("DELETE FROM postings WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(ExpboardError::CandidateNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Import a JSON array of postings, returning how many were stored
    pub fn import_json(&self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| ExpboardError::Io {
            source: e,
            context: format!("Failed to read postings file: {:?}", path),
        })?;

        let candidates: Vec<Candidate> =
            serde_json::from_str(&content).map_err(|e| ExpboardError::Json {
                source: e,
                context: format!("Failed to parse postings file: {:?}", path),
            })?;

        let stored = self.upsert_many(&candidates)?;
        tracing::info!("Imported {} postings from {:?}", stored, path);
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DurationLabel, Industry, LocationType, SkillLevel};
    use tempfile::TempDir;

    fn store() -> (TempDir, CandidateStore) {
        let temp = TempDir::new().unwrap();
        let store = CandidateStore::open(&temp.path().join("postings.db")).unwrap();
        (temp, store)
    }

    fn posting(id: &str) -> Candidate {
        Candidate::new(id, "UX Intern", "Pixel Co")
            .with_location("Austin, TX", LocationType::Hybrid)
            .with_industry(Industry::Design)
            .with_skill_level(SkillLevel::Intermediate)
            .with_duration(DurationLabel::ThreeToSixMonths)
            .with_skills(["Figma", "Research"])
    }

    #[test]
    fn test_upsert_and_get() {
        let (_temp, store) = store();
        store.upsert(&posting("a")).unwrap();

        let loaded = store.get("a").unwrap().unwrap();
        assert_eq!(loaded, posting("a"));
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_and_keeps_order() {
        let (_temp, store) = store();
        store
            .upsert_many(&[posting("a"), posting("b"), posting("c")])
            .unwrap();

        let mut renamed = posting("a");
        renamed.title = "Senior UX Intern".to_string();
        store.upsert(&renamed).unwrap();

        let all = store.list_all().unwrap();
        let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(all[0].title, "Senior UX Intern");
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_delete() {
        let (_temp, store) = store();
        store.upsert(&posting("a")).unwrap();

        store.delete("a").unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(matches!(
            store.delete("a"),
            Err(ExpboardError::CandidateNotFound { .. })
        ));
    }

    #[test]
    fn test_import_json() {
        let (temp, store) = store();
        let path = temp.path().join("postings.json");
        let json = serde_json::to_string(&vec![posting("x"), posting("y")]).unwrap();
        std::fs::write(&path, json).unwrap();

        assert_eq!(store.import_json(&path).unwrap(), 2);
        assert_eq!(store.get("y").unwrap().unwrap().skills.len(), 2);
    }

    #[test]
    fn test_import_rejects_unknown_vocabulary() {
        let (temp, store) = store();
        let path = temp.path().join("bad.json");
        std::fs::write(
            &path,
            r#"[{"id":"1","title":"t","companyName":"c","location":"l",
                "locationType":"orbital","durationLabel":"flexible",
                "skillLevel":"beginner","industry":"tech"}]"#,
        )
        .unwrap();

        assert!(store.import_json(&path).is_err());
        assert_eq!(store.count().unwrap(), 0);
    }
}
