//! SQLite + sqlite-vec storage backend.
//!
//! Memories live in the `memories` table (tags and metadata as JSON text);
//! embeddings live in the `memories_vec` vec0 virtual table keyed by the
//! same content hash. Similarity scores are derived from sqlite-vec L2
//! distances: for unit vectors `sim = 1 - d²/2`, clamped to `[0, 1]`.

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, Row};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::db;
use crate::embedding::EmbeddingProvider;
use crate::memory::tags::{self, TagMatch};
use crate::memory::types::{iso_from_epoch, Memory, MemoryQueryResult};
use crate::memory::{embedding_to_bytes, types::epoch_now};
use crate::storage::MemoryStorage;

const MEMORY_COLUMNS: &str =
    "content_hash, content, tags, memory_type, metadata, created_at, updated_at";

pub struct SqliteVecStorage {
    conn: Mutex<Connection>,
    embedding: Arc<dyn EmbeddingProvider>,
    db_path: Option<PathBuf>,
}

impl SqliteVecStorage {
    /// Open (or create) a file-backed store.
    pub fn open(path: impl AsRef<Path>, embedding: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let path = path.as_ref();
        let conn = db::open_database(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedding,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// In-memory store, used by tests.
    pub fn in_memory(embedding: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let conn = db::open_memory_database()?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedding,
            db_path: None,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("db lock poisoned: {e}"))
    }
}

/// Map a `memories` row (selected with [`MEMORY_COLUMNS`]) to a [`Memory`].
fn memory_from_row(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let tags_json: String = row.get(2)?;
    let metadata_json: String = row.get(4)?;
    Ok(Memory {
        content_hash: row.get(0)?,
        content: row.get(1)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        memory_type: row.get(3)?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl MemoryStorage for SqliteVecStorage {
    fn store(&self, memory: &Memory) -> Result<(bool, String)> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM memories WHERE content_hash = ?1",
            params![memory.content_hash],
            |row| row.get(0),
        )?;
        if exists {
            return Ok((
                false,
                format!("Duplicate content detected, skipping (hash: {})", memory.content_hash),
            ));
        }

        let vector = self.embedding.embed(&memory.content)?;

        tx.execute(
            "INSERT INTO memories (content_hash, content, tags, memory_type, metadata, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                memory.content_hash,
                memory.content,
                serde_json::to_string(&memory.tags)?,
                memory.memory_type,
                serde_json::to_string(&memory.metadata)?,
                memory.created_at,
                memory.updated_at,
            ],
        )?;
        tx.execute(
            "INSERT INTO memories_vec (content_hash, embedding) VALUES (?1, ?2)",
            params![memory.content_hash, embedding_to_bytes(&vector)],
        )?;

        tx.commit()?;
        Ok((true, "Memory stored successfully".to_string()))
    }

    fn retrieve(&self, query: &str, n_results: usize) -> Result<Vec<MemoryQueryResult>> {
        let vector = self.embedding.embed(query)?;
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT content_hash, distance FROM memories_vec \
             WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
        )?;
        let neighbors: Vec<(String, f64)> = stmt
            .query_map(params![embedding_to_bytes(&vector), n_results as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut fetch = conn.prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE content_hash = ?1"
        ))?;

        let mut results = Vec::with_capacity(neighbors.len());
        for (hash, distance) in neighbors {
            // The vec index can briefly hold entries for rows deleted out of
            // band; skip rather than fail.
            let memory = match fetch.query_row(params![hash], memory_from_row) {
                Ok(m) => m,
                Err(rusqlite::Error::QueryReturnedNoRows) => continue,
                Err(e) => return Err(e.into()),
            };
            let score = (1.0 - distance * distance / 2.0).clamp(0.0, 1.0);
            results.push(MemoryQueryResult {
                memory,
                relevance_score: Some(score),
                relevance_reason: None,
            });
        }
        Ok(results)
    }

    fn search_by_tags(&self, query_tags: &[String], mode: TagMatch) -> Result<Vec<Memory>> {
        if query_tags.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;

        // ANY fetch via json_each; ALL is refined in Rust below.
        let placeholders: Vec<String> = (1..=query_tags.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT DISTINCT m.content_hash, m.content, m.tags, m.memory_type, m.metadata, \
             m.created_at, m.updated_at \
             FROM memories m, json_each(m.tags) jt \
             WHERE jt.value IN ({}) \
             ORDER BY m.created_at DESC",
            placeholders.join(", ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let bind: Vec<&dyn rusqlite::types::ToSql> = query_tags
            .iter()
            .map(|t| t as &dyn rusqlite::types::ToSql)
            .collect();
        let mut memories: Vec<Memory> = stmt
            .query_map(bind.as_slice(), memory_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if mode == TagMatch::All {
            memories.retain(|m| tags::matches(&m.tags, query_tags, TagMatch::All));
        }
        Ok(memories)
    }

    fn get_by_hash(&self, content_hash: &str) -> Result<Option<Memory>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE content_hash = ?1"
        ))?;
        match stmt.query_row(params![content_hash], memory_from_row) {
            Ok(memory) => Ok(Some(memory)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, content_hash: &str) -> Result<(bool, String)> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM memories WHERE content_hash = ?1",
            params![content_hash],
        )?;
        tx.execute(
            "DELETE FROM memories_vec WHERE content_hash = ?1",
            params![content_hash],
        )?;
        tx.commit()?;

        if removed == 0 {
            Ok((false, format!("Memory with hash {content_hash} not found")))
        } else {
            Ok((true, format!("Successfully deleted memory {content_hash}")))
        }
    }

    fn get_all_memories(
        &self,
        limit: Option<usize>,
        offset: usize,
        tags: Option<&[String]>,
        memory_type: Option<&str>,
    ) -> Result<Vec<Memory>> {
        let conn = self.lock()?;

        let mut sql = format!("SELECT {MEMORY_COLUMNS} FROM memories m WHERE 1=1");
        let mut bind: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(mt) = memory_type {
            bind.push(Box::new(mt.to_string()));
            sql.push_str(&format!(" AND m.memory_type = ?{}", bind.len()));
        }
        if let Some(query_tags) = tags {
            for tag in query_tags {
                bind.push(Box::new(tag.clone()));
                sql.push_str(&format!(
                    " AND EXISTS (SELECT 1 FROM json_each(m.tags) jt WHERE jt.value = ?{})",
                    bind.len()
                ));
            }
        }

        // SQLite treats LIMIT -1 as unbounded.
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        bind.push(Box::new(limit));
        sql.push_str(&format!(" ORDER BY m.created_at DESC LIMIT ?{}", bind.len()));
        bind.push(Box::new(offset as i64));
        sql.push_str(&format!(" OFFSET ?{}", bind.len()));

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::types::ToSql> = bind.iter().map(|b| b.as_ref()).collect();
        let memories = stmt
            .query_map(params.as_slice(), memory_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(memories)
    }

    fn count_all_memories(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn get_stats(&self) -> Result<Value> {
        let conn = self.lock()?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        let unique_tags: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT jt.value) FROM memories m, json_each(m.tags) jt",
            [],
            |row| row.get(0),
        )?;

        let size_bytes = self
            .db_path
            .as_deref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(json!({
            "backend": self.backend_name(),
            "total_memories": total,
            "unique_tags": unique_tags,
            "database_size_mb": (size_bytes as f64) / (1024.0 * 1024.0),
            "embedding_model": "hashed-bow",
            "embedding_dimension": self.embedding.dimensions(),
            "timestamp": iso_from_epoch(epoch_now()),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "sqlite_vec"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hashed::HashedEmbedding;
    use serde_json::Map;

    fn test_storage() -> SqliteVecStorage {
        SqliteVecStorage::in_memory(Arc::new(HashedEmbedding::new())).unwrap()
    }

    fn memory(content: &str, tag_list: &[&str]) -> Memory {
        Memory::new(
            content,
            tag_list.iter().map(|s| s.to_string()).collect(),
            None,
            Map::new(),
        )
    }

    #[test]
    fn store_and_get_by_hash() {
        let storage = test_storage();
        let mem = memory("Rust is a systems language", &["rust"]);

        let (ok, _) = storage.store(&mem).unwrap();
        assert!(ok);

        let found = storage.get_by_hash(&mem.content_hash).unwrap().unwrap();
        assert_eq!(found.content, "Rust is a systems language");
        assert_eq!(found.tags, vec!["rust"]);
    }

    #[test]
    fn duplicate_hash_is_rejected_not_errored() {
        let storage = test_storage();
        let mem = memory("same content", &[]);

        assert!(storage.store(&mem).unwrap().0);
        let (ok, msg) = storage.store(&mem).unwrap();
        assert!(!ok);
        assert!(msg.contains("Duplicate"));
        assert_eq!(storage.count_all_memories().unwrap(), 1);
    }

    #[test]
    fn retrieve_ranks_by_similarity() {
        let storage = test_storage();
        storage
            .store(&memory("Paris is the capital of France", &[]))
            .unwrap();
        storage
            .store(&memory("quantum entanglement of qubits", &[]))
            .unwrap();

        let results = storage.retrieve("capital of France", 5).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].memory.content.contains("Paris"));
        assert!(results[0].relevance_score.unwrap() > results[1].relevance_score.unwrap());
    }

    #[test]
    fn tag_search_any_and_all() {
        let storage = test_storage();
        storage.store(&memory("one", &["a", "b"])).unwrap();
        storage.store(&memory("two", &["a"])).unwrap();
        storage.store(&memory("three", &["c"])).unwrap();

        let q = vec!["a".to_string(), "b".to_string()];
        let any = storage.search_by_tags(&q, TagMatch::Any).unwrap();
        assert_eq!(any.len(), 2);

        let all = storage.search_by_tags(&q, TagMatch::All).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "one");
    }

    #[test]
    fn delete_removes_row_and_vector() {
        let storage = test_storage();
        let mem = memory("to be deleted", &[]);
        storage.store(&mem).unwrap();

        let (ok, _) = storage.delete(&mem.content_hash).unwrap();
        assert!(ok);
        assert!(storage.get_by_hash(&mem.content_hash).unwrap().is_none());
        assert!(storage.retrieve("deleted", 5).unwrap().is_empty());

        let (ok, msg) = storage.delete(&mem.content_hash).unwrap();
        assert!(!ok);
        assert!(msg.contains("not found"));
    }

    #[test]
    fn get_all_memories_paginates_newest_first() {
        let storage = test_storage();
        for i in 0..5 {
            let mut mem = memory(&format!("memory {i}"), &[]);
            // Synthetic timestamps so ordering is deterministic.
            mem.created_at = 1000.0 + i as f64;
            mem.updated_at = mem.created_at;
            storage.store(&mem).unwrap();
        }

        let page = storage.get_all_memories(Some(2), 1, None, None).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "memory 3");
        assert_eq!(page[1].content, "memory 2");
    }

    #[test]
    fn get_all_memories_filters_by_type_and_tag() {
        let storage = test_storage();
        let mut note = memory("a note", &["x"]);
        note.memory_type = Some("note".into());
        storage.store(&note).unwrap();
        storage.store(&memory("untyped", &["x"])).unwrap();

        let notes = storage
            .get_all_memories(None, 0, None, Some("note"))
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "a note");

        let tagged = storage
            .get_all_memories(None, 0, Some(&["x".to_string()]), None)
            .unwrap();
        assert_eq!(tagged.len(), 2);
    }

    #[test]
    fn stats_report_counts_and_tags() {
        let storage = test_storage();
        storage.store(&memory("one", &["a", "b"])).unwrap();
        storage.store(&memory("two", &["b"])).unwrap();

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats["total_memories"], 2);
        assert_eq!(stats["unique_tags"], 2);
        assert_eq!(stats["backend"], "sqlite_vec");
    }
}
