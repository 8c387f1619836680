//! Row normalizer
//!
//! Resolves each free-text cell of a tabular row against the stored graph:
//! exact key (identifier or notation) first, then a case-insensitive label
//! or synonym match. Rows run in parallel; output order equals input order.

use std::sync::Arc;

use ontograph_storage::{GraphStore, GraphTransaction, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ParallelConfig;
use crate::features::search::is_account;
use crate::shared::EntrySummary;

/// One input cell and the entry it resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellResolution {
    pub input: String,
    pub matched: Option<EntrySummary>,
}

pub struct RowNormalizer {
    store: Arc<dyn GraphStore>,
    /// Dedicated pool; `None` runs on rayon's global pool
    pool: Option<ThreadPool>,
}

impl RowNormalizer {
    pub fn new(store: Arc<dyn GraphStore>, parallel: &ParallelConfig) -> Self {
        let pool = if parallel.num_workers == 0 {
            None
        } else {
            match ThreadPoolBuilder::new()
                .num_threads(parallel.num_workers)
                .thread_name(|i| format!("ontograph-rows-{}", i))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "row pool unavailable, using global pool");
                    None
                }
            }
        };
        Self { store, pool }
    }

    fn resolve_cell(tx: &dyn GraphTransaction, cell: &str) -> Result<Option<EntrySummary>> {
        let text = cell.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if let Some(node) = tx.find_by_key(text)? {
            if !is_account(&node) {
                return Ok(Some(EntrySummary::of(&node)));
            }
        }
        let matched = tx
            .find_by_label(text)?
            .iter()
            .filter(|node| !is_account(node))
            .min_by(|a, b| a.key().cmp(b.key()))
            .map(EntrySummary::of);
        Ok(matched)
    }

    /// Resolve every cell of one row in a single read transaction
    pub fn normalize_row(&self, row: &[String]) -> Result<Vec<CellResolution>> {
        let tx = self.store.begin()?;
        row.iter()
            .map(|cell| {
                Ok(CellResolution {
                    input: cell.clone(),
                    matched: Self::resolve_cell(tx.as_ref(), cell)?,
                })
            })
            .collect()
    }

    pub fn normalize_rows(&self, rows: &[Vec<String>]) -> Result<Vec<Vec<CellResolution>>> {
        let run = || {
            rows.par_iter()
                .map(|row| self.normalize_row(row))
                .collect::<Result<Vec<_>>>()
        };
        let resolved = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }?;

        let matched: usize = resolved
            .iter()
            .map(|row| row.iter().filter(|c| c.matched.is_some()).count())
            .sum();
        debug!(rows = rows.len(), matched, "rows normalized");
        Ok(resolved)
    }
}
