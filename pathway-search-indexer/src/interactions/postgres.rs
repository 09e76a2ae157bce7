//! Postgres-backed implementation of the interaction dataset collaborator.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::interactions::{
    Interaction, InteractionError, InteractionProvider, Interactor, ScoringMode,
    MINIMUM_VALID_SCORE,
};

const PG_MAX_CONNECTIONS: u32 = 5;

/// Interaction dataset backed by a Postgres import of the curated
/// interaction file.
pub struct PgInteractionProvider {
    pool: PgPool,
}

impl PgInteractionProvider {
    /// Connect to the interaction database.
    pub async fn connect(database_url: &str) -> Result<Self, InteractionError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        info!("Created interaction dataset provider");
        Ok(Self { pool })
    }

    fn minimum_score(mode: ScoringMode) -> f64 {
        match mode {
            ScoringMode::Static => MINIMUM_VALID_SCORE,
        }
    }
}

#[async_trait]
impl InteractionProvider for PgInteractionProvider {
    async fn all_accessions(&self) -> Result<Vec<String>, InteractionError> {
        let rows = sqlx::query("SELECT DISTINCT acc FROM interactor ORDER BY acc")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("acc")).collect())
    }

    async fn interactions_for(
        &self,
        accessions: &HashSet<String>,
        mode: ScoringMode,
    ) -> Result<HashMap<String, Vec<Interaction>>, InteractionError> {
        let accession_list: Vec<String> = accessions.iter().cloned().collect();
        let rows = sqlx::query(
            "SELECT a.acc AS acc_a, a.alias AS alias_a, a.taxid AS taxid_a, \
                    b.acc AS acc_b, b.alias AS alias_b, b.taxid AS taxid_b, \
                    i.score AS score, \
                    COALESCE(array_agg(e.interaction_ac) \
                             FILTER (WHERE e.interaction_ac IS NOT NULL), '{}') AS evidences \
             FROM interaction i \
             JOIN interactor a ON a.id = i.interactor_a \
             JOIN interactor b ON b.id = i.interactor_b \
             LEFT JOIN interaction_evidence e ON e.interaction_id = i.id \
             WHERE a.acc = ANY($1) AND i.score >= $2 \
             GROUP BY i.id, a.acc, a.alias, a.taxid, b.acc, b.alias, b.taxid, i.score",
        )
        .bind(&accession_list)
        .bind(Self::minimum_score(mode))
        .fetch_all(&self.pool)
        .await?;

        let mut interactions: HashMap<String, Vec<Interaction>> = HashMap::new();
        for row in &rows {
            let interactor_a = Interactor {
                accession: row.get("acc_a"),
                alias: row.get("alias_a"),
                tax_id: row.get("taxid_a"),
            };
            let interactor_b = Interactor {
                accession: row.get("acc_b"),
                alias: row.get("alias_b"),
                tax_id: row.get("taxid_b"),
            };
            interactions
                .entry(interactor_a.accession.clone())
                .or_default()
                .push(Interaction {
                    interactor_a,
                    interactor_b,
                    score: row.get("score"),
                    evidence_ids: row.get("evidences"),
                });
        }

        Ok(interactions)
    }
}
