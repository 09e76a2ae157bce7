//! Neo4j-backed implementation of the graph collaborator.
//!
//! Entities are loaded lazily: one query fetches the node's own properties,
//! then each relation collection is pulled with a focused follow-up query.
//! For a batch indexer walking the whole graph this keeps every query small
//! and lets the server stream results.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use neo4rs::{query, Graph};
use serde::Deserialize;
use tracing::{debug, info};

use crate::graph::model::{
    AuthorRef, CompartmentTerm, DatabaseIdentifier, DiseaseTerm, EntityCore, Event, EventKind,
    GoTerm, GoTermKind, GraphEntity, Person, PhysicalEntity, PhysicalEntityKind, Publication,
    PublicationDetail, ReferenceEntity, ReferenceEntityKind, Regulation, RegulationTarget,
    RegulationTargetKind, SpeciesRef,
};
use crate::graph::{EntityKind, EntityStub, GraphError, GraphProvider};

const SPECIES_INDEX_QUERY: &str = "MATCH (n:SimpleEntity)<-[:regulatedBy|regulator|physicalEntity|entityFunctionalStatus|catalystActivity|hasMember|hasCandidate|hasComponent|repeatedUnit|input|output*]-(:ReactionLikeEvent)-[:species]->(s:Species) \
     WITH n, COLLECT(DISTINCT s.displayName) AS species \
     RETURN n.dbId AS db_id, species";

const REFERENCING_ENTITIES_QUERY: &str = "MATCH (:ReferenceEntity {identifier: $accession})<-[:referenceEntity]-(pe:PhysicalEntity)<-[:regulatedBy|regulator|physicalEntity|entityFunctionalStatus|catalystActivity|hasMember|hasCandidate|hasComponent|repeatedUnit|input|output*]-(:ReactionLikeEvent) \
     RETURN DISTINCT pe.dbId AS db_id, pe.stId AS st_id, pe.displayName AS display_name";

#[derive(Debug, Deserialize)]
struct AuthorRow {
    db_id: i64,
    display_name: String,
}

/// Graph collaborator backed by a Neo4j connection pool.
pub struct Neo4jGraphProvider {
    graph: Graph,
}

impl Neo4jGraphProvider {
    /// Connect to Neo4j. The connection pool is lazy, so this does not
    /// perform any I/O.
    pub fn connect(uri: &str, user: &str, password: &str) -> Result<Self, GraphError> {
        let graph = Graph::new(uri, user, password)?;
        info!(uri = %uri, "Created Neo4j graph provider");
        Ok(Self { graph })
    }

    async fn fetch_names(&self, db_id: i64) -> Result<Vec<String>, GraphError> {
        let q = query("MATCH (n:DatabaseObject {dbId: $dbId}) RETURN n.name AS names")
            .param("dbId", db_id);
        let mut rows = self.graph.execute(q).await?;
        if let Some(row) = rows.next().await? {
            Ok(row.get::<Option<Vec<String>>>("names")?.unwrap_or_default())
        } else {
            Ok(Vec::new())
        }
    }

    async fn fetch_publications(&self, db_id: i64) -> Result<Vec<Publication>, GraphError> {
        let q = query(
            "MATCH (n:DatabaseObject {dbId: $dbId})-[:literatureReference]->(p:Publication) \
             OPTIONAL MATCH (p)-[:author]->(a:Person) \
             WITH p, collect({db_id: a.dbId, display_name: a.displayName}) AS authors \
             RETURN labels(p) AS labels, p.title AS title, \
                    p.pubMedIdentifier AS pubmed, p.ISBN AS isbn, \
                    [x IN authors WHERE x.db_id IS NOT NULL] AS authors",
        )
        .param("dbId", db_id);

        let mut publications = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            let labels: Vec<String> = row.get("labels")?;
            let detail = if labels.iter().any(|l| l == "LiteratureReference") {
                PublicationDetail::Journal {
                    pubmed_identifier: row.get::<Option<i64>>("pubmed")?,
                }
            } else if labels.iter().any(|l| l == "Book") {
                PublicationDetail::Book {
                    isbn: row.get::<Option<String>>("isbn")?,
                }
            } else {
                PublicationDetail::Other
            };

            let authors: Vec<AuthorRow> = row.get("authors")?;
            publications.push(Publication {
                title: row.get::<Option<String>>("title")?,
                authors: authors
                    .into_iter()
                    .map(|a| AuthorRef {
                        db_id: a.db_id,
                        display_name: a.display_name,
                    })
                    .collect(),
                detail,
            });
        }
        Ok(publications)
    }

    async fn fetch_summations(&self, db_id: i64) -> Result<Vec<String>, GraphError> {
        let q = query(
            "MATCH (n:DatabaseObject {dbId: $dbId})-[:summation]->(s:Summation) \
             RETURN s.text AS text",
        )
        .param("dbId", db_id);

        let mut texts = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            if let Some(text) = row.get::<Option<String>>("text")? {
                texts.push(text);
            }
        }
        Ok(texts)
    }

    async fn fetch_diseases(&self, db_id: i64) -> Result<Vec<DiseaseTerm>, GraphError> {
        let q = query(
            "MATCH (n:DatabaseObject {dbId: $dbId})-[:disease]->(d:Disease) \
             RETURN d.identifier AS identifier, d.name AS names, d.synonym AS synonyms",
        )
        .param("dbId", db_id);

        let mut diseases = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            diseases.push(DiseaseTerm {
                identifier: row.get("identifier")?,
                names: row.get::<Option<Vec<String>>>("names")?.unwrap_or_default(),
                synonyms: row
                    .get::<Option<Vec<String>>>("synonyms")?
                    .unwrap_or_default(),
            });
        }
        Ok(diseases)
    }

    async fn fetch_compartments(&self, db_id: i64) -> Result<Vec<CompartmentTerm>, GraphError> {
        let q = query(
            "MATCH (n:DatabaseObject {dbId: $dbId})-[:compartment]->(c:Compartment) \
             RETURN c.displayName AS display_name, c.accession AS accession",
        )
        .param("dbId", db_id);

        let mut compartments = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            compartments.push(CompartmentTerm {
                display_name: row.get("display_name")?,
                accession: row.get("accession")?,
            });
        }
        Ok(compartments)
    }

    async fn fetch_cross_references(
        &self,
        db_id: i64,
    ) -> Result<Vec<DatabaseIdentifier>, GraphError> {
        let q = query(
            "MATCH (n:DatabaseObject {dbId: $dbId})-[:crossReference]->(x:DatabaseIdentifier) \
             RETURN x.displayName AS display_name, x.identifier AS identifier, \
                    x.databaseName AS database_name",
        )
        .param("dbId", db_id);

        let mut references = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            references.push(DatabaseIdentifier {
                display_name: row.get("display_name")?,
                identifier: row.get("identifier")?,
                database_name: row.get("database_name")?,
            });
        }
        Ok(references)
    }

    async fn fetch_species(&self, db_id: i64, relation: &str) -> Result<Vec<SpeciesRef>, GraphError> {
        let cypher = format!(
            "MATCH (n:DatabaseObject {{dbId: $dbId}})-[:{}]->(s:Species) \
             RETURN s.taxId AS tax_id, s.displayName AS display_name",
            relation
        );
        let q = query(&cypher).param("dbId", db_id);

        let mut species = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            species.push(SpeciesRef {
                tax_id: row.get("tax_id")?,
                display_name: row.get("display_name")?,
            });
        }
        Ok(species)
    }

    async fn fetch_go_term(
        &self,
        db_id: i64,
        relation: &str,
        kind: GoTermKind,
    ) -> Result<Option<GoTerm>, GraphError> {
        let cypher = format!(
            "MATCH (n:DatabaseObject {{dbId: $dbId}})-[:{}]->(g) \
             RETURN g.accession AS accession, g.displayName AS display_name LIMIT 1",
            relation
        );
        let q = query(&cypher).param("dbId", db_id);

        let mut rows = self.graph.execute(q).await?;
        if let Some(row) = rows.next().await? {
            Ok(Some(GoTerm {
                kind,
                accession: row.get("accession")?,
                display_name: row.get("display_name")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn fetch_persons(&self, db_id: i64, relation: &str) -> Result<Vec<Person>, GraphError> {
        let cypher = format!(
            "MATCH (n:DatabaseObject {{dbId: $dbId}})-[:{}]->(:InstanceEdit)-[:author]->(p:Person) \
             RETURN p.firstname AS first_name, p.initial AS initial, \
                    p.surname AS surname, p.orcidId AS orcid_id",
            relation
        );
        let q = query(&cypher).param("dbId", db_id);

        let mut persons = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            persons.push(Person {
                first_name: row.get::<Option<String>>("first_name")?,
                initial: row.get::<Option<String>>("initial")?,
                surname: row.get::<Option<String>>("surname")?.unwrap_or_default(),
                orcid_id: row.get::<Option<String>>("orcid_id")?,
            });
        }
        Ok(persons)
    }

    async fn fetch_catalyst_activities(&self, db_id: i64) -> Result<Vec<GoTerm>, GraphError> {
        let q = query(
            "MATCH (n:DatabaseObject {dbId: $dbId})-[:catalystActivity]->(:CatalystActivity)-[:activity]->(g) \
             RETURN g.accession AS accession, g.displayName AS display_name",
        )
        .param("dbId", db_id);

        let mut activities = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            activities.push(GoTerm {
                kind: GoTermKind::MolecularFunction,
                accession: row.get("accession")?,
                display_name: row.get("display_name")?,
            });
        }
        Ok(activities)
    }

    async fn fetch_reference_entity(
        &self,
        db_id: i64,
    ) -> Result<Option<ReferenceEntity>, GraphError> {
        let q = query(
            "MATCH (n:DatabaseObject {dbId: $dbId})-[:referenceEntity]->(re:ReferenceEntity) \
             OPTIONAL MATCH (re)-[:referenceDatabase]->(rd:ReferenceDatabase) \
             RETURN re.dbId AS re_db_id, re.schemaClass AS schema_class, \
                    re.displayName AS display_name, re.identifier AS identifier, \
                    re.variantIdentifier AS variant_identifier, re.name AS names, \
                    re.geneName AS gene_names, re.secondaryIdentifier AS secondary_identifiers, \
                    re.otherIdentifier AS other_identifiers, \
                    rd.displayName AS database_name, rd.accessUrl AS access_url \
             LIMIT 1",
        )
        .param("dbId", db_id);

        let mut rows = self.graph.execute(q).await?;
        let row = match rows.next().await? {
            Some(row) => row,
            None => return Ok(None),
        };

        let schema_class: String = row.get("schema_class")?;
        let kind = match schema_class.as_str() {
            "ReferenceGeneProduct" => ReferenceEntityKind::GeneProduct,
            "ReferenceIsoform" => ReferenceEntityKind::Isoform {
                variant_identifier: row.get::<Option<String>>("variant_identifier")?,
            },
            "ReferenceDNASequence" => ReferenceEntityKind::DnaSequence,
            "ReferenceRNASequence" => ReferenceEntityKind::RnaSequence,
            "ReferenceMolecule" => ReferenceEntityKind::Molecule,
            "ReferenceGroup" => ReferenceEntityKind::Group,
            _ => ReferenceEntityKind::Other,
        };

        let re_db_id: i64 = row.get("re_db_id")?;
        let cross_references = self.fetch_cross_references(re_db_id).await?;

        Ok(Some(ReferenceEntity {
            display_name: row.get::<Option<String>>("display_name")?.unwrap_or_default(),
            schema_class,
            kind,
            identifier: row.get::<Option<String>>("identifier")?,
            names: row.get::<Option<Vec<String>>>("names")?.unwrap_or_default(),
            gene_names: row
                .get::<Option<Vec<String>>>("gene_names")?
                .unwrap_or_default(),
            secondary_identifiers: row
                .get::<Option<Vec<String>>>("secondary_identifiers")?
                .unwrap_or_default(),
            other_identifiers: row
                .get::<Option<Vec<String>>>("other_identifiers")?
                .unwrap_or_default(),
            cross_references,
            database_name: row
                .get::<Option<String>>("database_name")?
                .unwrap_or_default(),
            access_url: row.get::<Option<String>>("access_url")?,
        }))
    }

    async fn fetch_regulation_target(
        &self,
        db_id: i64,
        pattern: &str,
    ) -> Result<Option<RegulationTarget>, GraphError> {
        let cypher = format!(
            "MATCH (n:Regulation {{dbId: $dbId}}){} \
             OPTIONAL MATCH (t)-[:physicalEntity]->(pe:PhysicalEntity) \
             RETURN labels(t) AS labels, t.dbId AS db_id, t.stId AS st_id, \
                    t.displayName AS display_name, t.name AS names, pe.name AS pe_names \
             LIMIT 1",
            pattern
        );
        let q = query(&cypher).param("dbId", db_id);

        let mut rows = self.graph.execute(q).await?;
        let row = match rows.next().await? {
            Some(row) => row,
            None => return Ok(None),
        };

        let labels: Vec<String> = row.get("labels")?;
        let names = row.get::<Option<Vec<String>>>("names")?.unwrap_or_default();
        let kind = if labels.iter().any(|l| l == "CatalystActivity") {
            RegulationTargetKind::CatalystActivity {
                physical_entity_names: row
                    .get::<Option<Vec<String>>>("pe_names")?
                    .unwrap_or_default(),
            }
        } else if labels.iter().any(|l| l == "Event") {
            RegulationTargetKind::Event { names }
        } else if labels.iter().any(|l| l == "PhysicalEntity") {
            RegulationTargetKind::PhysicalEntity { names }
        } else {
            RegulationTargetKind::Other
        };

        Ok(Some(RegulationTarget {
            db_id: row.get("db_id")?,
            st_id: row.get::<Option<String>>("st_id")?,
            display_name: row.get::<Option<String>>("display_name")?.unwrap_or_default(),
            kind,
        }))
    }

    async fn load_physical_entity(
        &self,
        core: EntityCore,
        labels: &[String],
    ) -> Result<PhysicalEntity, GraphError> {
        let kind = physical_entity_kind(labels);
        let db_id = core.db_id;
        Ok(PhysicalEntity {
            core,
            kind,
            names: self.fetch_names(db_id).await?,
            literature: self.fetch_publications(db_id).await?,
            summations: self.fetch_summations(db_id).await?,
            diseases: self.fetch_diseases(db_id).await?,
            compartments: self.fetch_compartments(db_id).await?,
            cross_references: self.fetch_cross_references(db_id).await?,
            go_cellular_component: self
                .fetch_go_term(db_id, "goCellularComponent", GoTermKind::CellularComponent)
                .await?,
            reference_entity: self.fetch_reference_entity(db_id).await?,
            species: self.fetch_species(db_id, "species").await?,
            related_species: self.fetch_species(db_id, "relatedSpecies").await?,
        })
    }

    async fn load_event(&self, core: EntityCore, labels: &[String]) -> Result<Event, GraphError> {
        let db_id = core.db_id;
        let kind = if labels.iter().any(|l| l == "ReactionLikeEvent") {
            EventKind::Reaction {
                catalyst_activities: self.fetch_catalyst_activities(db_id).await?,
            }
        } else {
            EventKind::Pathway
        };
        Ok(Event {
            core,
            kind,
            names: self.fetch_names(db_id).await?,
            literature: self.fetch_publications(db_id).await?,
            summations: self.fetch_summations(db_id).await?,
            diseases: self.fetch_diseases(db_id).await?,
            compartments: self.fetch_compartments(db_id).await?,
            cross_references: self.fetch_cross_references(db_id).await?,
            go_biological_process: self
                .fetch_go_term(db_id, "goBiologicalProcess", GoTermKind::BiologicalProcess)
                .await?,
            authored: self.fetch_persons(db_id, "authored").await?,
            reviewed: self.fetch_persons(db_id, "reviewed").await?,
            species: self.fetch_species(db_id, "species").await?,
            related_species: self.fetch_species(db_id, "relatedSpecies").await?,
        })
    }

    async fn load_regulation(&self, core: EntityCore) -> Result<Regulation, GraphError> {
        let db_id = core.db_id;
        Ok(Regulation {
            core,
            names: self.fetch_names(db_id).await?,
            literature: self.fetch_publications(db_id).await?,
            summations: self.fetch_summations(db_id).await?,
            regulated_entity: self
                .fetch_regulation_target(db_id, "<-[:regulatedBy]-(t)")
                .await?,
            regulator: self
                .fetch_regulation_target(db_id, "-[:regulator]->(t)")
                .await?,
        })
    }
}

fn physical_entity_kind(labels: &[String]) -> PhysicalEntityKind {
    let has = |label: &str| labels.iter().any(|l| l == label);
    if has("EntitySet") || has("CandidateSet") || has("DefinedSet") || has("OpenSet") {
        PhysicalEntityKind::EntitySet
    } else if has("GenomeEncodedEntity") || has("EntityWithAccessionedSequence") {
        PhysicalEntityKind::GenomeEncoded
    } else if has("Complex") {
        PhysicalEntityKind::Complex
    } else if has("SimpleEntity") {
        PhysicalEntityKind::SimpleEntity
    } else if has("Polymer") {
        PhysicalEntityKind::Polymer
    } else {
        PhysicalEntityKind::Other
    }
}

#[async_trait]
impl GraphProvider for Neo4jGraphProvider {
    async fn entity_ids(&self, kind: EntityKind) -> Result<Vec<i64>, GraphError> {
        let cypher = format!("MATCH (n:{}) RETURN n.dbId AS db_id", kind.label());
        let mut ids = Vec::new();
        let mut rows = self.graph.execute(query(&cypher)).await?;
        while let Some(row) = rows.next().await? {
            ids.push(row.get("db_id")?);
        }
        Ok(ids)
    }

    async fn count_entities(&self, kind: EntityKind) -> Result<u64, GraphError> {
        let cypher = format!("MATCH (n:{}) RETURN count(n) AS total", kind.label());
        let mut rows = self.graph.execute(query(&cypher)).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>("total")? as u64),
            None => Ok(0),
        }
    }

    async fn load_entity(&self, db_id: i64) -> Result<Option<GraphEntity>, GraphError> {
        let q = query(
            "MATCH (n:DatabaseObject {dbId: $dbId}) \
             RETURN labels(n) AS labels, n.dbId AS db_id, n.stId AS st_id, \
                    n.oldStId AS old_st_id, n.displayName AS display_name, \
                    n.schemaClass AS schema_class",
        )
        .param("dbId", db_id);

        let mut rows = self.graph.execute(q).await?;
        let row = match rows.next().await? {
            Some(row) => row,
            None => return Ok(None),
        };

        let labels: Vec<String> = row.get("labels")?;
        let core = EntityCore {
            db_id: row.get("db_id")?,
            st_id: row.get::<Option<String>>("st_id")?,
            old_st_id: row.get::<Option<String>>("old_st_id")?,
            display_name: row.get::<Option<String>>("display_name")?.unwrap_or_default(),
            schema_class: row.get::<Option<String>>("schema_class")?.unwrap_or_default(),
        };

        let has = |label: &str| labels.iter().any(|l| l == label);
        if has("PhysicalEntity") {
            let pe = self.load_physical_entity(core, &labels).await?;
            Ok(Some(GraphEntity::PhysicalEntity(pe)))
        } else if has("Event") {
            let event = self.load_event(core, &labels).await?;
            Ok(Some(GraphEntity::Event(event)))
        } else if has("Regulation") {
            let regulation = self.load_regulation(core).await?;
            Ok(Some(GraphEntity::Regulation(regulation)))
        } else {
            Err(GraphError::mapping(format!(
                "Node {} has no indexable category label",
                db_id
            )))
        }
    }

    async fn species_index(&self) -> Result<HashMap<i64, BTreeSet<String>>, GraphError> {
        info!("Caching simple entity species");
        let mut index = HashMap::new();
        let mut rows = self.graph.execute(query(SPECIES_INDEX_QUERY)).await?;
        while let Some(row) = rows.next().await? {
            let db_id: i64 = row.get("db_id")?;
            let species: Vec<String> = row.get("species")?;
            index.insert(db_id, species.into_iter().collect());
        }
        info!(entries = index.len(), "Simple entity species cached");
        Ok(index)
    }

    async fn all_species(&self) -> Result<Vec<SpeciesRef>, GraphError> {
        let q = query("MATCH (s:Species) RETURN s.taxId AS tax_id, s.displayName AS display_name");
        let mut species = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            species.push(SpeciesRef {
                tax_id: row.get("tax_id")?,
                display_name: row.get("display_name")?,
            });
        }
        Ok(species)
    }

    async fn reference_identifiers(&self) -> Result<Vec<String>, GraphError> {
        let q = query("MATCH (n:ReferenceEntity) RETURN DISTINCT n.identifier AS identifier");
        let mut identifiers = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            if let Some(identifier) = row.get::<Option<String>>("identifier")? {
                identifiers.push(identifier);
            }
        }
        Ok(identifiers)
    }

    async fn entities_referencing(
        &self,
        accession: &str,
    ) -> Result<Vec<EntityStub>, GraphError> {
        let q = query(REFERENCING_ENTITIES_QUERY).param("accession", accession);
        let mut stubs = Vec::new();
        let mut rows = self.graph.execute(q).await?;
        while let Some(row) = rows.next().await? {
            stubs.push(EntityStub {
                db_id: row.get("db_id")?,
                st_id: row.get::<Option<String>>("st_id")?,
                display_name: row.get::<Option<String>>("display_name")?.unwrap_or_default(),
            });
        }
        Ok(stubs)
    }

    async fn release_number(&self) -> Result<u32, GraphError> {
        let q = query("MATCH (d:DBInfo) RETURN d.releaseNumber AS release_number LIMIT 1");
        let mut rows = self.graph.execute(q).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>("release_number")? as u32),
            None => Err(GraphError::mapping("No DBInfo node in the graph")),
        }
    }

    async fn clear_cache(&self) {
        // The driver pools plain connections and keeps no per-request
        // result cache, so the hint has nothing to drop here.
        debug!("Graph cache clear hint issued");
    }
}
