//! Builds one flat search document per graph entity.
//!
//! Mapping is a priority-ordered dispatch over the entity's tagged variant:
//! shared attributes first, then category-specific attributes, then the
//! reference-entity override for physical entities. The builder owns the two
//! per-run caches the mapping needs (the controlled vocabulary and the
//! simple-entity species index) so repeated runs never leak state.

use std::collections::{BTreeSet, HashMap};

use tracing::{error, warn};

use crate::graph::model::{
    Event, EventKind, GoTerm, GoTermKind, GraphEntity, PhysicalEntity, PhysicalEntityKind,
    Publication, PublicationDetail, ReferenceEntity, Regulation, RegulationTarget,
    RegulationTargetKind, SpeciesRef,
};
use crate::graph::GraphProvider;
use pathway_search_shared::{CrossReference, IndexDocument};

/// Sentinel species value for entries with no resolvable organism.
pub const NO_SPECIES: &str = "Entries without species";

/// Summation text carrying this marker is routed to the inferred field.
const INFERRED_MARKER: &str = "computationally inferred";

/// Separator between concatenated summation records.
const SUMMATION_SEPARATOR: &str = "<br>";

/// Converts graph entities into [`IndexDocument`]s.
pub struct DocumentBuilder {
    keywords: Option<Vec<String>>,
    species_index: Option<HashMap<i64, BTreeSet<String>>>,
}

impl DocumentBuilder {
    /// Create a builder. `keywords` is the controlled vocabulary; `None`
    /// disables keyword tagging.
    pub fn new(keywords: Option<Vec<String>>) -> Self {
        if keywords.is_none() {
            error!("No keywords available, keyword tagging is disabled");
        }
        Self {
            keywords,
            species_index: None,
        }
    }

    /// Load one entity and map it into a document.
    ///
    /// Returns `None` when the entity cannot be loaded or mapped; the
    /// failure is logged and the caller tracks the identifier separately.
    pub async fn build(
        &mut self,
        graph: &dyn GraphProvider,
        db_id: i64,
    ) -> Option<IndexDocument> {
        if self.species_index.is_none() {
            match graph.species_index().await {
                Ok(index) => self.species_index = Some(index),
                Err(e) => {
                    warn!(error = %e, "Could not cache simple entity species");
                    self.species_index = Some(HashMap::new());
                }
            }
        }

        let entity = match graph.load_entity(db_id).await {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                error!(db_id, "Entity not found in the graph");
                return None;
            }
            Err(e) => {
                error!(db_id, error = %e, "Failed to map entity");
                return None;
            }
        };

        Some(self.document_for(entity))
    }

    /// Pure mapping step: one loaded entity in, one document out.
    pub fn document_for(&self, entity: GraphEntity) -> IndexDocument {
        let mut document = match entity {
            GraphEntity::PhysicalEntity(pe) => self.map_physical_entity(pe),
            GraphEntity::Event(event) => map_event(event),
            GraphEntity::Regulation(regulation) => map_regulation(regulation),
        };
        self.set_keywords(&mut document);
        document
    }

    fn map_physical_entity(&self, entity: PhysicalEntity) -> IndexDocument {
        let doc_type = match entity.kind {
            PhysicalEntityKind::EntitySet => "Set".to_string(),
            PhysicalEntityKind::GenomeEncoded => "Genes and Transcripts".to_string(),
            _ => entity.core.schema_class.clone(),
        };
        let mut document = IndexDocument::new(
            entity.core.db_id.to_string(),
            doc_type,
            entity.core.schema_class.clone(),
        );
        document.st_id = entity.core.st_id.clone();
        document.old_st_id = entity.core.old_st_id.clone();

        set_name_and_synonyms(&mut document, &entity.names, &entity.core.display_name);
        set_literature_references(&mut document, &entity.literature);
        set_summation(&mut document, &entity.summations);
        set_diseases(&mut document, &entity.diseases);
        set_compartments(&mut document, &entity.compartments);
        set_cross_references(&mut document, &entity.cross_references);
        self.set_physical_entity_species(&mut document, &entity);

        set_go_term(&mut document, entity.go_cellular_component.as_ref());
        if let Some(reference) = &entity.reference_entity {
            set_reference_entity(&mut document, reference);
        }

        document
    }

    /// Species dispatch by kind capability: single taxon for genome-encoded
    /// entities, collections for sets/complexes/polymers, the species index
    /// for simple entities, the sentinel otherwise.
    fn set_physical_entity_species(&self, document: &mut IndexDocument, entity: &PhysicalEntity) {
        match entity.kind {
            PhysicalEntityKind::GenomeEncoded => {
                let single: Vec<SpeciesRef> = entity.species.iter().take(1).cloned().collect();
                apply_species(document, &single);
            }
            PhysicalEntityKind::EntitySet
            | PhysicalEntityKind::Complex
            | PhysicalEntityKind::Polymer => {
                apply_species(document, &entity.species);
                apply_related_species(document, &entity.related_species);
            }
            PhysicalEntityKind::SimpleEntity => {
                let names = self
                    .species_index
                    .as_ref()
                    .and_then(|index| index.get(&entity.core.db_id));
                match names {
                    Some(names) if !names.is_empty() => {
                        document.species = names.iter().cloned().collect();
                    }
                    _ => document.species = vec![NO_SPECIES.to_string()],
                }
            }
            PhysicalEntityKind::Other => {
                apply_species(document, &[]);
            }
        }
    }

    /// Keyword tagging relies on the document name; call only after the name
    /// is set.
    fn set_keywords(&self, document: &mut IndexDocument) {
        let (Some(keywords), Some(name)) = (&self.keywords, &document.name) else {
            return;
        };
        let name = name.to_lowercase();
        document.keywords = keywords
            .iter()
            .filter(|keyword| name.contains(&keyword.to_lowercase()))
            .cloned()
            .collect();
    }
}

fn map_event(entity: Event) -> IndexDocument {
    let doc_type = match entity.kind {
        EventKind::Pathway => "Pathway",
        EventKind::Reaction { .. } => "Reaction",
    };
    let mut document = IndexDocument::new(
        entity.core.db_id.to_string(),
        doc_type,
        entity.core.schema_class.clone(),
    );
    document.st_id = entity.core.st_id.clone();
    document.old_st_id = entity.core.old_st_id.clone();

    set_name_and_synonyms(&mut document, &entity.names, &entity.core.display_name);
    set_literature_references(&mut document, &entity.literature);
    set_summation(&mut document, &entity.summations);
    set_diseases(&mut document, &entity.diseases);
    set_compartments(&mut document, &entity.compartments);
    set_cross_references(&mut document, &entity.cross_references);
    apply_species(&mut document, &entity.species);
    apply_related_species(&mut document, &entity.related_species);
    set_authored_and_reviewed(&mut document, &entity);

    set_go_term(&mut document, entity.go_biological_process.as_ref());
    if let EventKind::Reaction {
        catalyst_activities,
    } = &entity.kind
    {
        for activity in catalyst_activities {
            set_go_term(&mut document, Some(activity));
        }
    }

    document
}

fn map_regulation(entity: Regulation) -> IndexDocument {
    let mut document = IndexDocument::new(
        entity.core.db_id.to_string(),
        "Regulation",
        entity.core.schema_class.clone(),
    );
    document.st_id = entity.core.st_id.clone();
    document.old_st_id = entity.core.old_st_id.clone();

    set_name_and_synonyms(&mut document, &entity.names, &entity.core.display_name);
    set_literature_references(&mut document, &entity.literature);
    set_summation(&mut document, &entity.summations);
    // regulations carry no species attribute
    apply_species(&mut document, &[]);

    if let Some(target) = &entity.regulated_entity {
        document.regulated_entity = regulation_target_name(target);
        document.regulated_entity_id = Some(regulation_target_id(target));
    }
    if let Some(target) = &entity.regulator {
        document.regulator = regulation_target_name(target);
        document.regulator_id = Some(regulation_target_id(target));
    }

    document
}

/// Destructive name split: the first value becomes the canonical name, the
/// remainder become synonyms.
fn set_name_and_synonyms(document: &mut IndexDocument, names: &[String], display_name: &str) {
    let mut iter = names.iter();
    match iter.next() {
        Some(first) => {
            document.name = Some(first.clone());
            document.synonyms = iter.cloned().collect();
        }
        None => {
            // some regulations do not have a name list
            document.name = Some(display_name.to_string());
        }
    }
}

fn set_reference_name_and_synonyms(
    document: &mut IndexDocument,
    names: &[String],
    display_name: &str,
) {
    let mut iter = names.iter();
    match iter.next() {
        Some(first) => {
            document.reference_name = Some(first.clone());
            document.reference_synonyms = iter.cloned().collect();
        }
        None => {
            document.reference_name = Some(display_name.to_string());
        }
    }
}

/// Group literature values by key into ordered sets. Authors are carried as
/// `(db_id, name)` pairs through the set and projected to names at the end,
/// so author counts can diverge from the upstream source; that divergence is
/// accepted behavior.
fn set_literature_references(document: &mut IndexDocument, publications: &[Publication]) {
    if publications.is_empty() {
        return;
    }

    let mut titles = BTreeSet::new();
    let mut pubmed_ids = BTreeSet::new();
    let mut isbns = BTreeSet::new();
    let mut authors = BTreeSet::new();

    for publication in publications {
        if let Some(title) = &publication.title {
            titles.insert(title.clone());
        }
        match &publication.detail {
            PublicationDetail::Journal { pubmed_identifier } => {
                if let Some(id) = pubmed_identifier {
                    pubmed_ids.insert(id.to_string());
                }
            }
            PublicationDetail::Book { isbn } => {
                if let Some(isbn) = isbn.as_deref().filter(|s| !s.is_empty()) {
                    isbns.insert(isbn.to_string());
                }
            }
            PublicationDetail::Other => {}
        }
        authors.extend(publication.authors.iter().cloned());
    }

    document.literature_reference_title = titles.into_iter().collect();
    document.literature_reference_pub_med_id = pubmed_ids.into_iter().collect();
    document.literature_reference_isbn = isbns.into_iter().collect();
    document.literature_reference_author =
        authors.into_iter().map(|author| author.display_name).collect();
}

fn set_summation(document: &mut IndexDocument, summations: &[String]) {
    if summations.is_empty() {
        return;
    }

    let text = summations.join(SUMMATION_SEPARATOR);
    if text.contains(INFERRED_MARKER) {
        document.inferred_summation = Some(text);
    } else {
        document.summation = Some(text);
    }
}

fn set_diseases(document: &mut IndexDocument, diseases: &[crate::graph::model::DiseaseTerm]) {
    if diseases.is_empty() {
        document.is_disease = false;
        return;
    }

    let mut ids: Vec<String> = diseases.iter().map(|d| d.identifier.clone()).collect();
    ids.extend(diseases.iter().map(|d| format!("doid:{}", d.identifier)));
    document.disease_id = ids;
    document.disease_name = diseases.iter().flat_map(|d| d.names.clone()).collect();
    document.disease_synonyms = diseases.iter().flat_map(|d| d.synonyms.clone()).collect();
    document.is_disease = true;
}

fn set_compartments(
    document: &mut IndexDocument,
    compartments: &[crate::graph::model::CompartmentTerm],
) {
    if compartments.is_empty() {
        return;
    }
    document.compartment_name = compartments.iter().map(|c| c.display_name.clone()).collect();
    document.compartment_accession = compartments.iter().map(|c| c.accession.clone()).collect();
}

fn set_cross_references(
    document: &mut IndexDocument,
    cross_references: &[crate::graph::model::DatabaseIdentifier],
) {
    if cross_references.is_empty() {
        return;
    }

    // the flat list carries both the <DB>:<ID> display string and the raw
    // identifier; the structured list feeds the export mirror
    let mut info = Vec::with_capacity(cross_references.len() * 2);
    let mut all = Vec::with_capacity(cross_references.len());
    for reference in cross_references {
        info.push(reference.display_name.clone());
        info.push(reference.identifier.clone());
        all.push(CrossReference::new(
            reference.identifier.as_str(),
            reference.database_name.as_str(),
        ));
    }
    document.cross_references = info;
    document.all_cross_references = all;
}

fn set_go_term(document: &mut IndexDocument, term: Option<&GoTerm>) {
    let Some(term) = term else { return };
    let accessions = vec![format!("go:{}", term.accession), term.accession.clone()];
    match term.kind {
        GoTermKind::BiologicalProcess => {
            document.go_biological_process_accessions = accessions;
            document.go_biological_process_name = Some(term.display_name.clone());
        }
        GoTermKind::CellularComponent => {
            document.go_cellular_component_accessions = accessions;
            document.go_cellular_component_name = Some(term.display_name.clone());
        }
        GoTermKind::MolecularFunction => {
            document.go_molecular_function_name.push(term.display_name.clone());
            document
                .go_molecular_function_accession
                .push(format!("go:{}", term.accession));
            document
                .go_molecular_function_accession
                .push(term.accession.clone());
        }
    }
}

fn apply_species(document: &mut IndexDocument, species: &[SpeciesRef]) {
    if species.is_empty() {
        document.species = vec![NO_SPECIES.to_string()];
        return;
    }
    document.species = species.iter().map(|s| s.display_name.clone()).collect();
    document.tax_id = species.iter().map(|s| s.tax_id.clone()).collect();
}

/// Related species are independent of the primary species list and never
/// derived from it.
fn apply_related_species(document: &mut IndexDocument, related: &[SpeciesRef]) {
    if related.is_empty() {
        return;
    }
    document.related_species = related.iter().map(|s| s.display_name.clone()).collect();
}

fn set_authored_and_reviewed(document: &mut IndexDocument, event: &Event) {
    if event.authored.is_empty() && event.reviewed.is_empty() {
        return;
    }

    let mut names = BTreeSet::new();
    let mut orcids = BTreeSet::new();
    for person in event.authored.iter().chain(event.reviewed.iter()) {
        names.insert(person.index_name());
        if let Some(orcid) = &person.orcid_id {
            orcids.insert(orcid.clone());
        }
    }

    document.author = names.into_iter().collect();
    document.author_orcid = orcids.into_iter().collect();
}

/// Overwrite the generic type with the reference entity's coarse
/// classification and copy its identifiers.
fn set_reference_entity(document: &mut IndexDocument, reference: &ReferenceEntity) {
    let mut identifier = reference.identifier.clone();

    // an isoform's variant identifier replaces the accession
    if let crate::graph::model::ReferenceEntityKind::Isoform { variant_identifier } =
        &reference.kind
    {
        if let Some(variant) = variant_identifier.as_deref().filter(|s| !s.is_empty()) {
            identifier = Some(variant.to_string());
        }
    }

    document.doc_type = reference.coarse_type().to_string();
    document.exact_type = reference.schema_class.clone();

    if !reference.names.is_empty() {
        set_reference_name_and_synonyms(document, &reference.names, &reference.display_name);
    }

    document.reference_gene_names = reference.gene_names.clone();
    document.reference_secondary_identifier = reference.secondary_identifiers.clone();
    document.reference_other_identifier = reference.other_identifiers.clone();

    if !reference.cross_references.is_empty() {
        document.reference_cross_references = reference
            .cross_references
            .iter()
            .map(|r| r.identifier.clone())
            .collect();
        document.all_cross_references = reference
            .cross_references
            .iter()
            .map(|r| CrossReference::new(r.identifier.as_str(), r.database_name.as_str()))
            .collect();
    }

    if let Some(identifier) = identifier {
        document.reference_identifiers = vec![
            identifier.clone(),
            format!("{}:{}", reference.database_name, identifier),
        ];
        document.database_name = Some(reference.database_name.clone());

        if let Some(url) = reference.access_url.as_deref().filter(|s| !s.is_empty()) {
            document.reference_url = Some(url.replace("###ID###", &identifier));
        }
    }
}

/// The nearest meaningful display name of a regulation target: the catalyst
/// activity's physical entity name, else the event's name, else the generic
/// display name. Only the first value is used.
fn regulation_target_name(target: &RegulationTarget) -> Option<String> {
    match &target.kind {
        RegulationTargetKind::CatalystActivity {
            physical_entity_names,
        } => physical_entity_names.first().cloned(),
        RegulationTargetKind::Event { names } => names.first().cloned(),
        RegulationTargetKind::PhysicalEntity { names } => names.first().cloned(),
        RegulationTargetKind::Other => Some(target.display_name.clone()),
    }
}

fn regulation_target_id(target: &RegulationTarget) -> String {
    match target.st_id.as_deref().filter(|s| !s.is_empty()) {
        Some(st_id) => st_id.to_string(),
        None => target.db_id.to_string(),
    }
}
