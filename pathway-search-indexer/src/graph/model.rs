//! Typed model of the entities loaded from the knowledge graph.
//!
//! The graph stores a deep class hierarchy; what the document builder needs
//! is a closed set of tagged variants, so the loader flattens each node into
//! one of the structs below. The kind tags encode which capabilities an
//! entity has (species attribute, related species, reference attachment),
//! which lets the builder dispatch without any runtime type inspection.

/// Attributes every graph entity carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCore {
    pub db_id: i64,
    pub st_id: Option<String>,
    pub old_st_id: Option<String>,
    pub display_name: String,
    pub schema_class: String,
}

/// One organism reference as stored in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesRef {
    pub tax_id: String,
    pub display_name: String,
}

/// A publication author, keyed by its graph identifier.
///
/// Ordered by `(db_id, display_name)` so an ordered set de-duplicates
/// authors exactly like the grouping stage requires; only the name is
/// projected into the final document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AuthorRef {
    pub db_id: i64,
    pub display_name: String,
}

/// Kind-specific detail of a publication.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicationDetail {
    Journal { pubmed_identifier: Option<i64> },
    Book { isbn: Option<String> },
    Other,
}

/// A literature reference attached to an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub title: Option<String>,
    pub authors: Vec<AuthorRef>,
    pub detail: PublicationDetail,
}

/// A disease ontology term.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseTerm {
    pub identifier: String,
    pub names: Vec<String>,
    pub synonyms: Vec<String>,
}

/// A cellular compartment term.
#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentTerm {
    pub display_name: String,
    pub accession: String,
}

/// A raw external cross-reference as stored in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseIdentifier {
    pub display_name: String,
    pub identifier: String,
    pub database_name: String,
}

/// Gene Ontology namespaces the graph links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoTermKind {
    BiologicalProcess,
    CellularComponent,
    MolecularFunction,
}

/// A Gene Ontology term.
#[derive(Debug, Clone, PartialEq)]
pub struct GoTerm {
    pub kind: GoTermKind,
    pub accession: String,
    pub display_name: String,
}

/// A curator or reviewer person record.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub first_name: Option<String>,
    pub initial: Option<String>,
    pub surname: String,
    pub orcid_id: Option<String>,
}

impl Person {
    /// Display name used in the author facet: first name, falling back to
    /// the initial when the first name is blank.
    pub fn index_name(&self) -> String {
        let given = self
            .first_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.initial.as_deref())
            .unwrap_or("");
        if given.is_empty() {
            self.surname.clone()
        } else {
            format!("{} {}", given, self.surname)
        }
    }
}

/// Concrete class of a reference entity.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceEntityKind {
    GeneProduct,
    Isoform { variant_identifier: Option<String> },
    DnaSequence,
    RnaSequence,
    Molecule,
    Group,
    Other,
}

/// The reference entity carrying the canonical external accession for a
/// physical entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntity {
    pub display_name: String,
    pub schema_class: String,
    pub kind: ReferenceEntityKind,
    pub identifier: Option<String>,
    pub names: Vec<String>,
    pub gene_names: Vec<String>,
    pub secondary_identifiers: Vec<String>,
    pub other_identifiers: Vec<String>,
    pub cross_references: Vec<DatabaseIdentifier>,
    pub database_name: String,
    pub access_url: Option<String>,
}

impl ReferenceEntity {
    /// Coarse chemical/biological classification used as the type facet.
    pub fn coarse_type(&self) -> &str {
        match self.kind {
            ReferenceEntityKind::GeneProduct | ReferenceEntityKind::Isoform { .. } => "Protein",
            ReferenceEntityKind::DnaSequence => "DNA Sequence",
            ReferenceEntityKind::RnaSequence => "RNA Sequence",
            ReferenceEntityKind::Molecule | ReferenceEntityKind::Group => "Chemical Compound",
            ReferenceEntityKind::Other => &self.schema_class,
        }
    }
}

/// Physical entity sub-kinds relevant to mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalEntityKind {
    GenomeEncoded,
    EntitySet,
    Complex,
    SimpleEntity,
    Polymer,
    Other,
}

/// A physical entity node.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalEntity {
    pub core: EntityCore,
    pub kind: PhysicalEntityKind,
    pub names: Vec<String>,
    pub literature: Vec<Publication>,
    pub summations: Vec<String>,
    pub diseases: Vec<DiseaseTerm>,
    pub compartments: Vec<CompartmentTerm>,
    pub cross_references: Vec<DatabaseIdentifier>,
    pub go_cellular_component: Option<GoTerm>,
    pub reference_entity: Option<ReferenceEntity>,
    pub species: Vec<SpeciesRef>,
    pub related_species: Vec<SpeciesRef>,
}

/// Event sub-kinds relevant to mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Pathway,
    /// Reaction-like events additionally carry catalyst activity GO terms.
    Reaction { catalyst_activities: Vec<GoTerm> },
}

/// An event node (pathway or reaction-like).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub core: EntityCore,
    pub kind: EventKind,
    pub names: Vec<String>,
    pub literature: Vec<Publication>,
    pub summations: Vec<String>,
    pub diseases: Vec<DiseaseTerm>,
    pub compartments: Vec<CompartmentTerm>,
    pub cross_references: Vec<DatabaseIdentifier>,
    pub go_biological_process: Option<GoTerm>,
    pub authored: Vec<Person>,
    pub reviewed: Vec<Person>,
    pub species: Vec<SpeciesRef>,
    pub related_species: Vec<SpeciesRef>,
}

/// What a regulation points at (regulated entity or regulator).
#[derive(Debug, Clone, PartialEq)]
pub enum RegulationTargetKind {
    /// The names of the catalyst activity's physical entity.
    CatalystActivity { physical_entity_names: Vec<String> },
    Event { names: Vec<String> },
    PhysicalEntity { names: Vec<String> },
    Other,
}

/// A regulated entity or regulator reference.
#[derive(Debug, Clone, PartialEq)]
pub struct RegulationTarget {
    pub db_id: i64,
    pub st_id: Option<String>,
    pub display_name: String,
    pub kind: RegulationTargetKind,
}

/// A regulation node.
#[derive(Debug, Clone, PartialEq)]
pub struct Regulation {
    pub core: EntityCore,
    pub names: Vec<String>,
    pub literature: Vec<Publication>,
    pub summations: Vec<String>,
    pub regulated_entity: Option<RegulationTarget>,
    pub regulator: Option<RegulationTarget>,
}

/// A graph entity, discriminated by broad category.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEntity {
    PhysicalEntity(PhysicalEntity),
    Event(Event),
    Regulation(Regulation),
}

impl GraphEntity {
    pub fn core(&self) -> &EntityCore {
        match self {
            GraphEntity::PhysicalEntity(pe) => &pe.core,
            GraphEntity::Event(ev) => &ev.core,
            GraphEntity::Regulation(r) => &r.core,
        }
    }
}
