//! EBeye export mirror.
//!
//! When enabled, the pipeline writes every document it indexes into an
//! archival EBeye XML file in lockstep with the graph-entity phases. The
//! interactor phase is never mirrored.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use pathway_search_shared::IndexDocument;

const EXPORT_NAME: &str = "Pathway Knowledge Base";
const EXPORT_DESCRIPTION: &str = "A free, open-source, curated and peer-reviewed pathway \
database providing intuitive bioinformatics tools for the visualization, interpretation and \
analysis of pathway knowledge.";

/// Streaming EBeye XML writer with header/entry/footer framing.
pub struct EbeyeExporter<W: Write> {
    writer: W,
}

impl EbeyeExporter<BufWriter<File>> {
    /// Create a file-backed exporter.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_writer(BufWriter::new(file)))
    }
}

impl<W: Write> EbeyeExporter<W> {
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Write the database header with the graph release number.
    pub fn write_header(&mut self, release: u32) -> io::Result<()> {
        writeln!(self.writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(self.writer, "<database>")?;
        writeln!(self.writer, "  <name>{}</name>", escape_xml(EXPORT_NAME))?;
        writeln!(
            self.writer,
            "  <description>{}</description>",
            escape_xml(EXPORT_DESCRIPTION)
        )?;
        writeln!(self.writer, "  <release>{}</release>", release)?;
        writeln!(self.writer, "  <entries>")?;
        Ok(())
    }

    /// Write one document entry.
    pub fn write_entry(&mut self, document: &IndexDocument) -> io::Result<()> {
        let id = document.st_id.as_deref().unwrap_or(&document.db_id);
        writeln!(self.writer, r#"    <entry id="{}">"#, escape_xml(id))?;
        if let Some(name) = &document.name {
            writeln!(self.writer, "      <name>{}</name>", escape_xml(name))?;
        }
        if let Some(summation) = &document.summation {
            writeln!(
                self.writer,
                "      <description>{}</description>",
                escape_xml(summation)
            )?;
        }
        if !document.all_cross_references.is_empty() {
            writeln!(self.writer, "      <cross_references>")?;
            for reference in &document.all_cross_references {
                writeln!(
                    self.writer,
                    r#"        <ref dbname="{}" dbkey="{}"/>"#,
                    escape_xml(&reference.db_name),
                    escape_xml(&reference.id)
                )?;
            }
            writeln!(self.writer, "      </cross_references>")?;
        }
        writeln!(self.writer, "      <additional_fields>")?;
        write_field(&mut self.writer, "type", &document.doc_type)?;
        for species in &document.species {
            write_field(&mut self.writer, "species", species)?;
        }
        for keyword in &document.keywords {
            write_field(&mut self.writer, "keyword", keyword)?;
        }
        writeln!(self.writer, "      </additional_fields>")?;
        writeln!(self.writer, "    </entry>")?;
        Ok(())
    }

    /// Flush buffered output to the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Close the entries block with the final entry count.
    pub fn write_footer(&mut self, entry_count: u64) -> io::Result<()> {
        writeln!(self.writer, "  </entries>")?;
        writeln!(self.writer, "  <entry_count>{}</entry_count>", entry_count)?;
        writeln!(self.writer, "</database>")?;
        self.writer.flush()
    }
}

fn write_field<W: Write>(writer: &mut W, name: &str, value: &str) -> io::Result<()> {
    writeln!(
        writer,
        r#"        <field name="{}">{}</field>"#,
        name,
        escape_xml(value)
    )
}

fn escape_xml(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exported(f: impl FnOnce(&mut EbeyeExporter<Vec<u8>>)) -> String {
        let mut exporter = EbeyeExporter::with_writer(Vec::new());
        f(&mut exporter);
        String::from_utf8(exporter.writer).unwrap()
    }

    #[test]
    fn header_and_footer_frame_entries() {
        let xml = exported(|exporter| {
            exporter.write_header(93).unwrap();
            exporter.write_footer(2).unwrap();
        });

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<release>93</release>"));
        assert!(xml.contains("<entry_count>2</entry_count>"));
        assert!(xml.trim_end().ends_with("</database>"));
    }

    #[test]
    fn entry_prefers_stable_identifier() {
        let mut document = IndexDocument::new("123", "Pathway", "Pathway");
        document.st_id = Some("R-HSA-123".to_string());
        document.name = Some("Signal Transduction".to_string());
        document.species = vec!["Homo sapiens".to_string()];

        let xml = exported(|exporter| exporter.write_entry(&document).unwrap());

        assert!(xml.contains(r#"<entry id="R-HSA-123">"#));
        assert!(xml.contains("<name>Signal Transduction</name>"));
        assert!(xml.contains(r#"<field name="species">Homo sapiens</field>"#));
        assert!(xml.contains(r#"<field name="type">Pathway</field>"#));
    }

    #[test]
    fn entry_escapes_markup() {
        let mut document = IndexDocument::new("7", "Reaction", "Reaction");
        document.name = Some("A<B & \"C\"".to_string());

        let xml = exported(|exporter| exporter.write_entry(&document).unwrap());

        assert!(xml.contains("<name>A&lt;B &amp; &quot;C&quot;</name>"));
    }

    #[test]
    fn cross_references_emitted_from_structured_list() {
        use pathway_search_shared::CrossReference;

        let mut document = IndexDocument::new("7", "Protein", "ReferenceGeneProduct");
        document.all_cross_references = vec![CrossReference::new("P04637", "UniProt")];

        let xml = exported(|exporter| exporter.write_entry(&document).unwrap());

        assert!(xml.contains(r#"<ref dbname="UniProt" dbkey="P04637"/>"#));
    }
}
