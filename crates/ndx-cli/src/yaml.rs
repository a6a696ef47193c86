//! YAML-like pretty-printer over the read-only accessors of a container.

use std::fmt::Display;
use std::io::Write;

use ndx::{
    Block, DataArray, Dimension, Entity, Named, NdxFile, Property, Result, Section, Tag, TagKind,
    Value, WithMetadata,
};

struct Yaml<'a, W: Write> {
    out: &'a mut W,
}

impl<W: Write> Yaml<'_, W> {
    fn pad(&mut self, indent: usize) -> std::io::Result<()> {
        write!(self.out, "{:indent$}", "", indent = indent * 2)
    }

    fn kv(&mut self, indent: usize, key: &str, value: impl Display) -> std::io::Result<()> {
        self.pad(indent)?;
        writeln!(self.out, "{key}: {value}")
    }

    fn key(&mut self, indent: usize, key: &str) -> std::io::Result<()> {
        self.pad(indent)?;
        writeln!(self.out, "{key}:")
    }

    fn item(&mut self, indent: usize, key: &str, value: impl Display) -> std::io::Result<()> {
        self.pad(indent)?;
        writeln!(self.out, "- {key}: {value}")
    }
}

fn timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map_or_else(|| secs.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn list<T: Display>(values: &[T]) -> String {
    let items: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

fn fmt_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int64(i) => i.to_string(),
        Value::Float64(f) => f.to_string(),
        Value::Str(s) => format!("\"{s}\""),
    }
}

/// Which side of the container to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpScope {
    All,
    /// Metadata forest only.
    Metadata,
    /// Blocks only.
    Data,
}

/// Dump the container: root attributes, then the scoped forests.
pub fn dump_file<W: Write>(out: &mut W, file: &NdxFile, scope: DumpScope) -> Result<()> {
    let mut y = Yaml { out };
    y.kv(0, "format", file.format()?)?;
    y.kv(0, "version", file.version()?)?;
    y.kv(0, "createdAt", timestamp(file.created_at()?))?;
    y.kv(0, "updatedAt", timestamp(file.updated_at()?))?;

    if scope != DumpScope::Data {
        let sections = file.sections()?;
        if !sections.is_empty() {
            y.key(0, "sections")?;
            for section in &sections {
                dump_section(&mut y, 1, section)?;
            }
        }
    }

    if scope != DumpScope::Metadata {
        let blocks = file.blocks()?;
        if !blocks.is_empty() {
            y.key(0, "blocks")?;
            for block in &blocks {
                dump_block(&mut y, 1, block)?;
            }
        }
    }
    Ok(())
}

fn dump_named<W: Write>(
    y: &mut Yaml<'_, W>,
    indent: usize,
    entity: &(impl Entity + Named),
) -> Result<()> {
    y.item(indent, "id", entity.id()?)?;
    y.kv(indent + 1, "name", entity.name()?)?;
    y.kv(indent + 1, "type", entity.type_name()?)?;
    if let Some(definition) = entity.definition()? {
        y.kv(indent + 1, "definition", definition)?;
    }
    y.kv(indent + 1, "createdAt", timestamp(entity.created_at()?))?;
    y.kv(indent + 1, "updatedAt", timestamp(entity.updated_at()?))?;
    Ok(())
}

fn dump_metadata_link<W: Write>(
    y: &mut Yaml<'_, W>,
    indent: usize,
    entity: &impl WithMetadata,
) -> Result<()> {
    if let Some(section) = entity.metadata()? {
        y.kv(indent, "metadata", section.id()?)?;
    }
    y.kv(indent, "sourceCount", entity.source_count()?)?;
    Ok(())
}

fn dump_section<W: Write>(y: &mut Yaml<'_, W>, indent: usize, section: &Section) -> Result<()> {
    dump_named(y, indent, section)?;
    if let Some(repository) = section.repository()? {
        y.kv(indent + 1, "repository", repository)?;
    }
    if let Some(mapping) = section.mapping()? {
        y.kv(indent + 1, "mapping", mapping)?;
    }
    if let Some(link) = section.link_id()? {
        y.kv(indent + 1, "link", link)?;
    }

    let properties = section.properties()?;
    if !properties.is_empty() {
        y.key(indent + 1, "properties")?;
        for property in &properties {
            dump_property(y, indent + 2, property)?;
        }
    }

    let children = section.sections()?;
    if !children.is_empty() {
        y.key(indent + 1, "sections")?;
        for child in &children {
            dump_section(y, indent + 2, child)?;
        }
    }
    Ok(())
}

fn dump_property<W: Write>(y: &mut Yaml<'_, W>, indent: usize, property: &Property) -> Result<()> {
    y.item(indent, "id", property.id()?)?;
    y.kv(indent + 1, "name", property.name()?)?;
    if let Some(dtype) = property.data_type()? {
        y.kv(indent + 1, "dataType", dtype)?;
    }
    let values: Vec<String> = property.values()?.iter().map(fmt_value).collect();
    if !values.is_empty() {
        y.kv(indent + 1, "values", list(&values))?;
    }
    if let Some(unit) = property.unit()? {
        y.kv(indent + 1, "unit", unit)?;
    }
    if let Some(uncertainty) = property.uncertainty()? {
        y.kv(indent + 1, "uncertainty", uncertainty)?;
    }
    Ok(())
}

fn dump_block<W: Write>(y: &mut Yaml<'_, W>, indent: usize, block: &Block) -> Result<()> {
    dump_named(y, indent, block)?;
    dump_metadata_link(y, indent + 1, block)?;

    let arrays = block.data_arrays()?;
    if !arrays.is_empty() {
        y.key(indent + 1, "dataArrays")?;
        for array in &arrays {
            dump_data_array(y, indent + 2, array)?;
        }
    }

    let tags = block.tags()?;
    if !tags.is_empty() {
        y.key(indent + 1, "tags")?;
        for tag in &tags {
            dump_tag(y, indent + 2, tag)?;
        }
    }
    Ok(())
}

fn dump_data_array<W: Write>(y: &mut Yaml<'_, W>, indent: usize, array: &DataArray) -> Result<()> {
    dump_named(y, indent, array)?;
    dump_metadata_link(y, indent + 1, array)?;
    if let Some(payload) = array.payload()? {
        y.kv(indent + 1, "dataType", payload.dtype())?;
        y.kv(indent + 1, "extents", list(payload.extents()))?;
    }
    let dimensions = array.dimensions()?;
    if !dimensions.is_empty() {
        y.key(indent + 1, "dimensions")?;
        for dimension in &dimensions {
            dump_dimension(y, indent + 2, dimension)?;
        }
    }
    Ok(())
}

fn dump_dimension<W: Write>(
    y: &mut Yaml<'_, W>,
    indent: usize,
    dimension: &Dimension,
) -> Result<()> {
    y.item(indent, "type", dimension.type_name())?;
    match dimension {
        Dimension::Set { labels } => {
            y.kv(indent + 1, "labels", list(labels))?;
        }
        Dimension::Sampled {
            offset,
            interval,
            unit,
        } => {
            y.kv(indent + 1, "offset", offset)?;
            y.kv(indent + 1, "interval", interval)?;
            if let Some(unit) = unit {
                y.kv(indent + 1, "unit", unit)?;
            }
        }
        Dimension::Range { ticks } => {
            y.kv(indent + 1, "ticks", list(ticks))?;
        }
    }
    Ok(())
}

fn dump_tag<W: Write>(y: &mut Yaml<'_, W>, indent: usize, tag: &Tag) -> Result<()> {
    dump_named(y, indent, tag)?;
    dump_metadata_link(y, indent + 1, tag)?;
    let kind = match tag.kind()? {
        TagKind::Simple => "simple",
        TagKind::Data => "data",
    };
    y.kv(indent + 1, "kind", kind)?;
    y.kv(indent + 1, "position", list(&tag.position()?))?;
    if tag.kind()? == TagKind::Data {
        y.kv(indent + 1, "extent", list(&tag.extent()?))?;
    }
    let references = tag.references()?;
    if !references.is_empty() {
        y.kv(indent + 1, "references", list(&references))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndx::Context;

    fn sample_file() -> NdxFile {
        let file =
            NdxFile::in_memory_with_context(Context::deterministic(31, 1_700_000_000)).unwrap();
        let session = file.create_section("session", "recording").unwrap();
        let gain = session.add_property("gain").unwrap();
        gain.set_values(&[Value::Float64(2.5)]).unwrap();
        gain.set_unit("mV").unwrap();
        session.add_section("subject", "animal").unwrap();

        let block = file.create_block("trial-1", "ephys").unwrap();
        block.set_metadata(&session).unwrap();
        let array = block.create_data_array("voltage", "analog").unwrap();
        array
            .set_payload(ndx::NdArray::allocate(ndx::DataType::Float64, vec![4]).unwrap())
            .unwrap();
        array
            .append_sampled_dimension(0.0, 0.001, Some("s".to_owned()))
            .unwrap();
        let tag = block
            .create_simple_tag("onset", "event", vec![1.0])
            .unwrap();
        tag.add_reference(&array.id().unwrap()).unwrap();
        file
    }

    #[test]
    fn dump_covers_both_forests() {
        let file = sample_file();
        let mut buffer = Vec::new();
        dump_file(&mut buffer, &file, DumpScope::All).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("format: ndx\n"));
        assert!(text.contains("sections:"));
        assert!(text.contains("name: session"));
        assert!(text.contains("values: [2.5]"));
        assert!(text.contains("unit: mV"));
        assert!(text.contains("blocks:"));
        assert!(text.contains("name: trial-1"));
        assert!(text.contains("extents: [4]"));
        assert!(text.contains("- type: sampled"));
        assert!(text.contains("kind: simple"));
        assert!(text.contains("position: [1]"));
    }

    #[test]
    fn empty_file_dumps_root_attributes_only() {
        let file =
            NdxFile::in_memory_with_context(Context::deterministic(1, 1_700_000_000)).unwrap();
        let mut buffer = Vec::new();
        dump_file(&mut buffer, &file, DumpScope::All).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("format: ndx"));
        assert!(!text.contains("sections:"));
        assert!(!text.contains("blocks:"));
    }

    #[test]
    fn scopes_restrict_the_output() {
        let file = sample_file();

        let mut buffer = Vec::new();
        dump_file(&mut buffer, &file, DumpScope::Metadata).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("sections:"));
        assert!(!text.contains("blocks:"));

        let mut buffer = Vec::new();
        dump_file(&mut buffer, &file, DumpScope::Data).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(!text.contains("sections:"));
        assert!(text.contains("blocks:"));
    }

    #[test]
    fn timestamps_are_human_readable() {
        assert_eq!(timestamp(1_700_000_000), "2023-11-14 22:13:20");
    }
}
