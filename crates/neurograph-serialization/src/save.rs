// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Save engine
//!
//! Two passes over the same root:
//! 1. the value pass writes every selected non-reference field and registers tags;
//! 2. after the [`RangeIndex`] is built from those tags, the reference pass writes every
//!    non-null link as a tag plus element offset.
//!
//! Each pass ends the root with a blank line, so the document holds a value section
//! followed by a reference section.

use crate::range_index::RangeIndex;
use crate::tag_table::TagTable;
use crate::text::LineWriter;
use crate::SaveError;
use ahash::{AHashMap, AHashSet};
use neurograph_schema::{
    codec::text_length_token, FieldDescriptor, ReferenceMode, ReferenceSlot,
    SchemaError, SelectionMode, Slot, TypeDescriptor, TypeRegistry, ValueSlot,
};
use std::any::Any;
use std::io::Write;
use tracing::{debug, info};

/// Counts reported by a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub lines: usize,
    pub tags: usize,
    pub links: usize,
}

/// Writes `root`, an instance of `type_name`, to `sink`.
///
/// # Example
/// ```
/// use neurograph_schema::{Described, FieldDescriptor, SchemaRegistry, SelectionMode};
/// use neurograph_serialization::save;
///
/// #[derive(Default)]
/// struct Soma {
///     potential: i32,
/// }
///
/// impl Described for Soma {
///     const TYPE_NAME: &'static str = "Soma";
///
///     fn describe() -> Vec<FieldDescriptor> {
///         vec![FieldDescriptor::values(
///             "potential",
///             |s: &Soma| &s.potential,
///             |s: &mut Soma| &mut s.potential,
///         )]
///     }
/// }
///
/// let registry = SchemaRegistry::new().with::<Soma>().unwrap();
/// let mut out = Vec::new();
/// save(&registry, "Soma", &Soma { potential: -70 }, &mut out, SelectionMode::All).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "potential -70\n\n\n");
/// ```
pub fn save<T, W>(
    registry: &T,
    type_name: &str,
    root: &dyn Any,
    sink: W,
    mode: SelectionMode,
) -> Result<SaveSummary, SaveError>
where
    T: TypeRegistry + ?Sized,
    W: Write,
{
    let mut saver = Saver {
        registry,
        mode,
        out: LineWriter::new(sink),
        tags: TagTable::new(),
        index: RangeIndex::default(),
        reference_holders: AHashMap::new(),
        links: 0,
    };

    saver.write_values(type_name, root)?;
    saver.index = RangeIndex::build(&saver.tags)?;
    debug!(
        "[SAVE] Value pass done: {} tags, {} direct and {} indirect ranges",
        saver.tags.len(),
        saver.index.direct_entries().len(),
        saver.index.indirect_entries().len()
    );
    saver.write_references(type_name, root)?;

    let summary = SaveSummary {
        lines: saver.out.lines(),
        tags: saver.tags.len(),
        links: saver.links,
    };
    saver.out.finish()?;
    info!(
        "[SAVE] Wrote {} ({} lines, {} tags, {} links, selection {})",
        type_name, summary.lines, summary.tags, summary.links, mode
    );
    Ok(summary)
}

struct Saver<'r, T: ?Sized, W: Write> {
    registry: &'r T,
    mode: SelectionMode,
    out: LineWriter<W>,
    tags: TagTable,
    index: RangeIndex,
    reference_holders: AHashMap<String, bool>,
    links: usize,
}

fn mismatch(type_name: &str) -> SchemaError {
    SchemaError::TypeMismatch(type_name.to_string())
}

impl<'r, T: TypeRegistry + ?Sized, W: Write> Saver<'r, T, W> {
    //region Value pass

    fn write_values(&mut self, type_name: &str, record: &dyn Any) -> Result<(), SaveError> {
        let registry = self.registry;
        let descriptor = registry.describe_type(type_name)?;

        for (index, field) in descriptor.fields().iter().enumerate() {
            if !self.mode.selects(field.flags()) {
                continue;
            }
            let slot = field.slot(record).ok_or_else(|| mismatch(type_name))?;
            check_count(descriptor, index, &slot, record)?;

            if field.flags().tag_target {
                if let Some(view) = slot.storage_view() {
                    let tag = self.tags.register(field.name(), view);
                    self.out.field(field.name(), [format!("t{tag}")])?;
                }
            }

            match slot {
                Slot::Values(values) => self.write_scalars(field, values)?,
                Slot::Text(text) => {
                    let value = text.text();
                    self.out.field(field.name(), [text_length_token(value)?])?;
                    if let Some(value) = value {
                        self.out.raw(value)?;
                    }
                }
                Slot::Record(nested) => {
                    let nested_type = nested_type(field)?;
                    self.out.field(field.name(), ["0"])?;
                    self.write_values(nested_type, nested)?;
                }
                Slot::Records(records) => {
                    let nested_type = nested_type(field)?;
                    for element in 0..records.len() {
                        if let Some(nested) = records.record(element) {
                            self.out.field(field.name(), [element.to_string()])?;
                            self.write_values(nested_type, nested)?;
                        }
                    }
                }
                Slot::Pointers(table) => {
                    // without a count field the table length, trailing nulls included,
                    // travels as `name n<len>`
                    if descriptor.count_field_of(index).is_none() {
                        self.out.field(field.name(), [format!("n{}", table.len())])?;
                    }
                    for position in 0..table.len() {
                        match table.pointee(position) {
                            Some(Slot::Values(values)) => {
                                let tokens = std::iter::once(position.to_string())
                                    .chain((0..values.len()).filter_map(|i| values.encode(i)));
                                self.out.field(field.name(), tokens)?;
                            }
                            Some(Slot::Records(pool)) if pool.is_empty() => {
                                self.out.field(field.name(), [position.to_string()])?;
                            }
                            Some(Slot::Records(pool)) => {
                                let nested_type = nested_type(field)?;
                                for element in 0..pool.len() {
                                    if let Some(nested) = pool.record(element) {
                                        self.out.field(
                                            field.name(),
                                            [position.to_string(), element.to_string()],
                                        )?;
                                        self.write_values(nested_type, nested)?;
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Slot::References(references) => {
                    // growable reference storage without a count field records its length here
                    if field.is_growable() && descriptor.count_field_of(index).is_none() {
                        self.out.field(field.name(), [references.len().to_string()])?;
                    }
                }
            }
        }

        self.out.blank()?;
        Ok(())
    }

    fn write_scalars(
        &mut self,
        field: &FieldDescriptor,
        values: &dyn ValueSlot,
    ) -> Result<(), SaveError> {
        let dimensions = field.dimensions();
        if dimensions.len() < 2 {
            if values.is_empty() {
                return Ok(());
            }
            let tokens = (0..values.len()).filter_map(|i| values.encode(i));
            self.out.field(field.name(), tokens)?;
            return Ok(());
        }

        // one line per innermost row, prefixed by the outer indices (outermost first)
        let width = dimensions[0];
        let outer = &dimensions[1..];
        let rows: usize = outer.iter().product();
        for row in 0..rows {
            let mut prefix = Vec::with_capacity(outer.len());
            let mut rest = row;
            for extent in outer {
                prefix.push(rest % extent);
                rest /= extent;
            }
            let tokens = prefix
                .iter()
                .rev()
                .map(|i| i.to_string())
                .chain((0..width).filter_map(|i| values.encode(row * width + i)));
            self.out.field(field.name(), tokens)?;
        }
        Ok(())
    }

    //endregion

    //region Reference pass

    fn write_references(&mut self, type_name: &str, record: &dyn Any) -> Result<(), SaveError> {
        let registry = self.registry;
        let descriptor = registry.describe_type(type_name)?;

        for field in descriptor.fields() {
            if !self.mode.selects(field.flags()) {
                continue;
            }
            if let Some(nested_type) = field.nested_type_name() {
                if !self.holds_references(nested_type)? {
                    continue;
                }
            } else if !field.is_reference() {
                continue;
            }

            match field.slot(record).ok_or_else(|| mismatch(type_name))? {
                Slot::References(references) => self.write_links(field, references)?,
                Slot::Record(nested) => {
                    self.out.field(field.name(), ["0"])?;
                    self.write_references(nested_type(field)?, nested)?;
                }
                Slot::Records(records) => {
                    let nested_type = nested_type(field)?;
                    for element in 0..records.len() {
                        if let Some(nested) = records.record(element) {
                            self.out.field(field.name(), [element.to_string()])?;
                            self.write_references(nested_type, nested)?;
                        }
                    }
                }
                Slot::Pointers(table) => {
                    let nested_type = nested_type(field)?;
                    for position in 0..table.len() {
                        let Some(Slot::Records(pool)) = table.pointee(position) else {
                            continue;
                        };
                        for element in 0..pool.len() {
                            if let Some(nested) = pool.record(element) {
                                self.out.field(
                                    field.name(),
                                    [position.to_string(), element.to_string()],
                                )?;
                                self.write_references(nested_type, nested)?;
                            }
                        }
                    }
                }
                Slot::Values(_) | Slot::Text(_) => {}
            }
        }

        self.out.blank()?;
        Ok(())
    }

    fn write_links(
        &mut self,
        field: &FieldDescriptor,
        references: &dyn ReferenceSlot,
    ) -> Result<(), SaveError> {
        let mode = if field.is_indirect_reference() {
            ReferenceMode::Indirect
        } else {
            ReferenceMode::Direct
        };
        let multiple = field.repeat_count() != 1;

        for slot_index in 0..references.len() {
            let Some(link) = references.get_link(slot_index) else {
                continue;
            };
            let resolution =
                self.index
                    .resolve(&link, mode)
                    .ok_or_else(|| SaveError::UnresolvedReference {
                        field: field.name().to_string(),
                        link,
                    })?;

            let mut tokens = Vec::with_capacity(4);
            if multiple {
                tokens.push(slot_index.to_string());
            }
            match (mode, resolution.pointee) {
                (ReferenceMode::Indirect, Some(pointee)) => {
                    tokens.push(format!("i{}", resolution.tag));
                    let table_len = self
                        .tags
                        .get(resolution.tag)
                        .map(|entry| entry.view.len())
                        .unwrap_or_default();
                    if table_len != 1 {
                        tokens.push(pointee.to_string());
                    }
                }
                _ => tokens.push(format!("d{}", resolution.tag)),
            }
            tokens.push(resolution.element.to_string());

            self.out.field(field.name(), tokens)?;
            self.links += 1;
        }
        Ok(())
    }

    /// True when `type_name` can reach a reference field through its nested records.
    fn holds_references(&mut self, type_name: &str) -> Result<bool, SaveError> {
        if let Some(&known) = self.reference_holders.get(type_name) {
            return Ok(known);
        }
        let mut visited = AHashSet::new();
        let holds = reaches_reference(self.registry, type_name, &mut visited)?;
        self.reference_holders.insert(type_name.to_string(), holds);
        Ok(holds)
    }

    //endregion
}

fn reaches_reference<T: TypeRegistry + ?Sized>(
    registry: &T,
    type_name: &str,
    visited: &mut AHashSet<String>,
) -> Result<bool, SaveError> {
    if !visited.insert(type_name.to_string()) {
        return Ok(false);
    }
    for field in registry.describe_type(type_name)?.fields() {
        if field.is_reference() {
            return Ok(true);
        }
        if let Some(nested) = field.nested_type_name() {
            if reaches_reference(registry, nested, visited)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn nested_type(field: &FieldDescriptor) -> Result<&'static str, SchemaError> {
    field
        .nested_type_name()
        .ok_or_else(|| SchemaError::InvalidDescriptor {
            type_name: String::new(),
            field: field.name().to_string(),
            reason: "field does not hold nested records".to_string(),
        })
}

/// A growable field with a `_count` sibling must hold exactly that many elements.
fn check_count(
    descriptor: &TypeDescriptor,
    index: usize,
    slot: &Slot<'_>,
    record: &dyn Any,
) -> Result<(), SaveError> {
    let Some(count_index) = descriptor.count_field_of(index) else {
        return Ok(());
    };
    let Some(actual) = slot.storage_view().map(|view| view.len()) else {
        return Ok(());
    };
    let count_field = &descriptor.fields()[count_index];
    let Some(Slot::Values(count)) = count_field.slot(record) else {
        return Ok(());
    };
    if count.as_count() == Some(actual) {
        return Ok(());
    }
    Err(SaveError::CountMismatch {
        type_name: descriptor.name().to_string(),
        field: descriptor.fields()[index].name().to_string(),
        declared: count.encode(0).unwrap_or_default(),
        actual,
    })
}
