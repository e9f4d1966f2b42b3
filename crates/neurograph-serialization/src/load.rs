// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Load engine
//!
//! A single forward pass over the document. The root's value section is read first
//! (growing storage as counts and indices arrive, registering `t<N>` tags), then its
//! reference section copies links out of the tagged storage. Problems a lenient reader
//! can survive are collected as [`LoadWarning`]s; everything else aborts.

use crate::tag_table::{parse_marker, TagTable};
use crate::text::{Line, LineReader};
use crate::{LoadError, LoadWarning};
use ahash::AHashMap;
use neurograph_schema::codec::parse_text_length;
use neurograph_schema::{
    FieldDescriptor, Link, PointerSlot, RecordSlot, ReferenceSlot, SchemaError, Slot, SlotMut,
    StorageId, StorageView, TextSlot, TypeDescriptor, TypeRegistry, ValueSlot,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::io::BufRead;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Largest forward jump allowed between consecutive tag numbers.
const MAX_TAG_GAP: usize = 4096;

/// Default ceiling on the length any single storage may be grown to while loading.
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 24;

/// How recoverable problems are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Clamp, skip or truncate, and report a warning
    #[default]
    Lenient,
    /// Refuse the document at the first recoverable problem
    Strict,
}

impl Display for LoadPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPolicy::Lenient => write!(f, "lenient"),
            LoadPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for LoadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(LoadPolicy::Lenient),
            "strict" => Ok(LoadPolicy::Strict),
            other => Err(format!(
                "Invalid load policy '{other}'. Must be one of: lenient, strict"
            )),
        }
    }
}

/// What a successful load processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub lines: usize,
    pub tags: usize,
    pub links: usize,
    pub warnings: Vec<LoadWarning>,
}

/// Reads a document produced by [`save`](crate::save) into `root`, an instance of `type_name`.
///
/// When `root_is_valid_allocation` is false the root and every nested record the document
/// mentions are reset to their defaults before being filled.
pub fn load<T, S>(
    registry: &T,
    source: S,
    type_name: &str,
    root: &mut dyn Any,
    root_is_valid_allocation: bool,
    policy: LoadPolicy,
) -> Result<LoadSummary, LoadError>
where
    T: TypeRegistry + ?Sized,
    S: BufRead,
{
    Loader::new(registry, policy).load(source, type_name, root, root_is_valid_allocation)
}

/// Configurable entry point behind [`load`].
pub struct Loader<'r, T: ?Sized> {
    registry: &'r T,
    policy: LoadPolicy,
    first_line: usize,
    max_elements: usize,
}

impl<'r, T: TypeRegistry + ?Sized> Loader<'r, T> {
    pub fn new(registry: &'r T, policy: LoadPolicy) -> Self {
        Self {
            registry,
            policy,
            first_line: 1,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }

    /// Line number of the first line `source` will yield, for diagnostics when the
    /// caller already consumed a header.
    pub fn starting_at_line(mut self, first_line: usize) -> Self {
        self.first_line = first_line;
        self
    }

    /// Largest length a count, index or length line may grow storage to. Documents
    /// asking for more are malformed.
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn load<S: BufRead>(
        &self,
        source: S,
        type_name: &str,
        root: &mut dyn Any,
        root_is_valid_allocation: bool,
    ) -> Result<LoadSummary, LoadError> {
        let mut run = LoadRun {
            registry: self.registry,
            policy: self.policy,
            reader: LineReader::starting_at(source, self.first_line),
            tags: TagTable::new(),
            tagged: AHashMap::new(),
            zero_fill: !root_is_valid_allocation,
            max_elements: self.max_elements,
            summary: LoadSummary::default(),
        };

        if run.zero_fill {
            self.registry.reset_record(type_name, root)?;
        }
        run.read_values(type_name, root)?;
        debug!(
            "[LOAD] Value section done: {} lines, {} tags",
            run.summary.lines, run.summary.tags
        );
        run.read_references(type_name, root)?;

        info!(
            "[LOAD] Read {} ({} lines, {} tags, {} links, {} warnings, policy {})",
            type_name,
            run.summary.lines,
            run.summary.tags,
            run.summary.links,
            run.summary.warnings.len(),
            self.policy
        );
        Ok(run.summary)
    }
}

struct LoadRun<'r, T: ?Sized, S: BufRead> {
    registry: &'r T,
    policy: LoadPolicy,
    reader: LineReader<S>,
    tags: TagTable,
    // storage id -> tag, for refreshing views after growth
    tagged: AHashMap<StorageId, usize>,
    zero_fill: bool,
    max_elements: usize,
    summary: LoadSummary,
}

fn malformed(line: usize, reason: impl Into<String>) -> LoadError {
    LoadError::Malformed {
        line,
        reason: reason.into(),
    }
}

fn parse_index(token: Option<&&str>, line: usize, what: &str) -> Result<usize, LoadError> {
    let token = token.ok_or_else(|| malformed(line, format!("missing {what}")))?;
    token
        .parse()
        .map_err(|_| malformed(line, format!("invalid {what} '{token}'")))
}

fn nested_type(field: &FieldDescriptor, line: usize) -> Result<&'static str, LoadError> {
    field
        .nested_type_name()
        .ok_or_else(|| malformed(line, format!("field '{}' holds no records", field.name())))
}

fn mismatch(type_name: &str) -> LoadError {
    LoadError::Schema(SchemaError::TypeMismatch(type_name.to_string()))
}

impl<'r, T: TypeRegistry + ?Sized, S: BufRead> LoadRun<'r, T, S> {
    /// Applies the policy to a recoverable problem.
    fn recover(&mut self, warning: LoadWarning) -> Result<(), LoadError> {
        if self.policy == LoadPolicy::Strict {
            return Err(LoadError::Rejected(warning));
        }
        warn!("[LOAD] {}", warning);
        self.summary.warnings.push(warning);
        Ok(())
    }

    /// `len` when storage of `field` may grow that far.
    fn bounded(
        &self,
        field: &FieldDescriptor,
        len: usize,
        line: usize,
    ) -> Result<usize, LoadError> {
        if len > self.max_elements {
            return Err(malformed(
                line,
                format!(
                    "'{}' asks for {len} elements, above the limit of {}",
                    field.name(),
                    self.max_elements
                ),
            ));
        }
        Ok(len)
    }

    /// Length needed for `index` to exist in storage of `field`.
    fn length_for(
        &self,
        field: &FieldDescriptor,
        index: usize,
        line: usize,
    ) -> Result<usize, LoadError> {
        let len = index.checked_add(1).ok_or_else(|| {
            malformed(line, format!("index {index} of '{}' is too large", field.name()))
        })?;
        self.bounded(field, len, line)
    }

    /// Next line of the current record, `None` at its closing blank line or end of input.
    fn next_content_line(&mut self) -> Result<Option<Line>, LoadError> {
        match self.reader.next_line()? {
            Some(line) if line.is_blank() => Ok(None),
            Some(line) => {
                self.summary.lines += 1;
                Ok(Some(line))
            }
            None => Ok(None),
        }
    }

    fn field_for<'d>(
        &mut self,
        descriptor: &'d TypeDescriptor,
        name: &str,
        line: usize,
    ) -> Result<Option<(usize, &'d FieldDescriptor)>, LoadError> {
        match descriptor.field_index(name) {
            Some(index) => Ok(Some((index, &descriptor.fields()[index]))),
            None => {
                self.recover(LoadWarning::UnknownField {
                    line,
                    type_name: descriptor.name().to_string(),
                    field: name.to_string(),
                })?;
                Ok(None)
            }
        }
    }

    //region Value section

    fn read_values(&mut self, type_name: &str, record: &mut dyn Any) -> Result<(), LoadError> {
        let registry = self.registry;
        let descriptor = registry.describe_type(type_name)?;

        while let Some(line) = self.next_content_line()? {
            let (name, tokens) = line.split();
            let Some((index, field)) = self.field_for(descriptor, name, line.number)? else {
                continue;
            };
            self.read_value_line(descriptor, index, field, record, &tokens, line.number)?;
        }

        self.refresh_tags(descriptor, record);
        Ok(())
    }

    fn read_value_line(
        &mut self,
        descriptor: &TypeDescriptor,
        index: usize,
        field: &FieldDescriptor,
        record: &mut dyn Any,
        tokens: &[&str],
        line: usize,
    ) -> Result<(), LoadError> {
        if field.flags().tag_target && tokens.len() == 1 {
            if let Some(tag) = parse_marker(tokens[0], 't') {
                return self.register_tag(descriptor, field, record, tag, line);
            }
        }

        let counted = descriptor.count_field_of(index).is_some();
        match field
            .slot_mut(record)
            .ok_or_else(|| mismatch(descriptor.name()))?
        {
            SlotMut::Values(values) => self.read_scalars(field, values, counted, tokens, line)?,
            SlotMut::Text(text) => self.read_text(field, text, tokens, line)?,
            SlotMut::Record(nested) => {
                let nested_type = nested_type(field, line)?;
                let element = parse_index(tokens.first(), line, "record index")?;
                if element != 0 {
                    self.recover(LoadWarning::IndexOutOfRange {
                        line,
                        field: field.name().to_string(),
                        index: element,
                        len: 1,
                    })?;
                    return self.discard_values(nested_type);
                }
                self.read_nested_values(nested_type, nested)?;
            }
            SlotMut::Records(records) => {
                self.read_record_element(field, records, counted, tokens, line)?
            }
            SlotMut::Pointers(table) => self.read_pointee(field, table, counted, tokens, line)?,
            SlotMut::References(references) => {
                let len = parse_index(tokens.first(), line, "reference count")?;
                if field.is_growable() && !counted {
                    references.resize(self.bounded(field, len, line)?);
                }
            }
        }

        if let Some(governed) = descriptor.governed_by(index) {
            self.apply_count(descriptor, index, governed, record, line)?;
        }
        Ok(())
    }

    fn register_tag(
        &mut self,
        descriptor: &TypeDescriptor,
        field: &FieldDescriptor,
        record: &mut dyn Any,
        tag: usize,
        line: usize,
    ) -> Result<(), LoadError> {
        if tag > self.tags.len() + MAX_TAG_GAP {
            return Err(malformed(line, format!("tag t{tag} is out of sequence")));
        }
        let view = field
            .slot(record)
            .ok_or_else(|| mismatch(descriptor.name()))?
            .storage_view()
            .ok_or_else(|| malformed(line, format!("field '{}' cannot be tagged", field.name())))?;
        self.tagged.insert(view.id(), tag);
        self.tags.assign(tag, field.name(), view);
        self.summary.tags += 1;
        Ok(())
    }

    /// Re-captures the views of this record's tagged storage after its lines were applied.
    fn refresh_tags(&mut self, descriptor: &TypeDescriptor, record: &dyn Any) {
        if self.tagged.is_empty() {
            return;
        }
        for field in descriptor.fields().iter().filter(|f| f.flags().tag_target) {
            let Some(view) = field.slot(record).and_then(|slot| slot.storage_view()) else {
                continue;
            };
            if let Some(&tag) = self.tagged.get(&view.id()) {
                self.tags.refresh(tag, view);
            }
        }
    }

    /// Resizes the storage governed by the count field at `count_index`.
    fn apply_count(
        &mut self,
        descriptor: &TypeDescriptor,
        count_index: usize,
        governed: usize,
        record: &mut dyn Any,
        line: usize,
    ) -> Result<(), LoadError> {
        let count_field = &descriptor.fields()[count_index];
        let count = match count_field.slot(record) {
            Some(Slot::Values(values)) => values.as_count(),
            _ => None,
        }
        .ok_or_else(|| malformed(line, format!("'{}' is not a valid count", count_field.name())))?;

        let storage = &descriptor.fields()[governed];
        let count = self.bounded(storage, count, line)?;
        match storage.slot_mut(record).ok_or_else(|| mismatch(descriptor.name()))? {
            SlotMut::Values(values) => {
                values.resize(count);
            }
            SlotMut::Records(records) => {
                records.resize(count);
            }
            SlotMut::Pointers(table) => table.resize(count),
            SlotMut::References(references) => {
                references.resize(count);
            }
            SlotMut::Text(_) | SlotMut::Record(_) => {}
        }
        Ok(())
    }

    fn read_scalars(
        &mut self,
        field: &FieldDescriptor,
        values: &mut dyn ValueSlot,
        counted: bool,
        tokens: &[&str],
        line: usize,
    ) -> Result<(), LoadError> {
        let dimensions = field.dimensions();
        let (base, width, payload) = if dimensions.len() >= 2 {
            // outer indices come first, outermost leading
            let outer = dimensions.len() - 1;
            if tokens.len() < outer {
                return Err(malformed(line, format!("'{}' is missing its row index", field.name())));
            }
            let mut base = 0;
            let mut stride = dimensions[0];
            for (k, extent) in dimensions[1..].iter().enumerate() {
                let position = outer - 1 - k;
                let index = parse_index(tokens.get(position), line, "row index")?;
                if index >= *extent {
                    return self.recover(LoadWarning::IndexOutOfRange {
                        line,
                        field: field.name().to_string(),
                        index,
                        len: *extent,
                    });
                }
                base += index * stride;
                stride *= extent;
            }
            (base, dimensions[0], &tokens[outer..])
        } else {
            if field.is_growable() && !counted {
                values.resize(tokens.len());
            }
            (0, values.len(), tokens)
        };

        let mut kept = 0;
        for token in payload.iter().take(width) {
            let stored = values
                .decode(base + kept, token)
                .map_err(|source| LoadError::Codec { line, source })?;
            if !stored {
                break;
            }
            kept += 1;
        }
        if kept < payload.len() {
            self.recover(LoadWarning::ExtraValues {
                line,
                field: field.name().to_string(),
                kept,
                dropped: payload.len() - kept,
            })?;
        }
        Ok(())
    }

    fn read_text(
        &mut self,
        field: &FieldDescriptor,
        text: &mut dyn TextSlot,
        tokens: &[&str],
        line: usize,
    ) -> Result<(), LoadError> {
        let token = tokens
            .first()
            .ok_or_else(|| malformed(line, format!("'{}' is missing its length", field.name())))?;
        let declared =
            parse_text_length(token).map_err(|source| LoadError::Codec { line, source })?;

        let Some(declared) = declared else {
            text.set_text(None);
            return Ok(());
        };
        let raw = self.reader.next_line()?.ok_or_else(|| {
            malformed(line, format!("'{}' is missing its text line", field.name()))
        })?;
        self.summary.lines += 1;

        if raw.text.len() != declared {
            self.recover(LoadWarning::TextLengthMismatch {
                line: raw.number,
                field: field.name().to_string(),
                declared,
                actual: raw.text.len(),
            })?;
        }
        if !text.set_text(Some(&raw.text)) {
            self.recover(LoadWarning::TextTruncated {
                line: raw.number,
                field: field.name().to_string(),
            })?;
        }
        Ok(())
    }

    fn read_record_element(
        &mut self,
        field: &FieldDescriptor,
        records: &mut dyn RecordSlot,
        counted: bool,
        tokens: &[&str],
        line: usize,
    ) -> Result<(), LoadError> {
        let nested_type = nested_type(field, line)?;
        let element = parse_index(tokens.first(), line, "record index")?;

        if element >= records.len() {
            if field.is_growable() && !counted {
                records.resize(self.length_for(field, element, line)?);
            } else {
                self.recover(LoadWarning::IndexOutOfRange {
                    line,
                    field: field.name().to_string(),
                    index: element,
                    len: records.len(),
                })?;
                return self.discard_values(nested_type);
            }
        }

        let nested = records
            .record_mut(element)
            .ok_or_else(|| {
                malformed(line, format!("'{}' has no element {element}", field.name()))
            })?;
        self.read_nested_values(nested_type, nested)
    }

    fn read_pointee(
        &mut self,
        field: &FieldDescriptor,
        table: &mut dyn PointerSlot,
        counted: bool,
        tokens: &[&str],
        line: usize,
    ) -> Result<(), LoadError> {
        if let [token] = tokens {
            if let Some(len) = parse_marker(token, 'n') {
                // the count field, when there is one, already sized the table
                if !counted {
                    table.resize(self.bounded(field, len, line)?);
                }
                return Ok(());
            }
        }

        let position = parse_index(tokens.first(), line, "pointer index")?;
        let rest = &tokens[1..];

        if position >= table.len() {
            if !counted {
                table.resize(self.length_for(field, position, line)?);
            } else {
                self.recover(LoadWarning::IndexOutOfRange {
                    line,
                    field: field.name().to_string(),
                    index: position,
                    len: table.len(),
                })?;
                if let (Some(nested_type), false) = (field.nested_type_name(), rest.is_empty()) {
                    self.discard_values(nested_type)?;
                }
                return Ok(());
            }
        }

        table.allocate(position);
        match table.pointee_mut(position) {
            Some(SlotMut::Values(values)) => {
                values.resize(rest.len());
                for (i, token) in rest.iter().enumerate() {
                    values
                        .decode(i, token)
                        .map_err(|source| LoadError::Codec { line, source })?;
                }
                Ok(())
            }
            Some(SlotMut::Records(pool)) => {
                // a bare pointer index marks a live, empty pointee
                if rest.is_empty() {
                    return Ok(());
                }
                let nested_type = nested_type(field, line)?;
                let element = parse_index(rest.first(), line, "record index")?;
                if element >= pool.len() {
                    pool.resize(self.length_for(field, element, line)?);
                }
                let nested = pool.record_mut(element).ok_or_else(|| {
                    malformed(line, format!("'{}' has no element {element}", field.name()))
                })?;
                self.read_nested_values(nested_type, nested)
            }
            _ => Err(malformed(
                line,
                format!("pointer {position} of '{}' could not be allocated", field.name()),
            )),
        }
    }

    fn read_nested_values(
        &mut self,
        nested_type: &str,
        nested: &mut dyn Any,
    ) -> Result<(), LoadError> {
        if self.zero_fill {
            self.registry.reset_record(nested_type, nested)?;
        }
        self.read_values(nested_type, nested)
    }

    /// Consumes one nested record's value lines into a scratch instance.
    fn discard_values(&mut self, nested_type: &str) -> Result<(), LoadError> {
        let mut scratch = self.registry.new_record(nested_type)?;
        self.read_values(nested_type, scratch.as_mut())
    }

    //endregion

    //region Reference section

    fn read_references(&mut self, type_name: &str, record: &mut dyn Any) -> Result<(), LoadError> {
        let registry = self.registry;
        let descriptor = registry.describe_type(type_name)?;

        while let Some(line) = self.next_content_line()? {
            let (name, tokens) = line.split();
            let Some((_, field)) = self.field_for(descriptor, name, line.number)? else {
                continue;
            };
            let line = line.number;

            match field
                .slot_mut(record)
                .ok_or_else(|| mismatch(descriptor.name()))?
            {
                SlotMut::References(references) => {
                    self.read_link(field, references, &tokens, line)?
                }
                SlotMut::Record(nested) => {
                    let nested_type = nested_type(field, line)?;
                    if parse_index(tokens.first(), line, "record index")? == 0 {
                        self.read_references(nested_type, nested)?;
                    } else {
                        self.discard_references(nested_type)?;
                    }
                }
                SlotMut::Records(records) => {
                    let nested_type = nested_type(field, line)?;
                    let element = parse_index(tokens.first(), line, "record index")?;
                    match records.record_mut(element) {
                        Some(nested) => self.read_references(nested_type, nested)?,
                        None => {
                            let len = records.len();
                            self.recover(LoadWarning::IndexOutOfRange {
                                line,
                                field: field.name().to_string(),
                                index: element,
                                len,
                            })?;
                            self.discard_references(nested_type)?;
                        }
                    }
                }
                SlotMut::Pointers(table) => {
                    let nested_type = nested_type(field, line)?;
                    let position = parse_index(tokens.first(), line, "pointer index")?;
                    let element = parse_index(tokens.get(1), line, "record index")?;
                    let nested = match table.pointee_mut(position) {
                        Some(SlotMut::Records(pool)) => pool.record_mut(element),
                        _ => None,
                    };
                    match nested {
                        Some(nested) => self.read_references(nested_type, nested)?,
                        None => {
                            self.recover(LoadWarning::NullPointee {
                                line,
                                field: field.name().to_string(),
                                pointee: position,
                            })?;
                            self.discard_references(nested_type)?;
                        }
                    }
                }
                SlotMut::Values(_) | SlotMut::Text(_) => {
                    return Err(malformed(
                        line,
                        format!("field '{}' holds no references", field.name()),
                    ));
                }
            }
        }
        Ok(())
    }

    fn discard_references(&mut self, nested_type: &str) -> Result<(), LoadError> {
        let mut scratch = self.registry.new_record(nested_type)?;
        self.read_references(nested_type, scratch.as_mut())
    }

    /// Decodes `[slot] d<N> idx` or `[slot] i<N> [p] idx` and stores the link.
    fn read_link(
        &mut self,
        field: &FieldDescriptor,
        references: &mut dyn ReferenceSlot,
        tokens: &[&str],
        line: usize,
    ) -> Result<(), LoadError> {
        let (slot_index, rest) = if field.repeat_count() != 1 {
            (parse_index(tokens.first(), line, "reference slot")?, tokens.get(1..).unwrap_or(&[]))
        } else {
            (0, tokens)
        };
        let marker = rest
            .first()
            .ok_or_else(|| malformed(line, format!("'{}' is missing its tag", field.name())))?;

        let (link, warning) = if let Some(tag) = parse_marker(marker, 'd') {
            let element = match rest {
                [_, element] => parse_index(Some(element), line, "element index")?,
                _ => return Err(malformed(line, "direct references take one element index")),
            };
            self.direct_link(field, tag, element, line)?
        } else if let Some(tag) = parse_marker(marker, 'i') {
            let (position, element) = match rest {
                [_, element] => (0, parse_index(Some(element), line, "element index")?),
                [_, position, element] => (
                    parse_index(Some(position), line, "pointer index")?,
                    parse_index(Some(element), line, "element index")?,
                ),
                _ => return Err(malformed(line, "indirect references take [pointer] element")),
            };
            self.indirect_link(field, tag, position, element, line)?
        } else {
            return Err(malformed(line, format!("invalid reference tag '{marker}'")));
        };

        if let Some(warning) = warning {
            self.recover(warning)?;
        }
        if !references.set_link(slot_index, link) {
            let len = references.len();
            return self.recover(LoadWarning::IndexOutOfRange {
                line,
                field: field.name().to_string(),
                index: slot_index,
                len,
            });
        }
        if link.is_some() {
            self.summary.links += 1;
        }
        Ok(())
    }

    fn direct_link(
        &self,
        field: &FieldDescriptor,
        tag: usize,
        element: usize,
        line: usize,
    ) -> Result<(Option<Link>, Option<LoadWarning>), LoadError> {
        let entry = self
            .tags
            .get(tag)
            .ok_or_else(|| malformed(line, format!("tag d{tag} was never registered")))?;
        let StorageView::Direct { id, len } = entry.view else {
            return Err(malformed(
                line,
                format!("tag {tag} names a pointer table, not direct storage"),
            ));
        };
        if element < len {
            return Ok((Some(Link::new(id, element)), None));
        }
        let warning = LoadWarning::IndexOutOfRange {
            line,
            field: field.name().to_string(),
            index: element,
            len,
        };
        Ok(((len > 0).then(|| Link::new(id, 0)), Some(warning)))
    }

    fn indirect_link(
        &self,
        field: &FieldDescriptor,
        tag: usize,
        position: usize,
        element: usize,
        line: usize,
    ) -> Result<(Option<Link>, Option<LoadWarning>), LoadError> {
        let entry = self
            .tags
            .get(tag)
            .ok_or_else(|| malformed(line, format!("tag i{tag} was never registered")))?;
        let StorageView::Table { pointees, .. } = &entry.view else {
            return Err(malformed(
                line,
                format!("tag {tag} names direct storage, not a pointer table"),
            ));
        };
        let Some((id, len)) = pointees.get(position).copied().flatten() else {
            let warning = LoadWarning::NullPointee {
                line,
                field: field.name().to_string(),
                pointee: position,
            };
            return Ok((None, Some(warning)));
        };
        if element < len {
            return Ok((Some(Link::new(id, element)), None));
        }
        let warning = LoadWarning::PointeeTooSmall {
            line,
            field: field.name().to_string(),
            pointee: position,
            index: element,
            len,
        };
        Ok(((len > 0).then(|| Link::new(id, 0)), Some(warning)))
    }

    //endregion
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Strict".parse::<LoadPolicy>().unwrap(), LoadPolicy::Strict);
        assert_eq!(" lenient ".parse::<LoadPolicy>().unwrap(), LoadPolicy::Lenient);
        assert!("forgiving".parse::<LoadPolicy>().is_err());
        assert_eq!(LoadPolicy::default(), LoadPolicy::Lenient);
    }

    #[test]
    fn test_parse_index_reports_line() {
        let err = parse_index(Some(&"x"), 7, "record index").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 7, .. }));
        assert!(matches!(
            parse_index(None, 3, "record index"),
            Err(LoadError::Malformed { line: 3, .. })
        ));
    }
}
