// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Type registry
//!
//! Record types describe themselves through [`Described`]; a [`SchemaRegistry`] collects
//! the resulting [`TypeDescriptor`]s and answers lookups by type name. Serializers only
//! depend on the [`TypeRegistry`] trait, so an application can plug in its own lookup.

use crate::descriptor::FieldDescriptor;
use crate::SchemaError;
use ahash::AHashMap;
use std::any::Any;
use std::fmt::{Debug, Formatter};

/// Suffix of the integer field holding a growable sibling's element count.
pub const COUNT_SUFFIX: &str = "_count";

/// A record type with runtime metadata.
///
/// # Example
/// ```
/// use neurograph_schema::{Described, FieldDescriptor, SchemaRegistry, TypeRegistry};
///
/// #[derive(Default)]
/// struct Soma {
///     potential: f64,
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
/// let mut registry = SchemaRegistry::new();
/// registry.register::<Soma>().unwrap();
/// assert_eq!(registry.describe_field("Soma", "potential").unwrap().name(), "potential");
/// assert!(registry.describe_field("Soma", "axon").is_err());
/// ```
pub trait Described: Any + Default {
    const TYPE_NAME: &'static str;

    /// Fields in serialization order.
    fn describe() -> Vec<FieldDescriptor>;
}

/// Ordered field list of one record type plus the means to create and reset instances.
pub struct TypeDescriptor {
    name: &'static str,
    fields: Vec<FieldDescriptor>,
    by_name: AHashMap<String, usize>,
    // field index -> index of its `_count` sibling
    count_fields: Vec<Option<usize>>,
    // count field index -> index of the storage it governs
    governed_fields: Vec<Option<usize>>,
    create: fn() -> Box<dyn Any>,
    reset: fn(&mut dyn Any) -> bool,
}

fn create_record<R: Described>() -> Box<dyn Any> {
    Box::new(R::default())
}

fn reset_record<R: Described>(record: &mut dyn Any) -> bool {
    match record.downcast_mut::<R>() {
        Some(record) => {
            *record = R::default();
            true
        }
        None => false,
    }
}

impl TypeDescriptor {
    /// Builds and validates the descriptor of `R`.
    pub fn of<R: Described>() -> Result<Self, SchemaError> {
        let name = R::TYPE_NAME;
        let fields = R::describe();
        let invalid = |field: &str, reason: &str| SchemaError::InvalidDescriptor {
            type_name: name.to_string(),
            field: field.to_string(),
            reason: reason.to_string(),
        };

        let mut by_name = AHashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if field.name().is_empty() || field.name().contains(char::is_whitespace) {
                return Err(invalid(field.name(), "field names must be non-empty single tokens"));
            }
            if by_name.insert(field.name().to_string(), index).is_some() {
                return Err(invalid(field.name(), "duplicate field name"));
            }
            if field.flags().tag_target && !field.is_growable() {
                return Err(invalid(
                    field.name(),
                    "only growable storage (buffer, pool or pointer table) can be a tag target",
                ));
            }
        }

        let mut count_fields = vec![None; fields.len()];
        let mut governed_fields = vec![None; fields.len()];
        for (count_index, count) in fields.iter().enumerate() {
            let Some(base) = count.name().strip_suffix(COUNT_SUFFIX) else {
                continue;
            };
            let Some(&storage_index) = by_name.get(base) else {
                continue;
            };
            if !fields[storage_index].is_growable() {
                continue;
            }
            if !count.is_count_candidate() {
                return Err(invalid(count.name(), "count fields must be a single integer"));
            }
            if count_index > storage_index {
                return Err(invalid(
                    count.name(),
                    "count fields must precede the storage they size",
                ));
            }
            count_fields[storage_index] = Some(count_index);
            governed_fields[count_index] = Some(storage_index);
        }

        Ok(Self {
            name,
            fields,
            by_name,
            count_fields,
            governed_fields,
            create: create_record::<R>,
            reset: reset_record::<R>,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, field_name: &str) -> Option<&FieldDescriptor> {
        self.field_index(field_name).map(|index| &self.fields[index])
    }

    pub fn field_index(&self, field_name: &str) -> Option<usize> {
        self.by_name.get(field_name).copied()
    }

    /// Index of the `_count` field sizing field `index`, if any.
    pub fn count_field_of(&self, index: usize) -> Option<usize> {
        self.count_fields.get(index).copied().flatten()
    }

    /// Index of the storage field sized by the count field at `index`, if any.
    pub fn governed_by(&self, index: usize) -> Option<usize> {
        self.governed_fields.get(index).copied().flatten()
    }

    pub fn new_record(&self) -> Box<dyn Any> {
        (self.create)()
    }

    /// Replaces `record` with a default instance. Fails when `record` is another type.
    pub fn reset_record(&self, record: &mut dyn Any) -> Result<(), SchemaError> {
        if (self.reset)(record) {
            Ok(())
        } else {
            Err(SchemaError::TypeMismatch(self.name.to_string()))
        }
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Metadata lookup used by the serializers.
pub trait TypeRegistry {
    fn describe_type(&self, type_name: &str) -> Result<&TypeDescriptor, SchemaError>;

    fn describe_field(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> Result<&FieldDescriptor, SchemaError> {
        self.describe_type(type_name)?
            .field(field_name)
            .ok_or_else(|| SchemaError::UnknownField {
                type_name: type_name.to_string(),
                field: field_name.to_string(),
            })
    }

    fn new_record(&self, type_name: &str) -> Result<Box<dyn Any>, SchemaError> {
        Ok(self.describe_type(type_name)?.new_record())
    }

    fn reset_record(&self, type_name: &str, record: &mut dyn Any) -> Result<(), SchemaError> {
        self.describe_type(type_name)?.reset_record(record)
    }
}

/// Registry populated from [`Described`] types.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: AHashMap<&'static str, TypeDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: Described>(&mut self) -> Result<(), SchemaError> {
        if self.types.contains_key(R::TYPE_NAME) {
            return Err(SchemaError::DuplicateType(R::TYPE_NAME.to_string()));
        }
        let descriptor = TypeDescriptor::of::<R>()?;
        self.types.insert(R::TYPE_NAME, descriptor);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<R: Described>(mut self) -> Result<Self, SchemaError> {
        self.register::<R>()?;
        Ok(self)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Checks that every nested record type named by a registered field is registered too.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for descriptor in self.types.values() {
            for field in descriptor.fields() {
                if let Some(nested) = field.nested_type_name() {
                    if !self.contains(nested) {
                        return Err(SchemaError::UnknownType(nested.to_string()));
                    }
                }
            }
        }
        Ok(())
    }
}

impl TypeRegistry for SchemaRegistry {
    fn describe_type(&self, type_name: &str) -> Result<&TypeDescriptor, SchemaError> {
        self.types
            .get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Buffer, Pool};

    #[derive(Default)]
    struct Axon {
        segments_count: i32,
        segments: Buffer<f64>,
    }

    impl Described for Axon {
        const TYPE_NAME: &'static str = "Axon";

        fn describe() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::values(
                    "segments_count",
                    |a: &Axon| &a.segments_count,
                    |a: &mut Axon| &mut a.segments_count,
                ),
                FieldDescriptor::values(
                    "segments",
                    |a: &Axon| &a.segments,
                    |a: &mut Axon| &mut a.segments,
                ),
            ]
        }
    }

    #[derive(Default)]
    struct LateCount {
        items: Buffer<f64>,
        items_count: i32,
    }

    impl Described for LateCount {
        const TYPE_NAME: &'static str = "LateCount";

        fn describe() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::values(
                    "items",
                    |r: &LateCount| &r.items,
                    |r: &mut LateCount| &mut r.items,
                ),
                FieldDescriptor::values(
                    "items_count",
                    |r: &LateCount| &r.items_count,
                    |r: &mut LateCount| &mut r.items_count,
                ),
            ]
        }
    }

    #[derive(Default)]
    struct FixedTarget {
        gain: f64,
    }

    impl Described for FixedTarget {
        const TYPE_NAME: &'static str = "FixedTarget";

        fn describe() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::values(
                "gain",
                |r: &FixedTarget| &r.gain,
                |r: &mut FixedTarget| &mut r.gain,
            )
            .tag_target()]
        }
    }

    #[derive(Default)]
    struct Bundle {
        axons: Pool<Axon>,
    }

    impl Described for Bundle {
        const TYPE_NAME: &'static str = "Bundle";

        fn describe() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::records(
                "axons",
                |b: &Bundle| &b.axons,
                |b: &mut Bundle| &mut b.axons,
            )]
        }
    }

    #[test]
    fn test_count_sibling_is_linked() {
        let descriptor = TypeDescriptor::of::<Axon>().unwrap();
        assert_eq!(descriptor.count_field_of(1), Some(0));
        assert_eq!(descriptor.governed_by(0), Some(1));
        assert_eq!(descriptor.count_field_of(0), None);
    }

    #[test]
    fn test_count_after_storage_is_rejected() {
        let err = TypeDescriptor::of::<LateCount>().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidDescriptor { ref field, .. } if field == "items_count"
        ));
    }

    #[test]
    fn test_tag_target_requires_growable_storage() {
        assert!(TypeDescriptor::of::<FixedTarget>().is_err());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Axon>().unwrap();
        assert_eq!(
            registry.register::<Axon>(),
            Err(SchemaError::DuplicateType("Axon".into()))
        );
    }

    #[test]
    fn test_validate_reports_missing_nested_type() {
        let registry = SchemaRegistry::new().with::<Bundle>().unwrap();
        assert_eq!(registry.validate(), Err(SchemaError::UnknownType("Axon".into())));
        let registry = registry.with::<Axon>().unwrap();
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_reset_record_checks_type() {
        let registry = SchemaRegistry::new().with::<Axon>().unwrap();
        let mut axon = Axon {
            segments_count: 2,
            segments: Buffer::from(vec![1.0, 2.0]),
        };
        registry.reset_record("Axon", &mut axon).unwrap();
        assert_eq!(axon.segments_count, 0);
        assert!(axon.segments.is_empty());

        let mut other = Bundle::default();
        assert!(registry.reset_record("Axon", &mut other).is_err());
    }
}
