//! Table model construction
//!
//! [`build_table_model`] walks a class descriptor in declaration order and
//! resolves every property into a [`FieldModel`]. All structural validation
//! happens here; a model that builds is safe to use for any record.
//!
//! # Rejected shapes
//!
//! | Problem | Error |
//! |---------|-------|
//! | No hash key, or more than one hash/range key | `InvalidSchema` |
//! | Two properties with the same attribute name | `InvalidSchema` |
//! | Getter without setter, or setter of another type | `InvalidSchema` |
//! | Key attribute not stored as S, N or B | `InvalidSchema` |
//! | Generation on an incompatible property | `InvalidSchema` |
//! | Unclassifiable declared type | `Classification` |
//! | Combination the schema has no rule for | `UnsupportedConversion` |
//! | Converter collaborator not supplied | `MissingDependency` |

use crate::config::MapperConfig;
use crate::field::FieldModel;
use crate::table::{IndexKeySchema, TableModel};
use std::collections::{BTreeMap, HashMap};
use strata_mapper_convert::PropertySignature;
use strata_mapper_core::{
    AttributeType, ClassDescriptor, DeclaredType, Generation, KeyRole, MapperError, Result,
};
use tracing::debug;

/// Build the table model for a described type under a configuration
pub fn build_table_model<T>(
    descriptor: ClassDescriptor<T>,
    config: &MapperConfig,
) -> Result<TableModel<T>> {
    let class = descriptor.name.clone();
    let table_name = config.table_name(descriptor.default_table_name());
    let converter = config.item_converter();

    let mut fields: Vec<FieldModel<T>> = Vec::with_capacity(descriptor.properties.len());
    let mut by_attribute: HashMap<String, usize> = HashMap::new();
    let mut hash_key: Option<usize> = None;
    let mut range_key: Option<usize> = None;

    for property in descriptor.properties {
        if property.metadata.ignored {
            continue;
        }

        let getter = match property.getter.clone() {
            Some(getter) => getter,
            // Write-only properties are not persisted.
            None => continue,
        };
        let setter = match (&property.setter, &property.setter_declared) {
            (Some(setter), Some(accepts)) if *accepts == property.declared => setter.clone(),
            (Some(_), accepts) => {
                return Err(MapperError::invalid_schema(
                    &class,
                    format!(
                        "setter of {} accepts {} but the getter returns {}",
                        property.name,
                        accepts
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "an undeclared type".to_string()),
                        property.declared
                    ),
                ))
            }
            (None, _) => {
                return Err(MapperError::invalid_schema(
                    &class,
                    format!("property {} has a getter but no setter", property.name),
                ))
            }
        };

        let attribute_name = property
            .metadata
            .attribute_name
            .clone()
            .unwrap_or_else(|| property.name.clone());
        if let Some(&existing) = by_attribute.get(&attribute_name) {
            return Err(MapperError::invalid_schema(
                &class,
                format!(
                    "properties {} and {} both map to attribute {:?}",
                    fields[existing].property, property.name, attribute_name
                ),
            ));
        }

        let marshaller = converter
            .marshaller(PropertySignature::from(&property))
            .map_err(|e| e.in_class(&class))?;
        let attribute_type = marshaller.attribute_type();

        let index = fields.len();
        match property.metadata.key {
            KeyRole::None => {}
            role => {
                let slot = if role == KeyRole::Hash {
                    &mut hash_key
                } else {
                    &mut range_key
                };
                if let Some(existing) = *slot {
                    return Err(MapperError::invalid_schema(
                        &class,
                        format!(
                            "more than one {:?} key: {} and {}",
                            role, fields[existing].property, property.name
                        ),
                    ));
                }
                require_key_type(&class, &property.name, attribute_type)?;
                *slot = Some(index);
            }
        }

        if let Some(generation) = property.metadata.generation {
            check_generation(&class, &property.name, &property.declared, attribute_type, generation)?;
        }

        for index_key in &property.metadata.indexes {
            require_key_type(&class, &property.name, attribute_type)?;
            if index_key.role == KeyRole::None {
                return Err(MapperError::invalid_schema(
                    &class,
                    format!(
                        "{} has no key role in index {}",
                        property.name, index_key.index
                    ),
                ));
            }
        }

        by_attribute.insert(attribute_name.clone(), index);
        fields.push(FieldModel {
            property: property.name,
            attribute_name,
            key_role: property.metadata.key,
            marshaller,
            getter,
            setter,
            generation: property.metadata.generation,
            indexes: property.metadata.indexes,
        });
    }

    let hash_key = hash_key
        .ok_or_else(|| MapperError::invalid_schema(&class, "no hash key property"))?;
    let index_keys = collect_index_keys(&class, &fields, hash_key)?;
    let by_property = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.property.clone(), i))
        .collect();

    debug!(
        target: "strata::mapper::model",
        class = %class,
        table = %table_name,
        schema = %config.conversion_schema(),
        fields = fields.len(),
        "Built table model"
    );

    Ok(TableModel {
        type_name: class,
        table_name,
        conversion_schema: config.conversion_schema(),
        fields,
        by_property,
        by_attribute,
        hash_key,
        range_key,
        index_keys,
    })
}

fn require_key_type(class: &str, property: &str, attribute_type: AttributeType) -> Result<()> {
    if attribute_type.is_key_type() {
        Ok(())
    } else {
        Err(MapperError::invalid_schema(
            class,
            format!(
                "key property {} is stored as {}; keys must be S, N or B",
                property, attribute_type
            ),
        ))
    }
}

fn check_generation(
    class: &str,
    property: &str,
    declared: &DeclaredType,
    attribute_type: AttributeType,
    generation: Generation,
) -> Result<()> {
    let ok = match generation {
        Generation::Uuid => {
            *declared == DeclaredType::String && attribute_type == AttributeType::String
        }
        Generation::CreatedTimestamp | Generation::UpdatedTimestamp => {
            *declared == DeclaredType::Date
        }
        Generation::Version => {
            *declared == DeclaredType::Integer && attribute_type == AttributeType::Number
        }
    };
    if ok {
        Ok(())
    } else {
        Err(MapperError::invalid_schema(
            class,
            format!(
                "{:?} generation cannot apply to {} ({} stored as {})",
                generation, property, declared, attribute_type
            ),
        ))
    }
}

fn collect_index_keys<T>(
    class: &str,
    fields: &[FieldModel<T>],
    hash_key: usize,
) -> Result<Vec<IndexKeySchema>> {
    let mut indexes: BTreeMap<&str, (Option<&str>, Option<&str>)> = BTreeMap::new();

    for field in fields {
        for key in &field.indexes {
            let entry = indexes.entry(key.index.as_str()).or_default();
            let slot = match key.role {
                KeyRole::Hash => &mut entry.0,
                _ => &mut entry.1,
            };
            if let Some(existing) = slot {
                return Err(MapperError::invalid_schema(
                    class,
                    format!(
                        "index {} has more than one {:?} key: {} and {}",
                        key.index, key.role, existing, field.attribute_name
                    ),
                ));
            }
            *slot = Some(field.attribute_name.as_str());
        }
    }

    Ok(indexes
        .into_iter()
        .map(|(index, (hash, range))| IndexKeySchema {
            index: index.to_string(),
            // Range-only indexes share the table's hash key.
            hash_key: hash
                .unwrap_or(fields[hash_key].attribute_name.as_str())
                .to_string(),
            range_key: range.map(str::to_string),
        })
        .collect())
}
