//! The extraction engine.
//!
//! [`Extractor::extract`] turns an [`Item`] into an [`OutputMap`]. A matching
//! transformer takes over the whole item; otherwise every exposed property
//! visible under the requested contexts goes through one ordered pipeline:
//!
//! 1. translation rules, first strict match wins
//! 2. date/time values, formatted with the field's date format
//! 3. collections, extracted element by element
//! 4. stringable fields
//! 5. flat fields, promoting a single value of the nested object
//! 6. nested objects, extracted into a sub-mapping
//! 7. scalars, copied as they are
//!
//! Each stage that applies is final for the field. Two properties with the
//! same output name overwrite each other: the later value wins and the key
//! keeps the position where it was first inserted.

use tracing::{debug, trace};

use crate::config::ExtractorConfig;
use crate::contexts::Contexts;
use crate::date_format;
use crate::descriptor::FieldDescriptor;
use crate::error::{ConfigurationError, ExtractionError};
use crate::schema::{Item, Property, TypeKey};
use crate::transformer::{Transformer, TransformerRegistry};
use crate::value::{FieldValue, OutputMap, Value};

/// Converts items into ordered output mappings.
///
/// An extractor is read-only once built and can be shared between threads.
///
/// # Example
///
/// ```ignore
/// let extractor = Extractor::new();
/// let output = extractor.extract(&user, "admin")?;
/// let listed = extractor.extract(&user, ["list", "admin"])?;
/// ```
#[derive(Debug, Default)]
pub struct Extractor {
    transformers: TransformerRegistry,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_transformers(mut self, transformers: TransformerRegistry) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn register_transformer(&mut self, transformer: impl Transformer + 'static) {
        self.transformers.register(Box::new(transformer));
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract `item` under the requested contexts.
    ///
    /// # Errors
    ///
    /// Fails with [`ExtractionError::Configuration`] when a field's metadata
    /// cannot handle its value, with [`ExtractionError::Transform`] when a
    /// transformer fails, and with [`ExtractionError::DepthExceeded`] when a
    /// configured depth limit is hit. Nothing is returned on failure.
    pub fn extract(
        &self,
        item: &dyn Item,
        contexts: impl Into<Contexts>,
    ) -> Result<OutputMap, ExtractionError> {
        let contexts = contexts.into();
        self.extract_item(item, &contexts, 0)
    }

    /// Extract `item` under the configured default context.
    pub fn extract_default(&self, item: &dyn Item) -> Result<OutputMap, ExtractionError> {
        self.extract(item, self.config.default_contexts())
    }

    /// Extract every item of a sequence, keeping its order.
    pub fn extract_all<'a, I, T>(
        &self,
        items: I,
        contexts: impl Into<Contexts>,
    ) -> Result<Vec<OutputMap>, ExtractionError>
    where
        I: IntoIterator<Item = &'a T>,
        T: Item + 'a,
    {
        let contexts = contexts.into();
        items
            .into_iter()
            .map(|item| self.extract_item(item, &contexts, 0))
            .collect()
    }

    fn extract_item(
        &self,
        item: &dyn Item,
        contexts: &Contexts,
        depth: usize,
    ) -> Result<OutputMap, ExtractionError> {
        let type_key = item.type_key();

        if let Some(max_depth) = self.config.max_depth {
            if depth > max_depth {
                return Err(ExtractionError::DepthExceeded { type_key, max_depth });
            }
        }

        if let Some(transformer) = self.transformers.find(type_key, contexts) {
            debug!(
                "Transformer '{}' handles {} under [{}]",
                transformer.name(),
                type_key,
                contexts
            );
            return Ok(transformer.process(item)?);
        }

        let mut output = OutputMap::new();

        for (index, property) in item.properties().iter().enumerate() {
            let field = match property.field() {
                Some(field) => field,
                None => continue,
            };

            if !field.is_visible_in(contexts) {
                trace!("Skipping {}.{}: not visible under [{}]", type_key, property.name(), contexts);
                continue;
            }

            let raw = read_raw(item, index, field)?;
            let value = self.process_field(type_key, property, field, raw, contexts, depth)?;
            output.insert(field.output_name().to_string(), value);
        }

        Ok(output)
    }

    fn process_field(
        &self,
        type_key: TypeKey,
        property: &Property,
        field: &FieldDescriptor,
        raw: Value<'_>,
        contexts: &Contexts,
        depth: usize,
    ) -> Result<FieldValue, ExtractionError> {
        if let Some(rule) = property.translations().iter().find(|rule| rule.matches(&raw)) {
            trace!("Translated {}.{} from {:?}", type_key, property.name(), raw);
            return Ok(rule.then().clone());
        }

        let value = match raw {
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) | Value::DateTimeTz(_) => {
                FieldValue::String(format_date(type_key, field, &raw)?)
            }
            Value::Collection(items) => {
                let mut list = Vec::with_capacity(items.len());
                for element in items {
                    list.push(FieldValue::Map(self.extract_item(element, contexts, depth + 1)?));
                }
                FieldValue::List(list)
            }
            other if field.is_stringable() => {
                let text = other.to_display_string().ok_or_else(|| {
                    ConfigurationError::NotStringable {
                        type_key,
                        field: field.output_name().to_string(),
                        kind: other.kind(),
                    }
                })?;
                FieldValue::String(text)
            }
            other if field.is_flat() => self.flatten(type_key, field, other, contexts, depth)?,
            Value::Object(nested) => FieldValue::Map(self.extract_item(nested, contexts, depth + 1)?),
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Int(i) => FieldValue::Int(i),
            Value::Float(f) => FieldValue::Float(f),
            Value::String(s) => FieldValue::String(s.into_owned()),
        };

        Ok(value)
    }

    fn flatten(
        &self,
        type_key: TypeKey,
        field: &FieldDescriptor,
        raw: Value<'_>,
        contexts: &Contexts,
        depth: usize,
    ) -> Result<FieldValue, ExtractionError> {
        let nested = match raw {
            Value::Null => return Ok(FieldValue::Null),
            Value::Object(nested) => nested,
            other => {
                return Err(ConfigurationError::NotAnObject {
                    type_key,
                    field: field.output_name().to_string(),
                    kind: other.kind(),
                }
                .into())
            }
        };

        let mut flattened = self.extract_item(nested, contexts, depth + 1)?;

        match flattened.len() {
            0 => Err(ConfigurationError::EmptyFlatten {
                type_key,
                field: field.output_name().to_string(),
                nested: nested.type_key(),
            }
            .into()),
            1 => Ok(flattened.into_values().next().unwrap_or(FieldValue::Null)),
            candidates => {
                let pick = field.flat_pick_key().ok_or_else(|| ConfigurationError::AmbiguousFlatten {
                    type_key,
                    field: field.output_name().to_string(),
                    candidates,
                })?;
                let value = flattened.swap_remove(pick).ok_or_else(|| {
                    ConfigurationError::FlatPickNotFound {
                        type_key,
                        field: field.output_name().to_string(),
                        pick: pick.to_string(),
                    }
                })?;
                Ok(value)
            }
        }
    }
}

fn read_raw<'a>(
    item: &'a dyn Item,
    index: usize,
    field: &FieldDescriptor,
) -> Result<Value<'a>, ConfigurationError> {
    match field.accessor_name() {
        Some(accessor) => item.invoke(accessor).ok_or_else(|| ConfigurationError::UnknownAccessor {
            type_key: item.type_key(),
            field: field.output_name().to_string(),
            accessor: accessor.to_string(),
        }),
        None => Ok(item.read(index)),
    }
}

fn format_date(
    type_key: TypeKey,
    field: &FieldDescriptor,
    raw: &Value<'_>,
) -> Result<String, ConfigurationError> {
    let pattern = field
        .date_format_str()
        .ok_or_else(|| ConfigurationError::MissingDateFormat {
            type_key,
            field: field.output_name().to_string(),
        })?;

    date_format::format_value(raw, pattern).map_err(|source| ConfigurationError::InvalidDateFormat {
        type_key,
        field: field.output_name().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Described, PropertyDef, Schema};
    use crate::transformer::{FnTransformer, TransformError, TypedTransformer};
    use chrono::NaiveDate;
    use std::sync::OnceLock;

    struct Country {
        code: String,
        name: String,
    }

    impl Described for Country {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Country>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder("Country")
                    .property(
                        PropertyDef::new("code", |c: &Country| Value::from(&c.code))
                            .field(FieldDescriptor::named("code")),
                    )
                    .property(
                        PropertyDef::new("name", |c: &Country| Value::from(&c.name))
                            .field(FieldDescriptor::named("name").contexts(["detail"])),
                    )
                    .stringify(|c: &Country| format!("{} ({})", c.name, c.code))
                    .build()
                    .unwrap()
            })
        }
    }

    struct Shipment {
        id: i64,
        status: i64,
        shipped: Option<NaiveDate>,
        origin: Country,
        destination: Option<Country>,
        waypoints: Vec<Country>,
        weight: f64,
    }

    impl Described for Shipment {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Shipment>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder("Shipment")
                    .accessor("label", |s: &Shipment| Value::from(format!("SHP-{:04}", s.id)))
                    .property(
                        PropertyDef::new("id", |s: &Shipment| Value::from(s.id))
                            .field(FieldDescriptor::named("id").contexts(["default", "detail"])),
                    )
                    .property(
                        PropertyDef::new("status", |s: &Shipment| Value::from(s.status))
                            .field(FieldDescriptor::named("status").stringable())
                            .translate(0, "pending")
                            .translate(1, "in transit")
                            .translate(1, "never reached"),
                    )
                    .property(
                        PropertyDef::new("shipped", |s: &Shipment| Value::from(s.shipped))
                            .field(FieldDescriptor::named("shipped").date_format("d.m.Y"))
                            .translate(FieldValue::Null, "not yet"),
                    )
                    .property(
                        PropertyDef::new("origin", |s: &Shipment| Value::object(&s.origin))
                            .field(FieldDescriptor::named("origin").flat()),
                    )
                    .property(
                        PropertyDef::new("destination", |s: &Shipment| {
                            Value::optional_object(s.destination.as_ref())
                        })
                        .field(FieldDescriptor::named("destination").contexts(["detail"])),
                    )
                    .property(
                        PropertyDef::new("waypoints", |s: &Shipment| Value::collection(&s.waypoints))
                            .field(FieldDescriptor::named("waypoints").contexts(["detail"])),
                    )
                    .property(
                        PropertyDef::new("weight", |s: &Shipment| Value::from(s.weight))
                            .field(FieldDescriptor::named("weight").contexts(["detail"])),
                    )
                    .property(
                        PropertyDef::new("label", |s: &Shipment| Value::from(s.id))
                            .field(FieldDescriptor::named("label").accessor("label")),
                    )
                    .build()
                    .unwrap()
            })
        }
    }

    fn country(code: &str, name: &str) -> Country {
        Country {
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    fn shipment() -> Shipment {
        Shipment {
            id: 7,
            status: 1,
            shipped: NaiveDate::from_ymd_opt(2024, 5, 17),
            origin: country("NZ", "New Zealand"),
            destination: Some(country("AU", "Australia")),
            waypoints: vec![country("FJ", "Fiji"), country("WS", "Samoa")],
            weight: 12.5,
        }
    }

    #[test]
    fn test_default_context_pipeline() {
        let output = Extractor::new().extract(&shipment(), "default").unwrap();

        let keys: Vec<&str> = output.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "status", "shipped", "origin", "label"]);
        assert_eq!(output["id"], FieldValue::Int(7));
        assert_eq!(output["status"], FieldValue::from("in transit"));
        assert_eq!(output["shipped"], FieldValue::from("17.05.2024"));
        assert_eq!(output["origin"], FieldValue::from("NZ"));
        assert_eq!(output["label"], FieldValue::from("SHP-0007"));
    }

    #[test]
    fn test_stringable_applies_without_translation_match() {
        let mut shipment = shipment();
        shipment.status = 5;

        let output = Extractor::new().extract(&shipment, "default").unwrap();
        assert_eq!(output["status"], FieldValue::from("5"));
    }

    #[test]
    fn test_translation_runs_before_date_check() {
        let mut shipment = shipment();
        shipment.shipped = None;

        let output = Extractor::new().extract(&shipment, "default").unwrap();
        assert_eq!(output["shipped"], FieldValue::from("not yet"));
    }

    #[test]
    fn test_detail_context_nests_objects_and_collections() {
        let output = Extractor::new().extract(&shipment(), "detail").unwrap();

        let keys: Vec<&str> = output.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "destination", "waypoints", "weight"]);

        let destination = output["destination"].as_map().unwrap();
        assert_eq!(destination.len(), 1);
        assert_eq!(destination["name"], FieldValue::from("Australia"));

        let waypoints = output["waypoints"].as_list().unwrap();
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0].as_map().unwrap()["name"], FieldValue::from("Fiji"));
        assert_eq!(waypoints[1].as_map().unwrap()["name"], FieldValue::from("Samoa"));
        assert_eq!(output["weight"], FieldValue::Float(12.5));
    }

    #[test]
    fn test_missing_nested_object_is_null() {
        let mut shipment = shipment();
        shipment.destination = None;

        let output = Extractor::new().extract(&shipment, "detail").unwrap();
        assert_eq!(output["destination"], FieldValue::Null);
    }

    #[test]
    fn test_flat_object_with_two_fields_needs_pick() {
        let err = Extractor::new()
            .extract(&shipment(), ["default", "detail"])
            .unwrap_err();

        assert_eq!(
            err.as_configuration(),
            Some(&ConfigurationError::AmbiguousFlatten {
                type_key: TypeKey::new("Shipment"),
                field: "origin".to_string(),
                candidates: 2,
            })
        );
    }

    #[test]
    fn test_transformer_short_circuits_nested_items() {
        let extractor = Extractor::new().with_transformers(
            TransformerRegistry::new().with(TypedTransformer::<Country>::new(|c| {
                let mut out = OutputMap::new();
                out.insert("iso".to_string(), FieldValue::from(c.code.to_lowercase()));
                out
            })),
        );

        let output = extractor.extract(&shipment(), "detail").unwrap();
        let waypoints = output["waypoints"].as_list().unwrap();
        assert_eq!(waypoints[0].as_map().unwrap()["iso"], FieldValue::from("fj"));
    }

    #[test]
    fn test_transformer_errors_propagate() {
        let mut extractor = Extractor::new();
        extractor.register_transformer(FnTransformer::new(
            "broken",
            |type_key: TypeKey, _contexts: &Contexts| type_key.as_str() == "Country",
            |_item: &dyn Item| Err(TransformError::ExecutionError("boom".to_string())),
        ));

        let err = extractor.extract(&shipment(), "default").unwrap_err();
        assert!(matches!(err, ExtractionError::Transform(_)));
    }

    #[test]
    fn test_stringable_object_uses_stringifier() {
        struct Wrapper {
            country: Country,
        }

        impl Described for Wrapper {
            fn schema() -> &'static Schema<Self> {
                static SCHEMA: OnceLock<Schema<Wrapper>> = OnceLock::new();
                SCHEMA.get_or_init(|| {
                    Schema::builder("Wrapper")
                        .property(
                            PropertyDef::new("country", |w: &Wrapper| Value::object(&w.country))
                                .field(FieldDescriptor::named("country").stringable()),
                        )
                        .build()
                        .unwrap()
                })
            }
        }

        let wrapper = Wrapper {
            country: country("NZ", "New Zealand"),
        };
        let output = Extractor::new().extract(&wrapper, "default").unwrap();
        assert_eq!(output["country"], FieldValue::from("New Zealand (NZ)"));
    }

    #[test]
    fn test_depth_limit() {
        let config = ExtractorConfig {
            max_depth: Some(1),
            ..ExtractorConfig::default()
        };
        let extractor = Extractor::new().with_config(config);

        assert!(extractor.extract(&shipment(), "detail").is_ok());

        let outer = Outer {
            inner: Middle {
                leaf: country("NZ", "New Zealand"),
            },
        };
        let err = extractor.extract(&outer, "default").unwrap_err();
        assert_eq!(
            err,
            ExtractionError::DepthExceeded {
                type_key: TypeKey::new("Country"),
                max_depth: 1,
            }
        );
    }

    struct Middle {
        leaf: Country,
    }

    impl Described for Middle {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Middle>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder("Middle")
                    .property(
                        PropertyDef::new("leaf", |m: &Middle| Value::object(&m.leaf))
                            .field(FieldDescriptor::named("leaf")),
                    )
                    .build()
                    .unwrap()
            })
        }
    }

    struct Outer {
        inner: Middle,
    }

    impl Described for Outer {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Outer>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder("Outer")
                    .property(
                        PropertyDef::new("inner", |o: &Outer| Value::object(&o.inner))
                            .field(FieldDescriptor::named("inner")),
                    )
                    .build()
                    .unwrap()
            })
        }
    }

    #[test]
    fn test_extract_default_uses_configured_context() {
        let config = ExtractorConfig {
            default_context: "detail".to_string(),
            ..ExtractorConfig::default()
        };
        let output = Extractor::new()
            .with_config(config)
            .extract_default(&shipment())
            .unwrap();

        assert!(output.contains_key("weight"));
        assert!(!output.contains_key("status"));
    }

    #[test]
    fn test_extract_all_keeps_order() {
        let countries = vec![country("NZ", "New Zealand"), country("AU", "Australia")];
        let rows = Extractor::new().extract_all(&countries, "default").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["code"], FieldValue::from("NZ"));
        assert_eq!(rows[1]["code"], FieldValue::from("AU"));
    }
}
