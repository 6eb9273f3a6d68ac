//! # Objectable: Metadata-Driven Object Extraction
//!
//! Objectable turns in-memory objects into ordered key-value mappings ready
//! for serialization. What ends up in the output is driven by per-field
//! metadata declared once per type, not by hand-written conversion code.
//!
//! ## Features
//!
//! - **Field descriptors**: output name, visibility contexts, date format, stringable and flat flags
//! - **Contexts**: one object, several views (`"list"`, `"detail"`, `"admin"`, ...)
//! - **Translation rules**: replace raw values such as status codes with display values
//! - **Transformers**: hand-written extraction that takes over a type for some contexts
//! - **Ordered output**: keys keep declaration order through to the serialized JSON
//!
//! ## Example
//!
//! ```
//! use std::sync::OnceLock;
//! use objectable::{Described, Extractor, FieldDescriptor, FieldValue, PropertyDef, Schema, Value};
//!
//! struct User {
//!     id: i64,
//!     email: String,
//!     active: bool,
//! }
//!
//! impl Described for User {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: OnceLock<Schema<User>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::builder("User")
//!                 .property(
//!                     PropertyDef::new("id", |u: &User| Value::from(u.id))
//!                         .field(FieldDescriptor::new().contexts(["list", "admin"])),
//!                 )
//!                 .property(
//!                     PropertyDef::new("email", |u: &User| Value::from(&u.email))
//!                         .field(FieldDescriptor::new().contexts(["admin"])),
//!                 )
//!                 .property(
//!                     PropertyDef::new("active", |u: &User| Value::from(u.active))
//!                         .field(FieldDescriptor::named("status").contexts(["list"]))
//!                         .translate(true, "enabled")
//!                         .translate(false, "disabled"),
//!                 )
//!                 .build()
//!                 .expect("User schema is valid")
//!         })
//!     }
//! }
//!
//! let user = User { id: 3, email: "ada@example.com".to_string(), active: true };
//! let output = Extractor::new().extract(&user, "list").unwrap();
//!
//! assert_eq!(output["id"], FieldValue::Int(3));
//! assert_eq!(output["status"], FieldValue::from("enabled"));
//! assert!(!output.contains_key("email"));
//! ```

// Metadata
pub mod contexts;
pub mod descriptor;
pub mod schema;

// Values flowing through the engine
pub mod value;
pub mod date_format;

// Extraction
pub mod engine;
pub mod error;
pub mod transformer;

// Configuration and output
pub mod config;
pub mod serialization;

// Re-export key types
pub use contexts::{Contexts, DEFAULT_CONTEXT};
pub use descriptor::{FieldDescriptor, Translation};
pub use schema::{Described, Item, Property, PropertyDef, ReadFn, Schema, SchemaBuilder, SchemaError, TypeKey};
pub use value::{FieldValue, OutputMap, Value};
pub use date_format::DateFormatError;

pub use engine::Extractor;
pub use error::{ConfigurationError, ExtractionError};
pub use transformer::{FnTransformer, TransformError, Transformer, TransformerRegistry, TypedTransformer};

pub use config::{ConfigError, ExtractorConfig};
pub use serialization::{
    to_json_pretty, to_json_string, to_json_value, JsonArrayWriter, NdjsonWriter, SerializationError,
};

// Case conventions accepted by `SchemaBuilder::rename_all`
pub use convert_case::Case;
