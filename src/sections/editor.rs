//! Section config editor.
//!
//! Loads the editable fields of one section (saved values over schema
//! defaults), coerces raw form input by field type, and saves edits as a
//! shallow merge into the stored config.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use super::catalog::SectionKind;
use super::db::SectionDb;
use super::models::{ConfigMap, ConfigValue, SectionInstance};
use super::schema::{self, FieldSpec, FieldType};
use crate::errors::SectionError;

/// Editor tab a field is shown under. A field can appear under several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldGroup {
    Content,
    Styling,
    Media,
}

impl FieldGroup {
    pub fn for_field(name: &str, field_type: FieldType) -> Vec<FieldGroup> {
        let lower = name.to_lowercase();
        let mut groups = Vec::new();
        if matches!(
            field_type,
            FieldType::Text | FieldType::Textarea | FieldType::Boolean
        ) {
            groups.push(Self::Content);
        }
        if lower.contains("background") || lower.contains("color") || field_type == FieldType::Number
        {
            groups.push(Self::Styling);
        }
        if lower.contains("image") || lower.contains("media") {
            groups.push(Self::Media);
        }
        groups
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorField {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub value: ConfigValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    pub groups: Vec<FieldGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub section_id: String,
    pub name: String,
    pub component: String,
    pub fields: Vec<EditorField>,
    /// Saved keys with no schema field (e.g. `customClasses`).
    pub extra: ConfigMap,
}

impl EditorView {
    /// Current value per schema field, keyed by field name.
    pub fn values(&self) -> BTreeMap<&'static str, &ConfigValue> {
        self.fields.iter().map(|f| (f.name, &f.value)).collect()
    }
}

/// Build the editor view for `section`: one entry per schema field, with the
/// saved value when present and the schema default otherwise.
pub fn load(section: &SectionInstance) -> Result<EditorView, SectionError> {
    let kind = SectionKind::from_str(&section.component)?;
    let specs = schema::schema_for(kind);

    let fields = specs
        .iter()
        .map(|spec| EditorField {
            name: spec.name,
            label: spec.label,
            field_type: spec.field_type,
            value: section
                .config
                .get(spec.name)
                .cloned()
                .unwrap_or_else(|| spec.default.to_value()),
            min: spec.min,
            max: spec.max,
            groups: FieldGroup::for_field(spec.name, spec.field_type),
        })
        .collect();

    let extra = section
        .config
        .iter()
        .filter(|(key, _)| specs.iter().all(|spec| spec.name != key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(EditorView {
        section_id: section.id.clone(),
        name: section.name.clone(),
        component: section.component.clone(),
        fields,
        extra,
    })
}

/// Coerce one raw form input according to the field's type.
///
/// Number fields must parse as an integer; empty or non-numeric input is
/// rejected instead of being stored as-is.
pub fn coerce_input(spec: &FieldSpec, raw: &str) -> Result<ConfigValue, SectionError> {
    match spec.field_type {
        FieldType::Text | FieldType::Textarea => Ok(ConfigValue::Text(raw.to_string())),
        FieldType::Boolean => parse_bool(raw)
            .map(ConfigValue::Bool)
            .ok_or_else(|| SectionError::malformed(spec.name, format!("'{}' is not a boolean", raw))),
        FieldType::Number => raw
            .trim()
            .parse::<i64>()
            .map(ConfigValue::Integer)
            .map_err(|_| SectionError::malformed(spec.name, format!("'{}' is not an integer", raw))),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Coerce a whole form. Schema fields are typed; other keys are kept as text.
pub fn coerce_form(
    kind: SectionKind,
    raw: &BTreeMap<String, String>,
) -> Result<ConfigMap, SectionError> {
    raw.iter()
        .map(|(key, value)| {
            let coerced = match schema::field(kind, key) {
                Some(spec) => coerce_input(spec, value)?,
                None => ConfigValue::Text(value.clone()),
            };
            Ok((key.clone(), coerced))
        })
        .collect()
}

/// Merge typed edits into the section's config. Keys not in `edits` are kept.
pub fn save(db: &SectionDb, id: &str, edits: ConfigMap) -> Result<ConfigMap, SectionError> {
    db.merge_config(id, edits)
}

/// Coerce raw form input against the section's schema, then save it.
pub fn save_form(
    db: &SectionDb,
    id: &str,
    raw: &BTreeMap<String, String>,
) -> Result<ConfigMap, SectionError> {
    let section = db
        .get_section(id)?
        .ok_or_else(|| SectionError::not_found(id))?;
    let kind = SectionKind::from_str(&section.component)?;
    let edits = coerce_form(kind, raw)?;
    save(db, id, edits)
}
