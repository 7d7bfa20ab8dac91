//! Per-kind field schemas.
//!
//! Each [`SectionKind`] resolves to a fixed, ordered list of [`FieldSpec`]s
//! through [`schema_for`]. Schemas seed defaults on create and drive the
//! editor; they are not enforced on stored configs.

use serde::Serialize;

use super::catalog::SectionKind;
use super::models::{ConfigMap, ConfigValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Boolean,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldDefault {
    Text(&'static str),
    Bool(bool),
    Number(i64),
}

impl FieldDefault {
    pub fn to_value(self) -> ConfigValue {
        match self {
            Self::Text(s) => ConfigValue::Text(s.to_string()),
            Self::Bool(b) => ConfigValue::Bool(b),
            Self::Number(n) => ConfigValue::Integer(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: &'static str,
    pub default: FieldDefault,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

const fn text(name: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Text,
        label,
        default: FieldDefault::Text(default),
        min: None,
        max: None,
    }
}

const fn textarea(name: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Textarea,
        label,
        default: FieldDefault::Text(default),
        min: None,
        max: None,
    }
}

const fn boolean(name: &'static str, label: &'static str, default: bool) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Boolean,
        label,
        default: FieldDefault::Bool(default),
        min: None,
        max: None,
    }
}

const fn number(
    name: &'static str,
    label: &'static str,
    default: i64,
    min: i64,
    max: i64,
) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Number,
        label,
        default: FieldDefault::Number(default),
        min: Some(min),
        max: Some(max),
    }
}

const HERO: &[FieldSpec] = &[
    text("title", "Main Title", "Vietnam Student Marathon"),
    text("subtitle", "Subtitle", "Chạy chung kết Việt tương lai 2025"),
    text("backgroundImage", "Background Image URL", "/img/image1.jpg"),
    text("primaryButtonText", "Primary Button Text", "Tham gia sự kiện"),
    text("secondaryButtonText", "Secondary Button Text", "Xem video"),
    boolean("showAnimations", "Show Animations", true),
];

const ABOUT: &[FieldSpec] = &[
    text("title", "Section Title", "Về VSM"),
    textarea(
        "description",
        "Description",
        "Vietnam Student Marathon (VSM) là tổ chức phi lợi nhuận hàng đầu trong việc phát triển phong trào chạy bộ trong cộng đồng sinh viên Việt Nam.",
    ),
    text(
        "backgroundColor",
        "Background Color",
        "bg-gradient-to-b from-background to-muted/20",
    ),
];

const EVENTS: &[FieldSpec] = &[
    text("title", "Section Title", "Sự kiện sắp tới"),
    textarea(
        "description",
        "Description",
        "Tham gia các sự kiện chạy bộ hấp dẫn được tổ chức bởi VSM. Cùng nhau tạo nên những kỷ niệm đáng nhớ!",
    ),
    text("backgroundColor", "Background Color", "bg-muted/20"),
    boolean("showViewAllButton", "Show 'View All' Button", true),
];

const NEWS: &[FieldSpec] = &[
    text("title", "Section Title", "Tin tức mới nhất"),
    textarea(
        "description",
        "Description",
        "Cập nhật kiến thức và hoạt động mới nhất từ cộng đồng VSM.",
    ),
    number("postsPerRow", "Posts Per Row", 3, 1, 4),
    boolean("showViewAllButton", "Show 'View All' Button", true),
];

const TEAM: &[FieldSpec] = &[
    text("title", "Section Title", "Đội ngũ VSM"),
    textarea(
        "description",
        "Description",
        "Gặp gỡ những gương mặt tiêu biểu đồng hành cùng chúng tôi.",
    ),
    text("backgroundColor", "Background Color", "bg-muted/20"),
    number("membersPerRow", "Members Per Row", 4, 2, 6),
];

const GALLERY: &[FieldSpec] = &[
    text("title", "Section Title", "Khoảnh khắc đáng nhớ"),
    boolean("autoPlay", "Auto Play Slideshow", false),
    boolean("showControls", "Show Navigation Controls", true),
];

const CTA: &[FieldSpec] = &[
    text("title", "Section Title", "Sẵn sàng bứt phá?"),
    textarea(
        "description",
        "Description",
        "Đăng ký ngay để tham gia sự kiện chạy bộ cùng cộng đồng sinh viên trên toàn quốc!",
    ),
    text("buttonText", "Button Text", "Đăng ký ngay"),
    text(
        "backgroundColor",
        "Background Color",
        "bg-gradient-to-r from-primary/20 to-purple-500/20",
    ),
];

pub fn schema_for(kind: SectionKind) -> &'static [FieldSpec] {
    match kind {
        SectionKind::Hero => HERO,
        SectionKind::About => ABOUT,
        SectionKind::Events => EVENTS,
        SectionKind::News => NEWS,
        SectionKind::Team => TEAM,
        SectionKind::Gallery => GALLERY,
        SectionKind::Cta => CTA,
    }
}

pub fn field(kind: SectionKind, name: &str) -> Option<&'static FieldSpec> {
    schema_for(kind).iter().find(|spec| spec.name == name)
}

/// Every schema field of `kind` set to its default value.
pub fn defaults_for(kind: SectionKind) -> ConfigMap {
    schema_for(kind)
        .iter()
        .map(|spec| (spec.name.to_string(), spec.default.to_value()))
        .collect()
}

/// Schema defaults overlaid with `config`; saved values always win.
pub fn effective_config(kind: SectionKind, config: &ConfigMap) -> ConfigMap {
    let mut merged = defaults_for(kind);
    for (key, value) in config {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_title_field() {
        for kind in SectionKind::ALL {
            let spec = field(kind, "title").expect("title field");
            assert_eq!(spec.field_type, FieldType::Text);
        }
    }

    #[test]
    fn test_field_names_unique_within_schema() {
        for kind in SectionKind::ALL {
            let specs = schema_for(kind);
            for (i, a) in specs.iter().enumerate() {
                assert!(
                    specs[i + 1..].iter().all(|b| b.name != a.name),
                    "duplicate field {} in {}",
                    a.name,
                    kind
                );
            }
        }
    }

    #[test]
    fn test_number_defaults_within_bounds() {
        for kind in SectionKind::ALL {
            for spec in schema_for(kind) {
                if let FieldDefault::Number(n) = spec.default {
                    assert_eq!(spec.field_type, FieldType::Number);
                    assert!(spec.min.is_some_and(|min| n >= min));
                    assert!(spec.max.is_some_and(|max| n <= max));
                }
            }
        }
    }

    #[test]
    fn test_defaults_for_news() {
        let defaults = defaults_for(SectionKind::News);
        assert_eq!(defaults.len(), 4);
        assert_eq!(defaults["postsPerRow"], ConfigValue::Integer(3));
        assert_eq!(defaults["showViewAllButton"], ConfigValue::Bool(true));
    }

    #[test]
    fn test_effective_config_prefers_saved_values() {
        let mut saved = ConfigMap::new();
        saved.insert("autoPlay".into(), ConfigValue::Bool(true));
        saved.insert("customClasses".into(), ConfigValue::Text("mt-4".into()));
        let effective = effective_config(SectionKind::Gallery, &saved);
        assert_eq!(effective["autoPlay"], ConfigValue::Bool(true));
        assert_eq!(effective["showControls"], ConfigValue::Bool(true));
        assert_eq!(effective["customClasses"], ConfigValue::Text("mt-4".into()));
    }

    #[test]
    fn test_field_spec_serializes_type_and_default() {
        let spec = field(SectionKind::Team, "membersPerRow").unwrap();
        let value = serde_json::to_value(spec).unwrap();
        assert_eq!(value["type"], "number");
        assert_eq!(value["default"], 4);
        assert_eq!(value["min"], 2);
        assert_eq!(value["max"], 6);
    }
}
