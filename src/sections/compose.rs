//! Section composition engine.
//!
//! Takes the stored section list, keeps the enabled entries in order and
//! renders each through the renderer registered for its component reference.
//! A section whose component has no renderer is skipped, never fatal.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;
use tracing::warn;

use super::catalog::SectionKind;
use super::models::{ConfigMap, ConfigValue, SectionInstance};
use super::schema;

/// Renders one section kind to an HTML fragment.
pub trait SectionRenderer: Send + Sync {
    fn render(&self, section: &SectionInstance, config: &ConfigMap) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBlock {
    pub section_id: String,
    pub component: String,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedPage {
    pub blocks: Vec<RenderedBlock>,
    /// Ids of enabled sections that had no renderer.
    pub skipped: Vec<String>,
}

impl ComposedPage {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn to_html(&self) -> String {
        let mut body = String::from("<main>\n");
        for block in &self.blocks {
            body.push_str(&block.html);
            body.push('\n');
        }
        body.push_str("</main>");
        body
    }

    /// Full standalone document around [`ComposedPage::to_html`].
    pub fn to_document(&self, title: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"vi\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            escape_html(title),
            self.to_html()
        )
    }
}

pub struct RendererRegistry {
    renderers: HashMap<String, Box<dyn SectionRenderer>>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RendererRegistry {
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registry with an HTML renderer for every catalog kind.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for kind in SectionKind::ALL {
            registry.register(kind.component_ref(), BuiltinRenderer { kind });
        }
        registry
    }

    pub fn register<R: SectionRenderer + 'static>(&mut self, component: &str, renderer: R) {
        self.renderers
            .insert(component.to_string(), Box::new(renderer));
    }

    pub fn get(&self, component: &str) -> Option<&dyn SectionRenderer> {
        self.renderers.get(component).map(|r| r.as_ref())
    }

    /// Render the enabled sections in `order` sequence (ties keep input order).
    pub fn compose(&self, sections: &[SectionInstance]) -> ComposedPage {
        let mut enabled: Vec<&SectionInstance> = sections.iter().filter(|s| s.enabled).collect();
        enabled.sort_by_key(|s| s.order);

        let mut page = ComposedPage::default();
        for section in enabled {
            let Some(renderer) = self.get(&section.component) else {
                warn!(
                    section_id = %section.id,
                    component = %section.component,
                    "no renderer for component, skipping section"
                );
                page.skipped.push(section.id.clone());
                continue;
            };
            let config = match SectionKind::from_component(&section.component) {
                Some(kind) => schema::effective_config(kind, &section.config),
                None => section.config.clone(),
            };
            page.blocks.push(RenderedBlock {
                section_id: section.id.clone(),
                component: section.component.clone(),
                html: renderer.render(section, &config),
            });
        }
        page
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn text<'a>(config: &'a ConfigMap, key: &str) -> &'a str {
    config.get(key).and_then(ConfigValue::as_str).unwrap_or("")
}

fn flag(config: &ConfigMap, key: &str) -> bool {
    config.get(key).and_then(ConfigValue::as_bool).unwrap_or(false)
}

fn number(config: &ConfigMap, key: &str) -> Option<i64> {
    config.get(key).and_then(ConfigValue::as_i64)
}

/// Plain HTML rendering of the catalog kinds.
struct BuiltinRenderer {
    kind: SectionKind,
}

impl SectionRenderer for BuiltinRenderer {
    fn render(&self, section: &SectionInstance, config: &ConfigMap) -> String {
        let mut classes = vec![format!("section section-{}", self.kind.catalog_id())];
        for key in ["backgroundColor", "customClasses"] {
            let value = text(config, key);
            if !value.is_empty() {
                classes.push(value.to_string());
            }
        }

        let mut html = String::new();
        let _ = write!(
            html,
            "<section id=\"{}\" class=\"{}\" data-component=\"{}\"",
            escape_html(&section.id),
            escape_html(&classes.join(" ")),
            self.kind.component_ref()
        );
        if self.kind == SectionKind::Hero {
            let image = text(config, "backgroundImage");
            if !image.is_empty() {
                let _ = write!(
                    html,
                    " style=\"background-image: url('{}')\"",
                    escape_html(image)
                );
            }
            if flag(config, "showAnimations") {
                html.push_str(" data-animate=\"true\"");
            }
        }
        html.push('>');

        let title = text(config, "title");
        let heading = if self.kind == SectionKind::Hero { "h1" } else { "h2" };
        let _ = write!(html, "<{heading}>{}</{heading}>", escape_html(title));

        match self.kind {
            SectionKind::Hero => {
                let _ = write!(html, "<p class=\"subtitle\">{}</p>", escape_html(text(config, "subtitle")));
                for key in ["primaryButtonText", "secondaryButtonText"] {
                    let label = text(config, key);
                    if !label.is_empty() {
                        let _ = write!(html, "<a class=\"button\">{}</a>", escape_html(label));
                    }
                }
            }
            SectionKind::About => {
                let _ = write!(html, "<p>{}</p>", escape_html(text(config, "description")));
            }
            SectionKind::Events => {
                let _ = write!(html, "<p>{}</p>", escape_html(text(config, "description")));
                html.push_str("<div class=\"grid\"></div>");
                push_view_all(&mut html, config, "/events");
            }
            SectionKind::News => {
                let _ = write!(html, "<p>{}</p>", escape_html(text(config, "description")));
                let per_row = number(config, "postsPerRow").unwrap_or(3);
                let _ = write!(html, "<div class=\"grid\" data-columns=\"{}\"></div>", per_row);
                push_view_all(&mut html, config, "/news");
            }
            SectionKind::Team => {
                let _ = write!(html, "<p>{}</p>", escape_html(text(config, "description")));
                let per_row = number(config, "membersPerRow").unwrap_or(4);
                let _ = write!(html, "<div class=\"grid\" data-columns=\"{}\"></div>", per_row);
            }
            SectionKind::Gallery => {
                let _ = write!(
                    html,
                    "<div class=\"carousel\" data-autoplay=\"{}\" data-controls=\"{}\"></div>",
                    flag(config, "autoPlay"),
                    flag(config, "showControls")
                );
            }
            SectionKind::Cta => {
                let _ = write!(html, "<p>{}</p>", escape_html(text(config, "description")));
                let _ = write!(
                    html,
                    "<a class=\"button\" href=\"/events\">{}</a>",
                    escape_html(text(config, "buttonText"))
                );
            }
        }

        html.push_str("</section>");
        html
    }
}

fn push_view_all(html: &mut String, config: &ConfigMap, target: &str) {
    if flag(config, "showViewAllButton") {
        let _ = write!(html, "<a class=\"button\" href=\"{}\">Xem tất cả</a>", target);
    }
}
