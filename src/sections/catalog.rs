use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SectionError;

/// Every section kind the homepage knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    #[serde(rename = "HeroSection")]
    Hero,
    #[serde(rename = "AboutSection")]
    About,
    #[serde(rename = "EventsSection")]
    Events,
    #[serde(rename = "NewsSection")]
    News,
    #[serde(rename = "TeamSection")]
    Team,
    #[serde(rename = "GallerySection")]
    Gallery,
    #[serde(rename = "CTASection")]
    Cta,
}

impl SectionKind {
    /// Catalog order, also the order of the default homepage.
    pub const ALL: [SectionKind; 7] = [
        Self::Hero,
        Self::About,
        Self::Events,
        Self::News,
        Self::Team,
        Self::Gallery,
        Self::Cta,
    ];

    /// The component reference persisted in `SectionInstance::component`.
    pub fn component_ref(&self) -> &'static str {
        match self {
            Self::Hero => "HeroSection",
            Self::About => "AboutSection",
            Self::Events => "EventsSection",
            Self::News => "NewsSection",
            Self::Team => "TeamSection",
            Self::Gallery => "GallerySection",
            Self::Cta => "CTASection",
        }
    }

    pub fn catalog_id(&self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::About => "about",
            Self::Events => "events",
            Self::News => "news",
            Self::Team => "team",
            Self::Gallery => "gallery",
            Self::Cta => "cta",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Hero => "Hero Section",
            Self::About => "About Section",
            Self::Events => "Events Section",
            Self::News => "News Section",
            Self::Team => "Team Section",
            Self::Gallery => "Gallery Section",
            Self::Cta => "CTA Section",
        }
    }

    pub fn definition(&self) -> SectionDefinition {
        SectionDefinition {
            id: self.catalog_id(),
            display_name: self.display_name(),
            component_ref: self.component_ref(),
        }
    }

    /// Resolve a persisted component reference, `None` if the catalog has no such kind.
    pub fn from_component(component: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.component_ref() == component)
    }

    pub fn from_catalog_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.catalog_id() == id)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.component_ref())
    }
}

impl FromStr for SectionKind {
    type Err = SectionError;

    /// Accepts either the component reference (`HeroSection`) or the catalog id (`hero`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_component(s)
            .or_else(|| Self::from_catalog_id(s))
            .ok_or_else(|| SectionError::UnknownComponent {
                component: s.to_string(),
            })
    }
}

/// Static catalog entry describing one addable section kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDefinition {
    pub id: &'static str,
    pub display_name: &'static str,
    pub component_ref: &'static str,
}

pub fn catalog() -> Vec<SectionDefinition> {
    SectionKind::ALL.iter().map(SectionKind::definition).collect()
}
