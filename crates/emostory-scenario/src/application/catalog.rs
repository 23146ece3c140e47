//! Scenario catalogs.
//!
//! The built-in catalog ships the stock scenarios. Additional content can be
//! loaded from YAML; stories may use light markdown, which is flattened to
//! plain narration text on load.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use emostory_core::error::CollaboratorError;
use pulldown_cmark::{Event, Parser, TagEnd};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use crate::domain::scenario::{Choice, Difficulty, Scenario, ScenarioValidationError};

/// Read-only scenario lookup.
pub trait ScenarioCatalog: Send + Sync {
    /// Retrieves a scenario by id.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::NotFound` if no scenario has that id.
    fn get_scenario(&self, scenario_id: &str) -> Result<Arc<Scenario>, CollaboratorError>;

    /// All scenarios, ordered by id.
    fn list_scenarios(&self) -> Vec<Arc<Scenario>>;
}

/// Errors raised while loading scenario content.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read scenario file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid scenario: {0}")]
    Invalid(#[from] ScenarioValidationError),

    #[error("duplicate scenario id: {0}")]
    DuplicateScenario(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    scenarios: Vec<Scenario>,
}

/// A catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    scenarios: BTreeMap<String, Arc<Scenario>>,
    content_hash: Option<String>,
}

impl InMemoryCatalog {
    /// Builds a catalog, validating each scenario.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` for a malformed scenario and
    /// `CatalogError::DuplicateScenario` when two share an id.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for scenario in scenarios {
            catalog.insert(scenario)?;
        }
        Ok(catalog)
    }

    /// The stock scenarios.
    #[must_use]
    pub fn built_in() -> Self {
        let scenarios = built_in_scenarios()
            .into_iter()
            .map(|s| (s.id.clone(), Arc::new(s)))
            .collect();
        Self {
            scenarios,
            content_hash: None,
        }
    }

    /// Parses a YAML document with a top-level `scenarios:` list.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed YAML, plus the errors of
    /// [`InMemoryCatalog::new`].
    pub fn from_yaml_str(source: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(source)?;
        let scenarios = file
            .scenarios
            .into_iter()
            .map(|mut scenario| {
                scenario.story = plain_narration(&scenario.story);
                for choice in &mut scenario.choices {
                    choice.text = plain_narration(&choice.text);
                }
                scenario
            })
            .collect();
        let mut catalog = Self::new(scenarios)?;
        let hash = format!("{:x}", Sha256::digest(source.as_bytes()));
        info!(
            scenarios = catalog.scenarios.len(),
            content_hash = %hash,
            "scenario catalog loaded"
        );
        catalog.content_hash = Some(hash);
        Ok(catalog)
    }

    /// Reads and parses a YAML catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, plus the errors
    /// of [`InMemoryCatalog::from_yaml_str`].
    pub fn from_yaml_file(path: &Path) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    /// Adds the scenarios of `other`, rejecting id collisions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateScenario` on a collision.
    pub fn merge(mut self, other: InMemoryCatalog) -> Result<Self, CatalogError> {
        for (id, scenario) in other.scenarios {
            if self.scenarios.contains_key(&id) {
                return Err(CatalogError::DuplicateScenario(id));
            }
            self.scenarios.insert(id, scenario);
        }
        self.content_hash = self.content_hash.or(other.content_hash);
        Ok(self)
    }

    /// SHA-256 of the YAML source, when loaded from YAML.
    #[must_use]
    pub fn content_hash(&self) -> Option<&str> {
        self.content_hash.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn insert(&mut self, scenario: Scenario) -> Result<(), CatalogError> {
        scenario.validate()?;
        if self.scenarios.contains_key(&scenario.id) {
            return Err(CatalogError::DuplicateScenario(scenario.id));
        }
        self.scenarios.insert(scenario.id.clone(), Arc::new(scenario));
        Ok(())
    }
}

impl ScenarioCatalog for InMemoryCatalog {
    fn get_scenario(&self, scenario_id: &str) -> Result<Arc<Scenario>, CollaboratorError> {
        self.scenarios
            .get(scenario_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("scenario {scenario_id}")))
    }

    fn list_scenarios(&self) -> Vec<Arc<Scenario>> {
        self.scenarios.values().cloned().collect()
    }
}

/// Flattens markdown to a single line of narration text.
#[must_use]
pub fn plain_narration(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());
    for event in Parser::new(markdown) {
        match event {
            Event::Text(fragment) | Event::Code(fragment) => text.push_str(&fragment),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => {
                text.push(' ');
            }
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn choice(id: &str, text: &str, is_good: bool) -> Choice {
    Choice {
        id: id.to_owned(),
        text: text.to_owned(),
        is_good,
    }
}

fn built_in_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "sharing-toy".to_owned(),
            title: "The Toy Tug-of-War".to_owned(),
            description: "Two friends both want to play with the same toy car".to_owned(),
            category: "Sharing with Friends".to_owned(),
            difficulty: Difficulty::Easy,
            story: "Oh no! Both Alex and Jamie want to play with the red car at the same time. \
                    They're both reaching for it!"
                .to_owned(),
            choices: vec![
                choice("share", "Say 'Let's take turns!'", true),
                choice("grab", "Grab the toy first", false),
                choice("walk-away", "Walk away sadly", false),
                choice("ask-help", "Ask a grown-up for help", true),
            ],
        },
        Scenario {
            id: "feeling-frustrated".to_owned(),
            title: "Feeling Frustrated".to_owned(),
            description: "Learning to handle big feelings when things don't go as planned"
                .to_owned(),
            category: "Handling Big Feelings".to_owned(),
            difficulty: Difficulty::Medium,
            story: "Maya is trying to build a tower with blocks, but it keeps falling down. \
                    She's getting really frustrated and wants to give up."
                .to_owned(),
            choices: vec![
                choice("keep-trying", "Take a deep breath and try again", true),
                choice("throw-blocks", "Throw the blocks on the floor", false),
                choice("ask-help", "Ask for help from a friend", true),
                choice("give-up", "Say 'This is too hard!' and quit", false),
            ],
        },
    ]
}
