use crate::error::WeatherError;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::debug;

pub type RawFieldSet = BTreeMap<String, String>;

pub fn parse_selector(css: &str) -> Result<Selector, WeatherError> {
    Selector::parse(css)
        .map_err(|err| WeatherError::parse("selector", format!("invalid selector {css}: {err:?}")))
}

pub fn select_first<'a>(doc: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>, WeatherError> {
    let selector = parse_selector(css)?;
    Ok(doc.select(&selector).next())
}

pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pulls one field set out of every immediate child of a container.
///
/// Each criterion pairs a canonical field with a tag name; the field name
/// doubles as the class the element must carry, so `("temp", "td")` looks
/// for `td.temp` below the child.
#[derive(Debug)]
pub struct DocumentExtractor {
    criteria: Vec<(String, Selector)>,
}

impl DocumentExtractor {
    pub fn new(criteria: &[(&str, &str)]) -> Result<Self, WeatherError> {
        let mut compiled = Vec::with_capacity(criteria.len());
        for (field, tag) in criteria {
            compiled.push((field.to_string(), parse_selector(&format!("{tag}.{field}"))?));
        }
        Ok(Self { criteria: compiled })
    }

    /// Field sets in document order; children without any match are dropped.
    pub fn extract(&self, container: ElementRef<'_>) -> Vec<RawFieldSet> {
        let mut out = Vec::new();

        for child in container.children().filter_map(ElementRef::wrap) {
            let mut fields = RawFieldSet::new();
            for (field, selector) in &self.criteria {
                let Some(found) = child
                    .select(selector)
                    .find(|el| el.id() != child.id())
                else {
                    continue;
                };
                let text = element_text(found);
                if !text.is_empty() {
                    fields.insert(field.clone(), text);
                }
            }

            if fields.is_empty() {
                continue;
            }
            out.push(fields);
        }

        debug!(records = out.len(), "extracted field sets");
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldMapper {
    rules: Vec<(String, String)>,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remap_key(mut self, from: &str, to: &str) -> Self {
        self.rules.push((from.to_string(), to.to_string()));
        self
    }

    /// Returns renamed copies; the input records are left untouched. A renamed
    /// value replaces whatever the target key already held.
    pub fn remap(&self, records: &[RawFieldSet]) -> Vec<RawFieldSet> {
        records
            .iter()
            .map(|record| {
                let mut renamed = record.clone();
                for (from, to) in &self.rules {
                    if let Some(value) = renamed.remove(from) {
                        renamed.insert(to.clone(), value);
                    }
                }
                renamed
            })
            .collect()
    }
}
