//! Plain-text template engine on handlebars.
//!
//! Placeholders are written `{{key}}`. A repeating region is an `each`
//! block over the region name, and its body sees the row's keys:
//!
//! ```text
//! {{#each cur_task}}- {{cur_task_ref}}: {{cur_task_description}} ({{gp_ut}})
//! {{/each}}
//! ```
//!
//! Top-level fields are visible inside region bodies too; a row key wins
//! over a field of the same name. A region that is never merged renders as
//! nothing, as does an unbound placeholder. Output is not HTML-escaped.

use std::fmt;
use std::{fs, path::Path, path::PathBuf};

use handlebars::Handlebars;
use handlebars::template::{Parameter, Template, TemplateElement};
use serde_json::{Map, Value};

use super::{BuiltDocument, TemplateEngine, TemplateError};
use crate::model::{PlaceholderMap, SegmentRowSet};

const DOCUMENT: &str = "document";

/// A compiled plain-text template.
pub struct TextTemplate {
    registry: Handlebars<'static>,
    regions: Vec<String>,
    merged: Vec<(String, SegmentRowSet)>,
}

impl fmt::Debug for TextTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextTemplate")
            .field("regions", &self.regions)
            .field("merged", &self.merged)
            .finish_non_exhaustive()
    }
}

impl TextTemplate {
    /// Compile a template from source text.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let template =
            Template::compile(source).map_err(|e| TemplateError::Malformed(e.to_string()))?;

        let mut regions = Vec::new();
        collect_regions(&template, &mut regions);

        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_template(DOCUMENT, template);

        Ok(Self {
            registry,
            regions,
            merged: Vec::new(),
        })
    }

    /// Read and compile a template file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let source = fs::read_to_string(path)?;
        Self::parse(&source)
    }

    fn context(&self, fields: &PlaceholderMap) -> Value {
        let base: Map<String, Value> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();

        let mut context = base.clone();
        for (tag, rows) in &self.merged {
            let rows = rows
                .rows()
                .iter()
                .map(|row| {
                    let mut scope = base.clone();
                    for (k, v) in row.iter() {
                        scope.insert(k.to_string(), Value::String(v.to_string()));
                    }
                    Value::Object(scope)
                })
                .collect();
            context.insert(tag.clone(), Value::Array(rows));
        }
        Value::Object(context)
    }
}

/// Names iterated by `each` blocks, outside any other `each`.
fn collect_regions(template: &Template, regions: &mut Vec<String>) {
    for element in &template.elements {
        let TemplateElement::HelperBlock(block) = element else {
            continue;
        };
        if block.name.as_name() == Some("each") {
            if let Some(tag) = block.params.first().and_then(Parameter::as_name)
                && !regions.iter().any(|r| r == tag)
            {
                regions.push(tag.to_string());
            }
            continue;
        }
        for inner in block.template.iter().chain(block.inverse.iter()) {
            collect_regions(inner, regions);
        }
    }
}

impl TemplateEngine for TextTemplate {
    fn has_region(&self, tag: &str) -> bool {
        self.regions.iter().any(|r| r == tag)
    }

    fn merge_region(&mut self, tag: &str, rows: &SegmentRowSet) -> Result<(), TemplateError> {
        if !self.has_region(tag) {
            return Err(TemplateError::RegionNotFound(tag.to_string()));
        }
        match self.merged.iter_mut().find(|(t, _)| t == tag) {
            Some((_, existing)) => *existing = rows.clone(),
            None => self.merged.push((tag.to_string(), rows.clone())),
        }
        Ok(())
    }

    fn finalize(
        &mut self,
        fields: &PlaceholderMap,
        images: &[PathBuf],
    ) -> Result<BuiltDocument, TemplateError> {
        let content = self
            .registry
            .render(DOCUMENT, &self.context(fields))
            .map_err(|e| TemplateError::Render(e.to_string()))?;
        Ok(BuiltDocument::new(content, images))
    }
}
