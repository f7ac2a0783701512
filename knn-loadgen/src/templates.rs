use std::{fs, io, path::Path};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub const CREATE_INDEX: &str = "create_index";
pub const BULK: &str = "bulk";
pub const FINALIZE: &str = "finalize";
pub const SEARCH: &str = "search";

pub const TEMPLATE_NAMES: [&str; 4] = [CREATE_INDEX, BULK, FINALIZE, SEARCH];

const CREATE_INDEX_TEMPLATE: &str = r##"
#!/bin/bash

# Create a mapping
curl -s -X PUT '{{endpoint}}/{{index_name}}' -H 'Content-Type: application/json' -d '
{
  "settings": {
    "index": {
      "knn": true,
      "use_compound_file": false,
      "knn.memory_optimized_search": false,
      "store": {
        "type": "mmapfs"
      }
    }
  },
  "mappings": {
    "properties": {
      "{{field_name}}": {
        "type": "knn_vector",
        "dimension": {{dimension}},
        "data_type": "{{data_type}}",
        "space_type": "{{space_type}}",
        "method": {
          "engine": "{{engine}}",
          "name": "{{method}}"
        }
      }
    },
    "dynamic": false
  }
}
'

echo ""
echo "=============="
sleep {{settle_seconds}}


"##;

const BULK_TEMPLATE: &str = r##"
curl -s -X POST '{{endpoint}}/_bulk' -H 'Content-Type: application/json' -d '{{body}}
' {{mute}}
"##;

const FINALIZE_TEMPLATE: &str = r##"
echo ""
echo "=============="
sleep {{settle_seconds}}

curl -s -X GET '{{endpoint}}/{{index_name}}/_flush'

curl -X POST "{{endpoint}}/{{index_name}}/_forcemerge?max_num_segments=1" -H "Content-Type: application/json"
"##;

const SEARCH_TEMPLATE: &str = r##"
curl -s -X GET '{{endpoint}}/{{index_name}}/_search' -H 'Content-Type: application/json' -d '{
  "size": {{k}},
  "query": {
    "knn": {
      "{{field_name}}": {
        "vector": {{vector}},
        "k": {{k}}
      }
    }
  }
}' | jq . | head -n {{result_lines}}

echo ""
echo "\n=============="

"##;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("could not compile template {name}: {source}")]
    Compile {
        name: String,
        source: Box<handlebars::TemplateError>,
    },
    #[error("could not render template: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// The four script blocks as handlebars templates, with html escaping
/// turned off.
pub struct ScriptTemplates {
    registry: Handlebars<'static>,
}

impl ScriptTemplates {
    pub fn builtin() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        let mut templates = Self { registry };
        for (name, source) in [
            (CREATE_INDEX, CREATE_INDEX_TEMPLATE),
            (BULK, BULK_TEMPLATE),
            (FINALIZE, FINALIZE_TEMPLATE),
            (SEARCH, SEARCH_TEMPLATE),
        ] {
            templates
                .register(name, source)
                .expect("builtin templates compile");
        }

        templates
    }

    /// Starts from the builtin templates and replaces every one for which
    /// `<name>.handlebars` exists in `template_dir`.
    pub fn from_dir<P: AsRef<Path>>(template_dir: P) -> Result<Self, TemplateError> {
        let mut templates = Self::builtin();
        for entry in fs::read_dir(template_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("handlebars") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(name) = TEMPLATE_NAMES.into_iter().find(|n| *n == name) else {
                debug!(path = %path.display(), "ignoring unknown template");
                continue;
            };

            let source = fs::read_to_string(&path)?;
            templates.register(name, &source)?;
            info!(template = name, path = %path.display(), "overriding builtin template");
        }

        Ok(templates)
    }

    fn register(&mut self, name: &str, source: &str) -> Result<(), TemplateError> {
        self.registry
            .register_template_string(name, source)
            .map_err(|e| TemplateError::Compile {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, TemplateError> {
        Ok(self.registry.render(name, data)?)
    }
}

impl Default for ScriptTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}
