//! Renders the load script: index creation, one bulk request per batch,
//! flush and force-merge, and a single knn query.

use std::io::Write;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    batch::{Batch, RecordBatches},
    config::ResolvedConfig,
    sampler::{Value, ValueGenerator, VectorDisplay},
    templates::{ScriptTemplates, TemplateError, BULK, CREATE_INDEX, FINALIZE, SEARCH},
};

const QUIET_SUFFIX: &str = " > /dev/null";

#[derive(Serialize)]
struct CreateIndexContext<'a> {
    endpoint: &'a str,
    index_name: &'a str,
    field_name: &'a str,
    dimension: usize,
    data_type: &'static str,
    space_type: &'static str,
    engine: &'a str,
    method: &'a str,
    settle_seconds: u64,
}

#[derive(Serialize)]
struct BulkContext<'a> {
    endpoint: &'a str,
    body: String,
    mute: &'static str,
}

#[derive(Serialize)]
struct FinalizeContext<'a> {
    endpoint: &'a str,
    index_name: &'a str,
    settle_seconds: u64,
}

#[derive(Serialize)]
struct SearchContext<'a> {
    endpoint: &'a str,
    index_name: &'a str,
    field_name: &'a str,
    vector: String,
    k: usize,
    result_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitSummary {
    pub batches: usize,
    pub records: usize,
}

pub struct ScriptEmitter<'a> {
    config: &'a ResolvedConfig,
    templates: &'a ScriptTemplates,
}

impl<'a> ScriptEmitter<'a> {
    pub fn new(config: &'a ResolvedConfig, templates: &'a ScriptTemplates) -> Self {
        Self { config, templates }
    }

    pub fn write_create_index<W: Write>(&self, writer: &mut W) -> Result<(), TemplateError> {
        let config = self.config;
        let rendered = self.templates.render(
            CREATE_INDEX,
            &CreateIndexContext {
                endpoint: &config.endpoint,
                index_name: &config.index_name,
                field_name: &config.field_name,
                dimension: config.dimension,
                data_type: config.data_type.as_str(),
                space_type: config.space_type.as_str(),
                engine: &config.engine,
                method: &config.method,
                settle_seconds: config.settle_seconds,
            },
        )?;
        writer.write_all(rendered.as_bytes())?;

        Ok(())
    }

    pub fn write_batch<W: Write>(
        &self,
        batch: &Batch,
        writer: &mut W,
    ) -> Result<(), TemplateError> {
        let config = self.config;
        let rendered = self.templates.render(
            BULK,
            &BulkContext {
                endpoint: &config.endpoint,
                body: batch.ndjson_body(&config.index_name, &config.field_name),
                mute: if config.quiet_bulk { QUIET_SUFFIX } else { "" },
            },
        )?;
        writer.write_all(rendered.as_bytes())?;

        Ok(())
    }

    pub fn write_finalize<W: Write>(&self, writer: &mut W) -> Result<(), TemplateError> {
        let config = self.config;
        let rendered = self.templates.render(
            FINALIZE,
            &FinalizeContext {
                endpoint: &config.endpoint,
                index_name: &config.index_name,
                settle_seconds: config.settle_seconds,
            },
        )?;
        writer.write_all(rendered.as_bytes())?;

        Ok(())
    }

    pub fn write_search<W: Write>(
        &self,
        query: &[Value],
        writer: &mut W,
    ) -> Result<(), TemplateError> {
        let config = self.config;
        let rendered = self.templates.render(
            SEARCH,
            &SearchContext {
                endpoint: &config.endpoint,
                index_name: &config.index_name,
                field_name: &config.field_name,
                vector: VectorDisplay(query).to_string(),
                k: config.k,
                result_lines: config.result_lines,
            },
        )?;
        writer.write_all(rendered.as_bytes())?;

        Ok(())
    }

    /// Writes the whole script. Records are generated batch by batch, and
    /// the query vector is drawn from the same generator after the last
    /// record.
    pub fn emit<R: Rng, W: Write>(
        &self,
        generator: &mut ValueGenerator<R>,
        writer: &mut W,
    ) -> Result<EmitSummary, TemplateError> {
        let config = self.config;
        self.write_create_index(writer)?;

        let mut summary = EmitSummary::default();
        let batches = RecordBatches::new(
            &mut *generator,
            config.record_count,
            config.batch_size,
            config.values_per_record,
        );
        info!(
            records = config.record_count,
            batches = batches.len(),
            "emitting bulk requests"
        );
        for batch in batches {
            debug!(
                batch = summary.batches,
                records = batch.len(),
                "writing bulk request"
            );
            self.write_batch(&batch, writer)?;
            summary.batches += 1;
            summary.records += batch.len();
        }

        self.write_finalize(writer)?;

        let query = generator.generate_vector(config.values_per_record);
        self.write_search(&query, writer)?;
        writer.flush()?;

        Ok(summary)
    }
}
