//! Grouping of generated records into bulk batches.

use std::fmt::Write;

use rand::Rng;

use crate::sampler::{Value, ValueGenerator, VectorDisplay};

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: usize,
    pub vector: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub records: Vec<Record>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Action and document lines for every record, joined by newlines.
    /// There is no trailing newline.
    pub fn ndjson_body(&self, index_name: &str, field_name: &str) -> String {
        let mut body = String::new();
        for (i, record) in self.records.iter().enumerate() {
            if i != 0 {
                body.push('\n');
            }
            // writing into a String cannot fail
            let _ = write!(
                body,
                "{{ \"index\": {{ \"_index\": \"{index_name}\", \"_id\": \"{}\" }} }}\n{{ \"{field_name}\": {} }}",
                record.id,
                VectorDisplay(&record.vector)
            );
        }

        body
    }
}

/// Lazily generates records `0..record_count` and yields them in batches of
/// `batch_size`. Only the final batch may be shorter, and no empty batch is
/// ever produced.
pub struct RecordBatches<'a, R> {
    generator: &'a mut ValueGenerator<R>,
    next_id: usize,
    record_count: usize,
    batch_size: usize,
    values_per_record: usize,
}

impl<'a, R: Rng> RecordBatches<'a, R> {
    /// # Panics
    ///
    /// Panics if `batch_size` is zero. `ScriptConfig::resolve` rejects a zero
    /// batch size, so sizes taken from a `ResolvedConfig` are always valid.
    pub fn new(
        generator: &'a mut ValueGenerator<R>,
        record_count: usize,
        batch_size: usize,
        values_per_record: usize,
    ) -> Self {
        assert!(batch_size > 0, "batch size must be at least 1");
        Self {
            generator,
            next_id: 0,
            record_count,
            batch_size,
            values_per_record,
        }
    }
}

impl<R: Rng> Iterator for RecordBatches<'_, R> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let remaining = self.record_count - self.next_id;
        if remaining == 0 {
            return None;
        }

        let len = remaining.min(self.batch_size);
        let mut records = Vec::with_capacity(len);
        for _ in 0..len {
            records.push(Record {
                id: self.next_id,
                vector: self.generator.generate_vector(self.values_per_record),
            });
            self.next_id += 1;
        }

        Some(Batch { records })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.record_count - self.next_id).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl<R: Rng> ExactSizeIterator for RecordBatches<'_, R> {}
