//! # Property Ingest
//!
//! A library for normalizing loosely-structured real-estate tables (CSV, TSV,
//! pipe or semicolon separated) into canonical property records with derived
//! investment metrics.
//!
//! ## Core Concepts
//!
//! - **Column Resolution**: Source headers are matched against candidate names per field
//! - **Estimation**: Missing financial fields are filled from price and property type
//! - **Provenance**: Every financial value records whether it came from a column or an estimate
//! - **Metrics Floors**: ROI, cash flow, cap rate and gross yield never drop below fixed floors
//! - **Partial Success**: Bad rows are reported individually and never abort the batch
//!
//! ## Example
//!
//! ```rust,ignore
//! use property_ingest::*;
//!
//! let input = b"Street Addr,Town,St,last_sale_price\n12 Elm St,Springfield,IL,350000\n";
//! let batch = transform_csv(input, &IngestOptions::default()).unwrap();
//!
//! assert_eq!(batch.properties[0].monthly_rent, 2_800.0);
//! println!("{}", batch.summary);
//!
//! let csv = export_csv(&batch.properties).unwrap();
//! ```

pub mod collection;
pub mod columns;
pub mod config;
pub mod error;
pub mod estimator;
pub mod export;
pub mod filters;
pub mod ingestion;
pub mod metrics;
pub mod portfolio;
pub mod sample;
pub mod schema;
pub mod transformer;
pub mod utils;

pub use collection::PropertyCollection;
pub use columns::{ColumnMapping, NameMatch, ResolvedColumn};
pub use config::{EstimationConfig, FinancingAssumptions, MetricsPolicy, PipelineConfig};
pub use error::{PropertyIngestError, Result};
pub use estimator::{classify_property_type, Estimate, FieldEstimator};
pub use export::{export_csv, export_json, write_csv, EXPORT_COLUMNS};
pub use filters::{apply_filters, sort_properties, PropertyFilters, SortKey};
pub use ingestion::{read_table, sniff_delimiter, IngestOptions, RawRow, RawTable};
pub use metrics::{calculate_metrics, down_payment, monthly_mortgage_payment, price_per_square_foot};
pub use portfolio::PortfolioSummary;
pub use sample::generate_sample_properties;
pub use schema::*;
pub use transformer::{
    BatchResult, RecordTransformer, RowOutcome, RowReasoning, TransformationError,
};

use log::{debug, info};
use std::path::Path;

/// Runs delimited input through parsing, column resolution and per-row transformation.
#[derive(Debug, Clone, Default)]
pub struct PropertyPipeline {
    config: PipelineConfig,
}

impl PropertyPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fails only on batch-level problems; row failures land in `BatchResult::errors`.
    pub fn process(&self, input: &[u8], options: &IngestOptions) -> Result<BatchResult> {
        self.config.validate()?;

        info!("Processing {} bytes of tabular property data", input.len());

        let table = read_table(input, options)?;
        debug!(
            "Parsed {} rows across {} columns",
            table.rows.len(),
            table.headers.len()
        );

        let batch = RecordTransformer::new(&self.config).transform_table(&table);
        if batch.is_partial() {
            info!(
                "Batch completed with {} row errors",
                batch.error_count()
            );
        }

        Ok(batch)
    }

    pub fn process_file(&self, path: impl AsRef<Path>, options: &IngestOptions) -> Result<BatchResult> {
        let path = path.as_ref();
        debug!("Reading {}", path.display());
        let bytes = std::fs::read(path)?;
        self.process(&bytes, options)
    }
}

/// Transforms delimited input with the default configuration.
pub fn transform_csv(input: &[u8], options: &IngestOptions) -> Result<BatchResult> {
    PropertyPipeline::default().process(input, options)
}

pub fn transform_csv_with_config(
    input: &[u8],
    options: &IngestOptions,
    config: PipelineConfig,
) -> Result<BatchResult> {
    PropertyPipeline::new(config).process(input, options)
}

pub fn transform_file(path: impl AsRef<Path>) -> Result<BatchResult> {
    PropertyPipeline::default().process_file(path, &IngestOptions::default())
}

/// Demo records drawn from the thread-local generator.
pub fn sample_properties(count: usize) -> Vec<CanonicalProperty> {
    generate_sample_properties(count, &PipelineConfig::default(), &mut rand::thread_rng())
}
