//! The generate pipeline: load, clean, render, search index, export.
//!
//! Each stage returns `Staged<T>` (the value plus any non-fatal warnings) or a
//! `PipelineError` that stops the run. [`build`] performs no writes, so tests
//! can drive it directly; [`run`] adds the optional route and the exports.

use crate::config::{AppConfig, BoundaryStyle};
use crate::data;
use crate::error::PipelineResult;
use crate::export;
use crate::html;
use crate::processing::{self, Cleaned, DroppedRow};
use crate::render::{self, MapDocument};
use crate::routing;
use crate::search::SearchIndex;
use crate::types::BoundaryLayer;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const PAGE_TITLE: &str = "Agricultural Stakeholders Map";

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    RowsDropped { count: usize },
    BoundarySkipped { layer: String, reason: String },
    RouteUnavailable { reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::RowsDropped { count } => {
                write!(f, "{} row(s) dropped for unusable coordinates", count)
            }
            Warning::BoundarySkipped { layer, reason } => {
                write!(f, "boundary layer '{}' skipped: {}", layer, reason)
            }
            Warning::RouteUnavailable { reason } => write!(f, "route not drawn: {}", reason),
        }
    }
}

/// A stage result that succeeded, possibly with warnings.
#[derive(Debug)]
pub struct Staged<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Staged<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

#[derive(Debug)]
pub struct BuiltMap {
    pub cleaned: Cleaned,
    pub map: MapDocument,
    pub search: SearchIndex,
}

impl BuiltMap {
    pub fn page(&self, config: &AppConfig) -> PipelineResult<String> {
        html::render_page(PAGE_TITLE, &self.map, &self.search, &config.search)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub markers: usize,
    pub search_entries: usize,
    pub dropped: Vec<DroppedRow>,
    pub overlays: Vec<String>,
    pub warnings: Vec<Warning>,
    pub output: Option<PathBuf>,
    pub cleaned_csv: Option<PathBuf>,
}

impl PipelineReport {
    fn from_built(built: &BuiltMap, warnings: Vec<Warning>) -> Self {
        Self {
            total_rows: built.cleaned.total_rows(),
            valid_rows: built.cleaned.records.len(),
            markers: built.map.markers.len(),
            search_entries: built.search.len(),
            dropped: built.cleaned.dropped.clone(),
            overlays: built.map.overlay_names(),
            warnings,
            output: None,
            cleaned_csv: None,
        }
    }

    pub fn log_summary(&self) {
        info!(
            "{} of {} rows rendered ({} markers, {} search entries)",
            self.valid_rows, self.total_rows, self.markers, self.search_entries
        );
        for row in &self.dropped {
            info!(
                "  dropped line {} ('{}'): {}",
                row.line, row.company_name, row.reason
            );
        }
        info!("Overlays: {}", self.overlays.join(", "));
        if !self.warnings.is_empty() {
            warn!("Finished with {} warning(s)", self.warnings.len());
        }
        if let Some(path) = &self.output {
            info!("Open {:?} in a browser to view the map", path);
        }
    }
}

/// Loads and cleans the stakeholder CSV. A missing file or column is fatal.
pub fn load_records(config: &AppConfig) -> PipelineResult<Staged<Cleaned>> {
    let rows = data::load_stakeholder_rows(&config.input.stakeholders_csv)?;
    let mut staged = Staged::new(processing::clean_rows(rows));
    let dropped = staged.value.dropped.len();
    if dropped > 0 {
        staged.warn(Warning::RowsDropped { count: dropped });
    }
    Ok(staged)
}

/// Loads whichever boundary sets are configured. Failures only omit the layer.
pub fn load_boundary_layers(config: &AppConfig) -> Staged<Vec<BoundaryLayer>> {
    let mut staged = Staged::new(Vec::new());
    let sources = [
        (&config.input.state_boundaries, &config.boundaries.state),
        (&config.input.lga_boundaries, &config.boundaries.lga),
    ];

    for (path, style) in sources {
        let Some(path) = path else { continue };
        match load_boundary_layer(path, style) {
            Ok(layer) => staged.value.push(layer),
            Err(e) => staged.warn(Warning::BoundarySkipped {
                layer: style.name.clone(),
                reason: e.to_string(),
            }),
        }
    }
    staged
}

fn load_boundary_layer(path: &Path, style: &BoundaryStyle) -> Result<BoundaryLayer, crate::error::LoadError> {
    Ok(BoundaryLayer {
        name: style.name.clone(),
        color: style.color.clone(),
        weight: style.weight,
        label_property: style.label_property.clone(),
        features: data::load_boundaries(path)?,
    })
}

/// Everything up to the finished map, without touching the output paths.
pub fn build(config: &AppConfig) -> PipelineResult<Staged<BuiltMap>> {
    let Staged {
        value: cleaned,
        mut warnings,
    } = load_records(config)?;
    let boundaries = load_boundary_layers(config);
    warnings.extend(boundaries.warnings);

    let map = render::render_map(config, &cleaned.records, boundaries.value)?;
    let search = SearchIndex::from_records(&cleaned.records)?;

    Ok(Staged {
        value: BuiltMap {
            cleaned,
            map,
            search,
        },
        warnings,
    })
}

/// Validates inputs and reports what a run would render.
pub fn check(config: &AppConfig) -> PipelineResult<PipelineReport> {
    let staged = build(config)?;
    Ok(PipelineReport::from_built(&staged.value, staged.warnings))
}

/// Full run: build, optional route, write the page and the cleaned CSV.
pub async fn run(config: &AppConfig) -> PipelineResult<PipelineReport> {
    let Staged {
        value: mut built,
        mut warnings,
    } = build(config)?;

    if config.routing.enabled {
        match routing::route_between_first_two(&config.routing, &built.cleaned.records).await {
            Ok(points) => built.map = built.map.with_route(points),
            Err(e) => {
                let warning = Warning::RouteUnavailable {
                    reason: e.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    let page = built.page(config)?;
    export::write_html(&config.output.html, &page)?;

    if let Some(path) = &config.output.cleaned_csv {
        export::write_cleaned_csv(path, &built.cleaned.records)?;
    }

    let mut report = PipelineReport::from_built(&built, warnings);
    report.output = Some(config.output.html.clone());
    report.cleaned_csv = config.output.cleaned_csv.clone();
    Ok(report)
}
