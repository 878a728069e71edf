//! Surface plot rendering.
//!
//! Plots are drawn with plotters into an in-memory SVG document and written
//! either as-is or converted to PDF with svg2pdf. Each render owns its drawing
//! area for the duration of the call only.

pub mod colormap;
pub mod triangulation;

use std::path::Path;
use std::sync::Arc;

use plotters::coord::combinators::BindKeyPoints;
use plotters::prelude::*;
use svg2pdf::usvg::{self, fontdb};
use thiserror::Error;

use crate::config::{OutputFormat, RenderConfig};
use crate::core::levels::LevelVocabulary;
use crate::core::loaders::Dataset;
use crate::core::transforms::{year_of, year_start};
use crate::core::writers::{write_artifact, WriteError};
use colormap::{plasma, Normalize};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("degenerate geometry: {points} points do not span a surface")]
    DegenerateGeometry { points: usize },

    #[error("SVG parsing error: {0}")]
    Svg(String),

    #[error("PDF conversion error: {0}")]
    Pdf(String),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Something that turns a dataset into a plot file.
pub trait SurfaceRenderer {
    /// File extension of the artifacts this renderer writes.
    fn extension(&self) -> &str;

    /// Render `dataset` to `path`, replacing any existing file.
    fn render(&self, dataset: &Dataset, path: &Path) -> Result<()>;
}

const AXIS_TITLE_SIZE: u32 = 16;

/// Offset of axis titles from the plot box, as a fraction of the axis span.
const TITLE_OFFSET: f64 = 0.12;

fn plot_err<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

/// Triangulated surface plots over (level, release date, value).
pub struct PlottersRenderer {
    config: RenderConfig,
    labels: Vec<String>,
    fontdb: Arc<fontdb::Database>,
}

impl PlottersRenderer {
    /// Create a renderer. System fonts are loaded once, for PDF output only.
    pub fn new(config: RenderConfig, vocab: &LevelVocabulary) -> Self {
        let mut db = fontdb::Database::new();
        if config.format == OutputFormat::Pdf {
            db.load_system_fonts();
            log::debug!("Loaded {} font faces for PDF output", db.len());
        }

        Self {
            config,
            labels: vocab.labels().to_vec(),
            fontdb: Arc::new(db),
        }
    }

    /// Draw the surface plot of `dataset` as an SVG document.
    ///
    /// # Errors
    ///
    /// `DegenerateGeometry` if the points do not span a surface: fewer than
    /// three points, or all of them on one line in the (level, date) plane.
    pub fn render_svg(&self, dataset: &Dataset) -> Result<String> {
        let points = dataset.points();
        let triangles = triangulation::triangulate_points(&points)?;

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.config.pixel_size())
                .into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;
            self.draw_surface(&root, &points, &triangles)?;
            root.present().map_err(plot_err)?;
        }

        Ok(svg)
    }

    fn draw_surface(
        &self,
        root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
        points: &[[f64; 3]],
        triangles: &[[usize; 3]],
    ) -> Result<()> {
        // Plot space is (level, value, date): plotters' vertical axis is y.
        let level_range = 0.0..(self.labels.len().saturating_sub(1)).max(1) as f64;
        let value_range = padded_range(points.iter().map(|p| p[2]));
        let (date_range, year_lines) = self.date_axis(points);

        // Ticks, labels and bold gridlines sit on the vocabulary positions and
        // on January 1st of every `year_step`-th year.
        let level_ticks: Vec<f64> = (0..self.labels.len()).map(|i| i as f64).collect();
        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .build_cartesian_3d(
                level_range.clone().with_key_points(level_ticks),
                value_range.clone(),
                date_range.clone().with_key_points(year_lines),
            )
            .map_err(plot_err)?;

        chart.with_projection(|mut pb| {
            pb.yaw = self.config.yaw;
            pb.pitch = self.config.pitch;
            pb.scale = self.config.scale;
            pb.into_matrix()
        });

        let labels = &self.labels;
        let level_label = |x: &f64| level_tick(labels, *x);
        let year_label = |d: &f64| year_of(*d).map(|y| format!("{y:04}")).unwrap_or_default();
        let value_label = |v: &f64| format!("{v:.2}");

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.08))
            .bold_grid_style(BLACK.mix(0.35))
            .x_formatter(&level_label)
            .y_formatter(&value_label)
            .z_formatter(&year_label)
            .draw()
            .map_err(plot_err)?;

        // Painter's order: farthest triangles first.
        let mut faces: Vec<(i32, [(f64, f64, f64); 3], f64)> = {
            let coord = chart.as_coord_spec();
            triangles
                .iter()
                .map(|t| {
                    let verts = t.map(|i| (points[i][0], points[i][2], points[i][1]));
                    let centroid = (
                        (verts[0].0 + verts[1].0 + verts[2].0) / 3.0,
                        (verts[0].1 + verts[1].1 + verts[2].1) / 3.0,
                        (verts[0].2 + verts[1].2 + verts[2].2) / 3.0,
                    );
                    (coord.projected_depth(&centroid.0, &centroid.1, &centroid.2), verts, centroid.1)
                })
                .collect()
        };
        faces.sort_by(|a, b| b.0.cmp(&a.0));

        let norm = Normalize::from_values(faces.iter().map(|f| f.2))
            .unwrap_or(Normalize { min: 0.0, max: 1.0 });
        chart
            .draw_series(faces.iter().map(|(_, verts, mean)| {
                Polygon::new(verts.to_vec(), plasma(norm.apply(*mean)).filled())
            }))
            .map_err(plot_err)?;

        let floor = value_range.start;
        let font = ("sans-serif", AXIS_TITLE_SIZE).into_font();
        let level_span = level_range.end - level_range.start;
        let value_span = value_range.end - value_range.start;
        let date_span = date_range.end - date_range.start;
        let titles = [
            (
                "Language level",
                (
                    level_range.start + level_span / 2.0,
                    floor,
                    date_range.start - date_span * TITLE_OFFSET,
                ),
            ),
            (
                "Release date",
                (
                    level_range.end + level_span * TITLE_OFFSET,
                    floor,
                    date_range.start + date_span / 2.0,
                ),
            ),
            (
                "Value",
                (
                    level_range.start - level_span * TITLE_OFFSET,
                    floor + value_span / 2.0,
                    date_range.end,
                ),
            ),
        ];
        chart
            .draw_series(
                titles
                    .iter()
                    .map(|(text, pos)| Text::new(text.to_string(), *pos, font.clone())),
            )
            .map_err(plot_err)?;

        Ok(())
    }

    /// Date axis range aligned to `year_step` boundaries, with the day
    /// numbers of the boundaries inside it.
    fn date_axis(&self, points: &[[f64; 3]]) -> (std::ops::Range<f64>, Vec<f64>) {
        let step = self.config.year_step.max(1);
        let (min_day, max_day) = points
            .iter()
            .map(|p| p[1])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            });

        let (Some(first), Some(last)) = (year_of(min_day), year_of(max_day)) else {
            return (min_day..max_day + 1.0, Vec::new());
        };

        let lo_year = first - first.rem_euclid(step);
        let hi_year = (last.div_euclid(step) + 1) * step;

        let lines: Vec<f64> = (lo_year..=hi_year)
            .step_by(step as usize)
            .filter_map(year_start)
            .collect();

        match (lines.first(), lines.last()) {
            (Some(&lo), Some(&hi)) if hi > lo => (lo..hi, lines),
            _ => (min_day..max_day + 1.0, lines),
        }
    }
}

impl SurfaceRenderer for PlottersRenderer {
    fn extension(&self) -> &str {
        self.config.format.extension()
    }

    fn render(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let svg = self.render_svg(dataset)?;
        let bytes = match self.config.format {
            OutputFormat::Pdf => svg_to_pdf(&svg, &self.fontdb)?,
            OutputFormat::Svg => svg.into_bytes(),
        };
        write_artifact(path, &bytes)?;
        Ok(())
    }
}

/// Convert an SVG document to a single-page PDF sized to the document.
pub fn svg_to_pdf(svg: &str, fonts: &Arc<fontdb::Database>) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb = Arc::clone(fonts);

    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| VisualizationError::Svg(e.to_string()))?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| VisualizationError::Pdf(format!("{e:?}")))
}

/// Vocabulary label at an integer tick, empty between ticks.
fn level_tick(labels: &[String], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    labels.get(nearest as usize).cloned().unwrap_or_default()
}

/// Range spanning the values with 5% padding; flat data gets +-1.
fn padded_range<I: Iterator<Item = f64>>(values: I) -> std::ops::Range<f64> {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}
