//! SVG charts comparing theory and simulation across the sweep

use crate::error::{Error, Result};
use crate::experiment::{Metric, SweepResults};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Value range with padding, ignoring NaN
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        let padding = if min.abs() < f64::EPSILON { 1.0 } else { min.abs() * 0.1 };
        return (min - padding, max + padding);
    }
    let padding = (max - min) * 0.05;
    (min - padding, max + padding)
}

fn finite_points(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter(|(_, y)| y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect()
}

/// Draw one metric against λ with a theory and a simulation series
pub fn render_metric(results: &SweepResults, metric: Metric, path: &Path) -> Result<()> {
    if results.is_empty() {
        return Err(Error::Plot("no sweep points to plot".to_string()));
    }

    let rates = results.arrival_rates();
    let (theory, practice) = results.series(metric);
    let (x_min, x_max) = value_range(rates.iter().copied());
    let (y_min, y_max) = value_range(theory.iter().chain(&practice).copied());

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(metric.title(), ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Arrival rate (λ)")
        .y_desc(metric.title())
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(plot_err)?;

    for (label, values, color) in [("Theory", &theory, BLUE), ("Simulation", &practice, RED)] {
        let data = finite_points(&rates, values);
        chart
            .draw_series(LineSeries::new(data.iter().copied(), &color))
            .map_err(plot_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(data.iter().map(|&p| Circle::new(p, 3, color.filled())))
            .map_err(plot_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Render every metric into `dir` as `p-1.svg` .. `p-5.svg`
pub fn render_all(results: &SweepResults, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(Metric::ALL.len());
    for (i, metric) in Metric::ALL.iter().enumerate() {
        let path = dir.join(format!("p-{}.svg", i + 1));
        render_metric(results, *metric, &path)?;
        written.push(path);
    }
    Ok(written)
}
