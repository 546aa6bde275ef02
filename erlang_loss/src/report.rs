//! Export of sweep results for reading and for analysis tools
//!
//! - text table: tab-separated, fixed decimals, for reading
//! - CSV: one flat row per arrival rate at full precision
//! - JSON: the whole [`SweepResults`] including model parameters

use crate::error::Result;
use crate::experiment::{Metric, MetricPoint, SweepResults};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Flat CSV record of one sweep point
#[derive(Debug, Clone, Serialize)]
pub struct MetricRow {
    pub arrival_rate: f64,
    pub p0_theory: f64,
    pub p0_practice: f64,
    pub p_reject_theory: f64,
    pub p_reject_practice: f64,
    pub throughput_ratio_theory: f64,
    pub throughput_ratio_practice: f64,
    pub absolute_throughput_theory: f64,
    pub absolute_throughput_practice: f64,
    pub mean_busy_channels_theory: f64,
    pub mean_busy_channels_practice: f64,
}

impl From<&MetricPoint> for MetricRow {
    fn from(point: &MetricPoint) -> Self {
        let (t, p) = (&point.theory, &point.practice);
        MetricRow {
            arrival_rate: point.arrival_rate,
            p0_theory: t.p0,
            p0_practice: p.p0,
            p_reject_theory: t.p_reject,
            p_reject_practice: p.p_reject,
            throughput_ratio_theory: t.throughput_ratio,
            throughput_ratio_practice: p.throughput_ratio,
            absolute_throughput_theory: t.absolute_throughput,
            absolute_throughput_practice: p.absolute_throughput,
            mean_busy_channels_theory: t.mean_busy_channels,
            mean_busy_channels_practice: p.mean_busy_channels,
        }
    }
}

/// Write the text table: λ then a theory/simulation column pair per metric
pub fn write_table<W: Write>(results: &SweepResults, mut out: W) -> Result<()> {
    let mut header = vec!["λ".to_string()];
    for metric in Metric::ALL {
        header.push(format!("{} theory", metric.label()));
        header.push(format!("{} simulation", metric.label()));
    }
    writeln!(out, "{}", header.join("\t"))?;

    for point in &results.points {
        let mut row = vec![format!("{:.2}", point.arrival_rate)];
        for metric in Metric::ALL {
            let places = metric.decimals();
            row.push(format!("{:.*}", places, metric.value(&point.theory)));
            row.push(format!("{:.*}", places, metric.value(&point.practice)));
        }
        writeln!(out, "{}", row.join("\t"))?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_table_file<P: AsRef<Path>>(results: &SweepResults, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_table(results, BufWriter::new(file))
}

pub fn write_csv<P: AsRef<Path>>(results: &SweepResults, path: P) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for point in &results.points {
        wtr.serialize(MetricRow::from(point))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<P: AsRef<Path>>(results: &SweepResults, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, results)?;
    out.flush()?;
    Ok(())
}
