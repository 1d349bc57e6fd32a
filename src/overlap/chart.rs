use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;

use super::{intersections, AttributeCount, FileAttributes};
use crate::color::{generate_palette, intensity};

const FONT: &str = "sans-serif";
/// Width of the name column left of both charts.
const LABEL_AREA: u32 = 260;
const MAX_LABEL_CHARS: usize = 40;

const DOT_ON: RGBColor = RGBColor(40, 40, 40);
const DOT_OFF: RGBColor = RGBColor(220, 220, 220);

// ---------------------------------------------------------------------------
// Frequency chart
// ---------------------------------------------------------------------------

/// One bar of the frequency chart, in ranking order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyBar {
    pub label: String,
    pub files: u32,
}

pub fn frequency_bars(counts: &[AttributeCount]) -> Vec<FrequencyBar> {
    counts
        .iter()
        .map(|c| FrequencyBar {
            label: shorten(&c.attribute),
            files: c.files as u32,
        })
        .collect()
}

/// Horizontal bar chart of the ranked attributes, top-ranked first, each
/// bar labelled with its attribute name and file count.
pub fn frequency_chart(path: &Path, counts: &[AttributeCount]) -> Result<()> {
    let bars = frequency_bars(counts);
    let rows = bars.len().max(1) as u32;
    let max = bars.iter().map(|b| b.files).max().unwrap_or(0).max(1);
    // Segment 0 is the bottom of the chart.
    let key_of = |rank: usize| rows - 1 - rank as u32;
    let bar_at = |key: u32| (rows - 1).checked_sub(key).and_then(|r| bars.get(r as usize));

    let root = BitMapBackend::new(path, (1200, 140 + rows * 26)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Top {} Most Common Attributes", bars.len()),
            (FONT, 28),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(LABEL_AREA)
        .build_cartesian_2d(0u32..max + 1, (0u32..rows).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(rows as usize)
        .y_label_formatter(&|v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(key) => bar_at(*key).map(|b| b.label.clone()).unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc("Number of Files Containing Attribute")
        .axis_desc_style((FONT, 16))
        .draw()?;

    chart.draw_series(
        Histogram::horizontal(&chart)
            .style(intensity(0.7).filled())
            .margin(4)
            .data(bars.iter().enumerate().map(|(rank, bar)| (key_of(rank), bar.files))),
    )?;
    chart.draw_series(bars.iter().enumerate().map(|(rank, bar)| {
        Text::new(
            bar.files.to_string(),
            (bar.files, SegmentValue::CenterOf(key_of(rank))),
            (FONT, 14),
        )
    }))?;

    root.present()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Overlap (UpSet-style) diagram
// ---------------------------------------------------------------------------

/// One intersection column: its attribute count and the member rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsetColumn {
    pub size: usize,
    pub members: Vec<usize>,
}

/// Rows are files in name order (labelled with their attribute count),
/// columns the `max_groups` largest exact intersections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsetLayout {
    pub rows: Vec<String>,
    pub columns: Vec<UpsetColumn>,
}

pub fn upset_layout(files: &FileAttributes, max_groups: usize) -> UpsetLayout {
    let names: Vec<&String> = files.keys().collect();
    let rows = files
        .iter()
        .map(|(name, attrs)| format!("{} ({})", shorten(name), attrs.len()))
        .collect();

    let mut groups = intersections(files);
    groups.truncate(max_groups);
    let columns = groups
        .into_iter()
        .map(|group| UpsetColumn {
            size: group.attributes.len(),
            members: names
                .iter()
                .enumerate()
                .filter(|(_, name)| group.files.contains(name))
                .map(|(row, _)| row)
                .collect(),
        })
        .collect();

    UpsetLayout { rows, columns }
}

/// Intersection sizes as labelled bars over a file × group dot matrix.
pub fn upset_chart(path: &Path, files: &FileAttributes, max_groups: usize) -> Result<()> {
    let layout = upset_layout(files, max_groups);
    let cols = layout.columns.len().max(1) as u32;
    let rows = layout.rows.len().max(1) as u32;
    let max_size = layout.columns.iter().map(|c| c.size).max().unwrap_or(0).max(1) as u32;
    // Row 0 is drawn at the top.
    let key_of = |row: usize| rows - 1 - row as u32;
    let row_label = |key: u32| {
        (rows - 1)
            .checked_sub(key)
            .and_then(|r| layout.rows.get(r as usize))
            .cloned()
            .unwrap_or_default()
    };
    let palette = generate_palette(layout.rows.len().max(1));

    let width = (LABEL_AREA + 80 + cols * 48).max(800);
    let height = 400 + rows * 30 + 60;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Attribute Overlap Analysis Across Files", (FONT, 26))?;
    let (upper, lower) = root.split_vertically(360);

    let mut bars = ChartBuilder::on(&upper)
        .margin(10)
        .x_label_area_size(10)
        .y_label_area_size(LABEL_AREA)
        .build_cartesian_2d((0u32..cols).into_segmented(), 0u32..max_size + 1)?;
    bars.configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_: &SegmentValue<u32>| String::new())
        .y_desc("Intersection Size")
        .axis_desc_style((FONT, 16))
        .draw()?;
    bars.draw_series(
        Histogram::vertical(&bars)
            .style(intensity(0.7).filled())
            .margin(8)
            .data(
                layout
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(col, column)| (col as u32, column.size as u32)),
            ),
    )?;
    bars.draw_series(layout.columns.iter().enumerate().map(|(col, column)| {
        Text::new(
            column.size.to_string(),
            (SegmentValue::CenterOf(col as u32), column.size as u32),
            (FONT, 14),
        )
    }))?;

    let mut matrix = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(10)
        .y_label_area_size(LABEL_AREA)
        .build_cartesian_2d(
            (0u32..cols).into_segmented(),
            (0u32..rows).into_segmented(),
        )?;
    matrix
        .configure_mesh()
        .disable_mesh()
        .y_labels(rows as usize)
        .y_label_formatter(&|v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(key) => row_label(*key),
            _ => String::new(),
        })
        .x_label_formatter(&|_: &SegmentValue<u32>| String::new())
        .draw()?;

    let cell = |col: usize, row: usize| {
        (
            SegmentValue::CenterOf(col as u32),
            SegmentValue::CenterOf(key_of(row)),
        )
    };
    matrix.draw_series(layout.columns.iter().enumerate().flat_map(|(col, column)| {
        (0..layout.rows.len())
            .filter(move |row| !column.members.contains(row))
            .map(move |row| Circle::new(cell(col, row), 7, DOT_OFF.filled()))
    }))?;
    matrix.draw_series(layout.columns.iter().enumerate().filter_map(|(col, column)| {
        let (first, last) = (column.members.first()?, column.members.last()?);
        Some(PathElement::new(
            vec![cell(col, *first), cell(col, *last)],
            DOT_ON.stroke_width(3),
        ))
    }))?;
    // Member dots are coloured by how many files share the group.
    matrix.draw_series(layout.columns.iter().enumerate().flat_map(|(col, column)| {
        let colour = palette[(column.members.len().max(1) - 1).min(palette.len() - 1)];
        column
            .members
            .iter()
            .map(move |row| Circle::new(cell(col, *row), 7, colour.filled()))
    }))?;

    root.present()?;
    Ok(())
}

fn shorten(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
    short.push_str("...");
    short
}
