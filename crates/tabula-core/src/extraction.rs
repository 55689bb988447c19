//! The two extraction strategies: ruled spreadsheets and whitespace tables.

use crate::cells::{assign_text, find_cells, find_spreadsheet_areas};
use crate::geometry::{EPSILON, Rectangle};
use crate::lines::{Line, column_positions, group_by_lines};
use crate::ruling::{Ruling, partition};
use crate::settings::Settings;
use crate::table::Table;
use crate::text::TextElement;
use crate::words::{merge_words, split_by_rulings};

/// Extract every ruled table from `text` and already normalized `rulings`.
///
/// Cells are inferred from the rulings, grouped into connected
/// spreadsheets, and resolved with the text inside them. Tables come back
/// ordered by position. No rulings means no tables.
pub fn extract_spreadsheets(
    text: &[TextElement],
    rulings: &[Ruling],
    settings: &Settings,
) -> Vec<Table> {
    let (horizontals, verticals) = partition(rulings);
    let cells = find_cells(&horizontals, &verticals, &settings.ruling);
    if cells.is_empty() {
        return Vec::new();
    }
    let elements = split_by_rulings(text, &verticals);

    find_spreadsheet_areas(&cells)
        .into_iter()
        .map(|(area, mut cells)| {
            assign_text(&mut cells, &elements, &verticals, &settings.words);
            Table::from_cells(area, cells)
        })
        .collect()
}

/// Extract a whitespace-delimited table from `text` inside `area`.
///
/// With `vertical_rulings`, columns are the spans between those
/// x-positions; rulings at or left of the leftmost text open no column.
/// Without them, columns come from horizontally overlapping text regions
/// across all lines.
pub fn extract_basic(
    text: &[TextElement],
    area: Rectangle,
    vertical_rulings: Option<&[f64]>,
    settings: &Settings,
) -> Table {
    let verticals: Vec<Ruling> = vertical_rulings
        .unwrap_or_default()
        .iter()
        .map(|&x| Ruling::vertical(x, area.top, area.bottom()))
        .collect();

    let elements = split_by_rulings(text, &verticals);
    let chunks = merge_words(&elements, &verticals, &settings.words);
    let lines = group_by_lines(&chunks, &settings.lines);
    if lines.is_empty() {
        return Table::empty(area);
    }

    let column_of: Box<dyn Fn(f64) -> usize> = match vertical_rulings {
        Some(positions) => {
            let leftmost = lines
                .iter()
                .flat_map(|l| &l.chunks)
                .filter(|c| !c.is_blank())
                .map(|c| c.left())
                .fold(f64::INFINITY, f64::min);
            let mut bounds: Vec<f64> = positions
                .iter()
                .copied()
                .filter(|&x| x > leftmost + EPSILON)
                .collect();
            bounds.sort_by(f64::total_cmp);
            Box::new(move |left| bounds.iter().filter(|&&x| x <= left + EPSILON).count())
        }
        None => {
            let columns = column_positions(&lines);
            Box::new(move |left| {
                columns
                    .iter()
                    .position(|&right| left <= right)
                    .unwrap_or(columns.len())
            })
        }
    };

    let rows = lines.iter().map(|line| line_to_row(line, &column_of));
    Table::from_array(rows.collect::<Vec<_>>()).with_area(area)
}

fn line_to_row(line: &Line, column_of: &dyn Fn(f64) -> usize) -> Vec<String> {
    let mut row: Vec<String> = Vec::new();
    for chunk in line.chunks.iter().filter(|c| !c.is_blank()) {
        let j = column_of(chunk.left());
        if row.len() <= j {
            row.resize(j + 1, String::new());
        }
        let text = chunk.normalized_text();
        if row[j].is_empty() {
            row[j] = text;
        } else {
            row[j].push(' ');
            row[j].push_str(&text);
        }
    }
    row
}
