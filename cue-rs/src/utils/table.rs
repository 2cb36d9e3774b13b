//! Table formatting utilities

use cue_model::AnimationClip;
use prettytable::{Cell, Row, Table};

use super::format::format_seconds;

/// Create a table with bold headers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        headers.iter().map(|h| Cell::new(h).style_spec("b")).collect(),
    ));
    table
}

/// Add a row of displayable cells
pub fn add_table_row<I, T>(table: &mut Table, cells: I)
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    table.add_row(Row::new(
        cells
            .into_iter()
            .map(|c| Cell::new(&c.to_string()))
            .collect(),
    ));
}

/// The clip table of a model: index, name, duration, track count
pub fn clip_table(clips: &[AnimationClip]) -> Table {
    let mut table = create_table(&["#", "Name", "Duration", "Tracks"]);
    for (index, clip) in clips.iter().enumerate() {
        add_table_row(
            &mut table,
            [
                index.to_string(),
                clip.name.clone(),
                format_seconds(clip.duration),
                clip.tracks.len().to_string(),
            ],
        );
    }
    table
}
