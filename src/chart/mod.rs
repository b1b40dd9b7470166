pub mod grid;
pub mod lanes;
pub mod synth;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Seconds from track start
    pub time: f64,
    pub lane: usize,
}

/// Time-ordered notes (ties by lane), free of duplicate `(time, lane)` pairs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub bpm: f32,
    pub subdivision: u32,
    pub lane_count: usize,
    pub notes: Vec<Note>,
}

impl Chart {
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Sorted by time then lane with no repeated `(time, lane)`.
    pub fn is_well_formed(&self) -> bool {
        self.notes.iter().all(|n| n.lane < self.lane_count)
            && self
                .notes
                .windows(2)
                .all(|w| w[0].time < w[1].time || (w[0].time == w[1].time && w[0].lane < w[1].lane))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Plain text debug listing, one note per line.
impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# {:.2} BPM, 1/{} grid, {} lanes, {} notes",
            self.bpm,
            self.subdivision,
            self.lane_count,
            self.notes.len()
        )?;
        for note in &self.notes {
            let mut row = vec!['.'; self.lane_count];
            if let Some(cell) = row.get_mut(note.lane) {
                *cell = 'X';
            }
            writeln!(f, "{:>9.3}  {}", note.time, row.into_iter().collect::<String>())?;
        }
        Ok(())
    }
}
