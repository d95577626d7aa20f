//! Text renderings of maps and waves for the terminal.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use td_core::map::{Cell, GameMap};
use td_core::math::Direction;
use td_core::waves::WaveGenerator;

use crate::loader::ToolResult;

const fn arrow(dir: Direction) -> char {
    match dir {
        Direction::East => '>',
        Direction::South => 'v',
        Direction::West => '<',
        Direction::North => '^',
    }
}

/// Draw a map, one character per cell.
///
/// `S` and `E` mark the spawn and end cells, arrows the path direction,
/// `.` free buildable cells and `#` occupied ones.
pub fn render_map(map: &GameMap) -> String {
    let mut out = String::with_capacity(((map.width() + 1) * map.height()) as usize);
    for (i, cell) in map.cells().enumerate() {
        let symbol = match cell {
            Cell::Path(path) if path.pos() == map.spawn_cell().pos() => 'S',
            Cell::Path(path) if path.pos() == map.end_cell().pos() => 'E',
            Cell::Path(path) => arrow(path.out_direction()),
            Cell::Buildable(buildable) if buildable.is_occupied() => '#',
            Cell::Buildable(_) => '.',
        };
        out.push(symbol);
        if (i as u32 + 1) % map.width() == 0 {
            out.push('\n');
        }
    }
    out
}

/// One composed wave, summarised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavePreview {
    /// Wave number.
    pub wave: u32,
    /// Power allotted.
    pub budget: u64,
    /// Power spent on enemies.
    pub spent: u64,
    /// Ticks between spawns.
    pub cadence: u32,
    /// Enemy count per kind token.
    pub enemies: BTreeMap<String, usize>,
}

impl std::fmt::Display for WavePreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Wave {:>3}: power {}/{}, every {} tick(s):",
            self.wave, self.spent, self.budget, self.cadence
        )?;
        if self.enemies.is_empty() {
            return write!(f, " (empty)");
        }
        for (kind, count) in &self.enemies {
            write!(f, " {kind} x{count}")?;
        }
        Ok(())
    }
}

/// Compose waves `1..=count` with one seeded generator run.
pub fn preview_waves(
    generator: &WaveGenerator,
    count: u32,
    seed: u64,
) -> ToolResult<Vec<WavePreview>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (1..=count)
        .map(|wave| {
            let composed = generator.generate(wave, &mut rng)?;
            let mut enemies = BTreeMap::new();
            let mut spent = 0;
            for enemy in composed.pending() {
                *enemies.entry(enemy.kind.to_string()).or_insert(0) += 1;
                spent += enemy.power;
            }
            Ok(WavePreview {
                wave,
                budget: composed.budget(),
                spent,
                cadence: composed.cadence(),
                enemies,
            })
        })
        .collect()
}

/// Render previews one per line.
pub fn format_previews(previews: &[WavePreview]) -> String {
    let mut out = String::new();
    for preview in previews {
        out.push_str(&preview.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::math::CellPos;
    use td_test_utils::fixtures::{sample_generator, winding_map};

    #[test]
    fn test_render_winding_map() {
        let mut map = winding_map();
        map.occupy(CellPos::new(1, 1)).unwrap();
        assert_eq!(render_map(&map), "S.>E\nv#^.\n>>^.\n....\n");
    }

    #[test]
    fn test_preview_first_waves() {
        let previews = preview_waves(&sample_generator(), 3, 1).unwrap();
        assert_eq!(previews.len(), 3);
        assert_eq!(previews[0].budget, 10);
        assert_eq!(previews[0].enemies.get("IA"), Some(&1));
        assert_eq!(
            previews[0].to_string(),
            "Wave   1: power 10/10, every 2 tick(s): IA x1"
        );
        let text = format_previews(&previews);
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with('\n'));
        assert!(text.starts_with("Wave   1: power 10/10, every 2 tick(s): IA x1\n"));
    }

    #[test]
    fn test_preview_is_seeded() {
        let a = preview_waves(&sample_generator(), 10, 8).unwrap();
        let b = preview_waves(&sample_generator(), 10, 8).unwrap();
        assert_eq!(a, b);
    }
}
