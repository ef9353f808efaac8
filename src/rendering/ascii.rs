//! # Glyph Rendering
//!
//! Turns city layouts and world maps into multi-line strings.

use crate::generation::{TileCatalog, TileGrid, WorldMap};

/// Glyph for cells whose kind the catalog does not know.
const UNKNOWN_GLYPH: char = '?';
/// Glyph marking city squares on a world map.
const CITY_GLYPH: char = '#';

/// Renders a layout using each kind's glyph, one line per row.
///
/// # Examples
///
/// ```
/// use citygen::{kinds, render_tiles, TileCatalog, TileGrid};
///
/// let mut grid = TileGrid::filled(3, 2, kinds::GRASS);
/// grid.set(1, 0, kinds::WATER);
/// assert_eq!(render_tiles(&grid, &TileCatalog::organic_city()), ".~.\n...\n");
/// ```
pub fn render_tiles(grid: &TileGrid, catalog: &TileCatalog) -> String {
    let mut out = String::with_capacity((grid.width() + 1) * grid.height());
    for row in grid.rows() {
        out.extend(
            row.iter()
                .map(|&kind| catalog.kind(kind).map_or(UNKNOWN_GLYPH, |k| k.glyph)),
        );
        out.push('\n');
    }
    out
}

/// Renders a world map by biome, with city squares drawn as `#`.
pub fn render_world(world: &WorldMap) -> String {
    let mut out = String::with_capacity((world.width() + 1) * world.height());
    for y in 0..world.height() {
        for x in 0..world.width() {
            let glyph = if world.is_city(x, y) {
                CITY_GLYPH
            } else {
                world.biome_at(x, y).map_or(UNKNOWN_GLYPH, |biome| biome.glyph())
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

/// One line per city: index, name, position, size, population and the
/// temperature band at its centre.
pub fn render_sites(world: &WorldMap) -> String {
    world
        .settlements()
        .iter()
        .enumerate()
        .map(|(index, site)| {
            let temperature = world.temperature_at(site.x as i32, site.y as i32);
            format!(
                "{:>3} {:<24} ({:>3}, {:>3}) size {} population {:>6} {}\n",
                index,
                site.name,
                site.x,
                site.y,
                site.size,
                site.population,
                temperature.label()
            )
        })
        .collect()
}

/// One line per kind: glyph, name and cell count.
pub fn render_legend(grid: &TileGrid, catalog: &TileCatalog) -> String {
    catalog
        .kinds()
        .iter()
        .map(|kind| format!("{} {:<16}{}\n", kind.glyph, kind.name, grid.count(kind.id)))
        .collect()
}
