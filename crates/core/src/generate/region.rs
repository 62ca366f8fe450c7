use crate::{
    config::GeneratorConfig,
    generate::{Generate, MapBuilder},
};
use log::debug;
use serde::Serialize;

/// An axis-aligned block of offset coordinates that land can grow in. Minimums
/// are inclusive, maximums exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MapRegion {
    pub x_min: i32,
    pub x_max: i32,
    pub z_min: i32,
    pub z_max: i32,
}

/// Split the map into the configured number of regions, separated by
/// borders so that continents don't merge.
#[derive(Debug)]
pub struct RegionGenerator;

impl Generate for RegionGenerator {
    fn generate(&self, builder: &mut MapBuilder<'_>) -> anyhow::Result<()> {
        // The two region layout is the only one with a choice to make
        let split_vertical =
            builder.config.region_count == 2 && builder.random_value() < 0.5;
        builder.regions = layout_regions(
            builder.config,
            builder.grid.width(),
            builder.grid.height(),
            builder.grid.wrapping(),
            split_vertical,
        );
        debug!("Regions: {:?}", builder.regions);
        Ok(())
    }
}

/// Compute the fixed layout for the configured region count. With two
/// regions, `split_vertical` puts them side by side (split along a vertical
/// line) instead of one above the other.
///
/// On a wrapping map there's no east or west edge to keep land away from, so
/// the map border is replaced by the region border (which keeps land off the
/// seam), or dropped entirely when no region touches the seam twice.
fn layout_regions(
    config: &GeneratorConfig,
    width: i32,
    height: i32,
    wrapping: bool,
    split_vertical: bool,
) -> Vec<MapRegion> {
    let region_border = config.region_border;
    let border_z = config.map_border_z;
    let mut border_x = if wrapping {
        region_border
    } else {
        config.map_border_x
    };

    match config.region_count {
        2 if split_vertical => vec![
            MapRegion {
                x_min: border_x,
                x_max: width / 2 - region_border,
                z_min: border_z,
                z_max: height - border_z,
            },
            MapRegion {
                x_min: width / 2 + region_border,
                x_max: width - border_x,
                z_min: border_z,
                z_max: height - border_z,
            },
        ],
        2 => {
            if wrapping {
                border_x = 0;
            }
            vec![
                MapRegion {
                    x_min: border_x,
                    x_max: width - border_x,
                    z_min: border_z,
                    z_max: height / 2 - region_border,
                },
                MapRegion {
                    x_min: border_x,
                    x_max: width - border_x,
                    z_min: height / 2 + region_border,
                    z_max: height - border_z,
                },
            ]
        }
        3 => vec![
            MapRegion {
                x_min: border_x,
                x_max: width / 3 - region_border,
                z_min: border_z,
                z_max: height - border_z,
            },
            MapRegion {
                x_min: width / 3 + region_border,
                x_max: width * 2 / 3 - region_border,
                z_min: border_z,
                z_max: height - border_z,
            },
            MapRegion {
                x_min: width * 2 / 3 + region_border,
                x_max: width - border_x,
                z_min: border_z,
                z_max: height - border_z,
            },
        ],
        4 => {
            let west = (border_x, width / 2 - region_border);
            let east = (width / 2 + region_border, width - border_x);
            let south = (border_z, height / 2 - region_border);
            let north = (height / 2 + region_border, height - border_z);
            // Counter-clockwise from the south-west
            [(west, south), (east, south), (east, north), (west, north)]
                .iter()
                .map(|&((x_min, x_max), (z_min, z_max))| MapRegion {
                    x_min,
                    x_max,
                    z_min,
                    z_max,
                })
                .collect()
        }
        _ => {
            if wrapping {
                border_x = 0;
            }
            vec![MapRegion {
                x_min: border_x,
                x_max: width - border_x,
                z_min: border_z,
                z_max: height - border_z,
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(region_count: i32) -> GeneratorConfig {
        GeneratorConfig {
            region_count,
            map_border_x: 5,
            map_border_z: 4,
            region_border: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_region() {
        let regions = layout_regions(&config(1), 40, 30, false, false);
        assert_eq!(
            regions,
            vec![MapRegion {
                x_min: 5,
                x_max: 35,
                z_min: 4,
                z_max: 26
            }]
        );

        // Wrapping maps can use the full width
        let regions = layout_regions(&config(1), 40, 30, true, false);
        assert_eq!(regions[0].x_min, 0);
        assert_eq!(regions[0].x_max, 40);
    }

    #[test]
    fn test_two_regions() {
        let side_by_side = layout_regions(&config(2), 40, 30, false, true);
        assert_eq!(side_by_side.len(), 2);
        assert_eq!(side_by_side[0].x_max, 17);
        assert_eq!(side_by_side[1].x_min, 23);
        assert_eq!(side_by_side[1].x_max, 35);

        let stacked = layout_regions(&config(2), 40, 30, false, false);
        assert_eq!(stacked[0].z_max, 12);
        assert_eq!(stacked[1].z_min, 18);
        assert_eq!(stacked[1].z_max, 26);

        // On a wrapping map the region border keeps land off the seam
        let side_by_side = layout_regions(&config(2), 40, 30, true, true);
        assert_eq!(side_by_side[0].x_min, 3);
        assert_eq!(side_by_side[1].x_max, 37);
    }

    #[test]
    fn test_regions_disjoint() {
        for count in 1..=4 {
            let regions = layout_regions(&config(count), 60, 45, false, true);
            assert_eq!(regions.len(), count as usize);
            for (i, a) in regions.iter().enumerate() {
                for b in &regions[i + 1..] {
                    let overlap_x = a.x_min < b.x_max && b.x_min < a.x_max;
                    let overlap_z = a.z_min < b.z_max && b.z_min < a.z_max;
                    assert!(!(overlap_x && overlap_z), "{:?} {:?}", a, b);
                }
            }
        }
    }
}
