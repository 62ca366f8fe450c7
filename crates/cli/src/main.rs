use anyhow::{anyhow, bail, Context};
use config::{Config, File};
use hexmap::{
    timed, CellIndex, GenerationReport, HexCell, HexMap, HexUnit, MapConfig,
    Mover, PathQuery,
};
use log::{info, LevelFilter};
use serde::Serialize;
use simple_logger::SimpleLogger;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
    str::FromStr,
};
use structopt::StructOpt;
use strum::{Display, EnumString};

/// CLI for generating hex maps and running path queries over them.
#[derive(Debug, StructOpt)]
#[structopt(name = "hexmap")]
struct Opt {
    /// Path to a config file that defines the map to be generated. Supported
    /// formats: JSON, TOML. If omitted, the default config is used.
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// If given, the generated map will be saved to this directory. The
    /// exact files that appear in the directory are defined by the output
    /// formats. See `--output-formats` for more info
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// The format(s) to output the map in. Supported formats:
    ///
    /// cfg - The full config object used for the map, in TOML format
    ///
    /// json - Every cell of the map, plus the generation report and the
    ///   path query result (if any)
    #[structopt(short = "f", long)]
    output_formats: Vec<OutputFormat>,

    /// Find a path between two cells once the map is generated, e.g.
    /// `--path 3,4 20,11`. Cells are given as offset coordinates
    /// (column,row). Every cell is revealed before the search.
    #[structopt(long, number_of_values = 2)]
    path: Vec<OffsetArg>,

    /// The logging level to use during map generation. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Different output formats.
#[derive(Copy, Clone, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    // If you change this, make sure to update the help text for
    // `--output-formats`!
    /// Export the map's full config in a human-readable file
    Cfg,
    /// Export the map's cells in a serialized JSON format
    Json,
}

impl OutputFormat {
    fn file_ext(self) -> &'static str {
        match self {
            Self::Cfg => "toml",
            Self::Json => "json",
        }
    }
}

/// A cell location given on the command line, as `col,row`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct OffsetArg {
    col: i32,
    row: i32,
}

impl FromStr for OffsetArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (col, row) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("expected col,row but got {:?}", s))?;
        Ok(Self {
            col: col.trim().parse().context("invalid column")?,
            row: row.trim().parse().context("invalid row")?,
        })
    }
}

/// Moves like a regular unit
struct PathMover;

impl Mover for PathMover {
    fn speed(&self) -> i32 {
        HexUnit::SPEED
    }

    fn vision_range(&self) -> i32 {
        HexUnit::VISION_RANGE
    }
}

/// Everything written for the JSON output format
#[derive(Serialize)]
struct MapOutput<'a> {
    config: &'a MapConfig,
    report: &'a GenerationReport,
    cells: &'a [HexCell],
    path: Option<&'a PathQuery>,
}

fn load_config(config_path: &Path) -> anyhow::Result<MapConfig> {
    let mut settings = Config::new();
    let config_path = config_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", config_path)
    })?;
    settings
        .merge(File::with_name(config_path))
        .context("error reading config file")?;
    settings.try_into().context("error reading config")
}

/// Reveal the whole map, then search between two cells. Logs the result,
/// which also stays on the grid for output.
fn run_path_query(
    map: &mut HexMap,
    from: OffsetArg,
    to: OffsetArg,
) -> anyhow::Result<()> {
    let grid = map.grid_mut();
    let lookup = |arg: OffsetArg| {
        grid.cell_at_offset(arg.col, arg.row).ok_or_else(|| {
            anyhow!("cell {},{} is outside of the map", arg.col, arg.row)
        })
    };
    let from = lookup(from)?;
    let to = lookup(to)?;

    for i in 0..grid.cells().len() {
        grid.set_explored(CellIndex(i), true);
    }
    let found = timed!(
        "Path query",
        log::Level::Info,
        grid.find_path(from, to, &PathMover)
    );

    match grid.get_path_steps() {
        Some(steps) if found => {
            info!("Found path with {} steps", steps.len() - 1);
            for step in steps {
                let (col, row) = grid.cell(step.cell).coordinates().to_offset();
                println!(
                    "{},{}\tdistance {}\tturn {}",
                    col, row, step.distance, step.turn
                );
            }
        }
        _ => info!("No path from {} to {}", from, to),
    }
    Ok(())
}

/// Generate an output form of the map in the given format.
fn gen_output(
    output_dir: &Path,
    output_format: OutputFormat,
    map: &HexMap,
) -> anyhow::Result<()> {
    fn generate_bytes(
        output_format: OutputFormat,
        map: &HexMap,
    ) -> anyhow::Result<Vec<u8>> {
        let bytes = match output_format {
            OutputFormat::Cfg => toml::to_string_pretty(map.config())
                .context("error serializing config")?
                .into_bytes(),
            OutputFormat::Json => serde_json::to_vec(&MapOutput {
                config: map.config(),
                report: map.report(),
                cells: map.grid().cells(),
                path: map.grid().current_path(),
            })
            .context("error serializing map")?,
        };
        Ok(bytes)
    }

    let output_file_path = output_dir
        .join("map")
        .with_extension(output_format.file_ext());

    timed!(
        format!(
            "Generating {} output and writing to {:?}",
            output_format, &output_file_path
        ),
        log::Level::Info,
        {
            let bytes = generate_bytes(output_format, map)?;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&output_file_path)
                .with_context(|| {
                    format!("error opening output file {:?}", &output_file_path)
                })?;
            file.write_all(&bytes).with_context(|| {
                format!("error writing to file {:?}", &output_file_path)
            })?;
        }
    );

    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let config = match &opt.config {
        Some(config_path) => load_config(config_path)?,
        None => MapConfig::default(),
    };
    let mut map = HexMap::generate(config)?;
    info!("Generation report: {:?}", map.report());

    match opt.path.as_slice() {
        [] => {}
        &[from, to] => run_path_query(&mut map, from, to)?,
        other => bail!("--path takes exactly two cells, got {}", other.len()),
    }

    // If an output dir was specified, write out output format(s) there
    if let Some(output_dir) = opt.output {
        if opt.output_formats.is_empty() {
            bail!("output dir was specified, but no output formats were given")
        }
        fs::create_dir_all(&output_dir)?;
        for output_format in opt.output_formats {
            gen_output(&output_dir, output_format, &map)?;
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(
            "3,4".parse::<OffsetArg>().unwrap(),
            OffsetArg { col: 3, row: 4 }
        );
        assert_eq!(
            " 12 , 0".parse::<OffsetArg>().unwrap(),
            OffsetArg { col: 12, row: 0 }
        );
        assert!("3".parse::<OffsetArg>().is_err());
        assert!("a,4".parse::<OffsetArg>().is_err());
    }

    #[test]
    fn test_parse_args() {
        let opt = Opt::from_iter(&[
            "hexmap", "--path", "1,2", "5,6", "-f", "json", "-f", "cfg",
        ]);
        assert_eq!(
            opt.path,
            vec![OffsetArg { col: 1, row: 2 }, OffsetArg { col: 5, row: 6 }]
        );
        assert_eq!(opt.output_formats.len(), 2);
        assert!(opt.config.is_none());
    }
}
