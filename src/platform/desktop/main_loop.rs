use std::{collections::HashMap, path::Path, time::Duration};

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::{debug, error, info, LevelFilter};

use crate::{
    floating_type_mod::FT, init_fluid_sim, simulation_parameters::SimulationParams, write_statistics,
    FluidSimulation, SceneConfig, SimulationVisualizer, VisualizationParams, VisualizedAttribute,
};

use super::image_export::PngSequenceWriter;

const CARGO_PKG_AUTHORS: &'static str = env!("CARGO_PKG_AUTHORS");
const CARGO_PKG_VERSION: &'static str = env!("CARGO_PKG_VERSION");
const CARGO_PKG_DESCRIPTION: &'static str = env!("CARGO_PKG_DESCRIPTION");

pub fn start() {
    let matches = App::new("Stable Fluids Simulation")
        .version(CARGO_PKG_VERSION)
        .author(CARGO_PKG_AUTHORS)
        .about(CARGO_PKG_DESCRIPTION)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Sets the level of verbosity"),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Run simulation with given config")
                .arg(
                    Arg::with_name("SIMULATION_CONFIG")
                        .help("Sets the simulation paramaters")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("SCENE_CONFIG")
                        .help("Scene setup")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::with_name("MAX_SECONDS")
                        .long("max-seconds")
                        .short("s")
                        .required(false)
                        .takes_value(true)
                        .default_value("10")
                        .help("Stop simulation after the given amount of simulated seconds"),
                )
                .arg(
                    Arg::with_name("OVERWRITE_CONFIG")
                        .long("overwrite-config")
                        .short("c")
                        .required(false)
                        .takes_value(true)
                        .help("YAML mapping whose keys replace single simulation parameters, e.g. \"{dt: 0.05}\""),
                )
                .arg(
                    Arg::with_name("STATISTICS_ENABLED")
                        .help("Track performance of individual steps")
                        .short("p")
                        .long("statistics-enabled")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("STATISTICS_PATH")
                        .long("statistics-path")
                        .short("w")
                        .required(false)
                        .takes_value(true)
                        .help("Where to write statistics to"),
                )
                .arg(
                    Arg::with_name("OUTPUT_DIR")
                        .long("output-dir")
                        .short("o")
                        .required(false)
                        .takes_value(true)
                        .help("Directory for PNG frames; no frames are written without it"),
                )
                .arg(
                    Arg::with_name("FRAME_EVERY")
                        .long("frame-every")
                        .short("f")
                        .required(false)
                        .takes_value(true)
                        .default_value("1")
                        .help("Write a frame every N simulation steps"),
                )
                .arg(
                    Arg::with_name("ATTRIBUTE")
                        .long("attribute")
                        .short("a")
                        .required(false)
                        .takes_value(true)
                        .possible_values(&["density", "velocity", "pressure"])
                        .default_value("density")
                        .help("Field shown in the exported frames"),
                )
                .arg(
                    Arg::with_name("DRAW_EMITTERS")
                        .long("draw-emitters")
                        .takes_value(false)
                        .help("Outline active emitters in the exported frames"),
                ),
        )
        .subcommand(
            SubCommand::with_name("write-default-config")
                .about("Write the default simulation parameters to a YAML file")
                .arg(
                    Arg::with_name("OUTPUT_YAML")
                        .help("YAML file where the parameters are written to")
                        .default_value("./simulation-params.yaml")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .get_matches();

    let verbosity = matches
        .subcommand()
        .1
        .map_or(0, |m| m.occurrences_of("v"))
        .max(matches.occurrences_of("v"));
    init_logging(verbosity);

    let result = if let Some(run_matches) = matches.subcommand_matches("run") {
        run(run_matches)
    } else if let Some(subcmd_matches) = matches.subcommand_matches("write-default-config") {
        write_default_config(subcmd_matches)
    } else {
        unreachable!()
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    // RUST_LOG wins over -v
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn write_default_config(subcmd_matches: &ArgMatches) -> Result<(), String> {
    let yaml_path = subcmd_matches
        .value_of("OUTPUT_YAML")
        .ok_or("missing output path")?;
    let yaml = serde_yaml::to_string(&SimulationParams::default())
        .map_err(|e| format!("failed to serialize default parameters: {}", e))?;
    std::fs::write(yaml_path, yaml).map_err(|e| format!("failed to write {}: {}", yaml_path, e))?;
    info!("wrote default simulation parameters to `{}`", yaml_path);
    Ok(())
}

/// Reads the parameter YAML and replaces the keys given in `overwrite_yaml`
/// before deserialising. Unknown keys are an error.
pub fn load_simulation_params(params_yaml: &str, overwrite_yaml: Option<&str>) -> Result<SimulationParams, String> {
    let mut simulation_params_serde: serde_yaml::Value =
        serde_yaml::from_str(params_yaml).map_err(|e| format!("failed parsing simulation config file: {}", e))?;

    if let Some(overwrite_yaml) = overwrite_yaml {
        let overwrite_config: HashMap<String, serde_yaml::Value> =
            serde_yaml::from_str(overwrite_yaml).map_err(|e| format!("failed parsing overwrite config: {}", e))?;
        let mapping = simulation_params_serde
            .as_mapping_mut()
            .ok_or("cannot get parsed simulation parameters as mapping")?;
        let defaults = serde_yaml::to_value(SimulationParams::default())
            .map_err(|e| format!("failed to serialize default parameters: {}", e))?;

        for (k, v) in overwrite_config.into_iter() {
            let key = serde_yaml::Value::String(k.clone());
            // optional keys may be missing from the file but can still be overwritten
            let known = defaults.as_mapping().map_or(false, |d| d.contains_key(&key));
            if !known {
                return Err(format!("not able to find attribute {}", k));
            }
            mapping.insert(key, v);
        }
    }

    let simulation_params: SimulationParams = serde_yaml::from_value(simulation_params_serde)
        .map_err(|e| format!("failed to unpack SimulationParams: {}", e))?;
    simulation_params.validate()?;
    Ok(simulation_params)
}

pub fn load_scene_config(scene_yaml: &str) -> Result<SceneConfig, String> {
    let scene_config: SceneConfig =
        serde_yaml::from_str(scene_yaml).map_err(|e| format!("failed parsing scene config file: {}", e))?;
    scene_config.validate()?;
    Ok(scene_config)
}

struct RunOptions {
    max_seconds: FT,
    frame_every: usize,
    counters_enabled: bool,
    visualization_params: VisualizationParams,
}

fn run(run_matches: &ArgMatches) -> Result<(), String> {
    let parameter_file = run_matches
        .value_of("SIMULATION_CONFIG")
        .ok_or("missing simulation config")?;
    let params_yaml = std::fs::read_to_string(parameter_file)
        .map_err(|e| format!("failed reading parameter file {}: {}", parameter_file, e))?;
    let simulation_params = load_simulation_params(&params_yaml, run_matches.value_of("OVERWRITE_CONFIG"))?;
    debug!("{:?}", simulation_params);

    let scene_file_path = run_matches.value_of("SCENE_CONFIG").ok_or("missing scene config")?;
    let scene_yaml = std::fs::read_to_string(scene_file_path)
        .map_err(|e| format!("failed reading scene file {}: {}", scene_file_path, e))?;
    let scene_config = load_scene_config(&scene_yaml)?;
    debug!("{:?}", scene_config);

    let max_seconds = parse_arg::<FT>(run_matches, "MAX_SECONDS")?;
    let frame_every = parse_arg::<usize>(run_matches, "FRAME_EVERY")?.max(1);
    let visualized_attribute = run_matches
        .value_of("ATTRIBUTE")
        .and_then(VisualizedAttribute::from_str_lowercase)
        .ok_or("unknown attribute")?;
    let options = RunOptions {
        max_seconds,
        frame_every,
        counters_enabled: run_matches.is_present("STATISTICS_ENABLED"),
        visualization_params: VisualizationParams {
            visualized_attribute,
            draw_emitters: run_matches.is_present("DRAW_EMITTERS"),
            ..VisualizationParams::default()
        },
    };

    let mut visualizer = match run_matches.value_of("OUTPUT_DIR") {
        Some(dir) => Some(PngSequenceWriter::new(
            Path::new(dir),
            scene_config.width,
            scene_config.height,
        )?),
        None => None,
    };

    let fluid_simulation = fluid_main(
        simulation_params,
        &scene_config,
        &options,
        visualizer.as_mut().map(|v| v as &mut dyn SimulationVisualizer),
    )?;

    if let Some(visualizer) = &visualizer {
        info!("wrote {} frames", visualizer.frames_written());
    }

    if options.counters_enabled {
        let s = write_statistics(&fluid_simulation);
        print!("{}", s);
        if let Some(statistics_path) = run_matches.value_of("STATISTICS_PATH") {
            std::fs::write(statistics_path, s)
                .map_err(|e| format!("failed to write statistics to {}: {}", statistics_path, e))?;
        }
    }

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    let value = matches.value_of(name).ok_or_else(|| format!("missing {}", name))?;
    value
        .parse::<T>()
        .map_err(|e| format!("invalid value `{}` for {}: {}", value, name, e))
}

fn fluid_main(
    simulation_params: SimulationParams,
    scene_config: &SceneConfig,
    options: &RunOptions,
    mut visualizer: Option<&mut dyn SimulationVisualizer>,
) -> Result<FluidSimulation, String> {
    let mut fluid_simulation =
        init_fluid_sim(simulation_params, scene_config, options.counters_enabled).map_err(|e| e.to_string())?;

    let mut total_duration = Duration::ZERO;

    if let Some(visualizer) = visualizer.as_mut() {
        visualizer.present(&fluid_simulation, &simulation_params, options.visualization_params)?;
    }

    while fluid_simulation.time < options.max_seconds {
        let a = std::time::Instant::now();
        fluid_simulation
            .single_step(simulation_params)
            .map_err(|e| format!("simulation step {} failed: {}", fluid_simulation.frame, e))?;
        let b = std::time::Instant::now();
        total_duration += b - a;

        debug!(
            "{:05}: t={:.3}s {}msec ({}msec AVG)",
            fluid_simulation.frame,
            fluid_simulation.time,
            (b - a).as_secs_f32() * 1000.,
            (total_duration / fluid_simulation.frame as u32).as_secs_f32() * 1000.
        );

        if fluid_simulation.frame % options.frame_every == 0 {
            if let Some(visualizer) = visualizer.as_mut() {
                visualizer.present(&fluid_simulation, &simulation_params, options.visualization_params)?;
            }
        }
    }

    info!(
        "simulated {:.3}s in {} steps ({}msec per step)",
        fluid_simulation.time,
        fluid_simulation.frame,
        (total_duration / fluid_simulation.frame.max(1) as u32).as_secs_f32() * 1000.
    );

    Ok(fluid_simulation)
}
