#[macro_use]
extern crate log;

use std::{error::Error, fs, time::Instant};

use common::Hyperparams;
use dialoguer::{theme::ColorfulTheme, Select};
use experiments::{Experiment, ExperimentConfig, TrackingAllocator};
use indexmap::indexmap;

#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;

const IMG_DIR: &str = "img";
const DIMS: (u32, u32) = (1920, 1080);

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();

    let scenarios = vec!["time-series", "control", "optimizers", "precomputed"];
    let e = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select scenario")
        .items(&scenarios)
        .default(0)
        .interact()?;
    let scenario = scenarios[e];

    let t0 = Instant::now();
    let mut exp = Experiment::default();
    match e {
        0 => {
            let config = ExperimentConfig::new(
                ["ARMA-v0", "LDS-v0", "MackeyGlass-v0", "Random-v0"],
                ["LastValue", "AutoRegressor", "RNN", "ESN"],
            )
            .metrics(&["mse", "mae"])
            .use_precomputed(false)
            .timesteps(500);
            exp.initialize(config)?;
        }
        1 => {
            let restriction = indexmap! {
                "LDS-v0".to_string() => vec!["RNN".to_string(), "LastValue".to_string()],
                "Pendulum-v0".to_string() => vec!["RNN".to_string()],
            };
            let config = ExperimentConfig::new(["LDS-v0", "Pendulum-v0"], ["RNN", "LastValue"])
                .restriction(restriction)
                .use_precomputed(false)
                .timesteps(500);
            exp.initialize(config)?;
        }
        2 => {
            let config = ExperimentConfig::new(["ARMA-v0", "MackeyGlass-v0"], ["RNN"])
                .use_precomputed(false)
                .timesteps(500)
                .horizon(3);
            exp.initialize(config)?;
            let params = Hyperparams::new().with("optimizer", "Adagrad").with("lr", 0.01);
            let key = exp.add_model("RNN", params, None)?;
            info!("added {}", key);
        }
        _ => {
            let config =
                ExperimentConfig::new(["ARMA-v0", "LDS-v0"], ["LastValue", "AutoRegressor"]);
            exp.initialize(config)?;
            let key = exp.add_model("AutoRegressor", Hyperparams::new().with("p", 8_usize), Some("p8"))?;
            info!("added {}", key);
        }
    }
    info!("experiment done in {}ms", t0.elapsed().as_millis());

    println!("{}", exp.scoreboard("mse")?);
    println!("{}", exp.scoreboard("time")?);

    fs::create_dir_all(IMG_DIR)?;
    exp.scoreboard("mse")?
        .save_as(format!("{}/{}.csv", IMG_DIR, scenario))?;
    exp.graph(None, "mse", format!("{}/{}.png", IMG_DIR, scenario), DIMS)?;

    Ok(())
}
