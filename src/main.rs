use ccs::{Controls, Engine, EngineConfig, SampleSeries, SampleSink, SimError};
use cylinder_cycle_sim as ccs;
use gnuplot::{AxesCommon, Caption, Figure};

/// Writes every published cycle to a text file and, if asked, plots it with gnuplot.
struct CyclePlotter {
    prefix: String,
    plot: bool,
}

impl CyclePlotter {
    fn draw(&self, name: &str, y_label: &str, channel: Vec<(f64, f64)>) {
        let (x, y): (Vec<f64>, Vec<f64>) = channel.into_iter().unzip();
        let x: Vec<f64> = x.iter().map(|v| v * 1e3).collect(); // [mm]
        let mut fg = Figure::new();
        fg.set_terminal("pngcairo", &format!("{}_{}.png", self.prefix, name));
        fg.axes2d()
            .set_title(name, &[])
            .set_x_label("piston displacement [mm]", &[])
            .set_y_label(y_label, &[])
            .lines(&x, &y, &[Caption(name)]);
        if let Err(err) = fg.show() {
            log::warn!("unable to plot {}: {}", name, err);
        }
    }
}

impl SampleSink for CyclePlotter {
    fn publish(&mut self, samples: &SampleSeries) -> Result<(), SimError> {
        samples.write_to_file(&format!("{}.txt", self.prefix))?;
        if self.plot {
            self.draw("pressure", "pressure - ambient [Pa]", samples.pressure_channel());
            self.draw("temperature", "temperature [K]", samples.temperature_channel());
            self.draw("friction", "friction force x 1000", samples.friction_channel());
        }
        Ok(())
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), SimError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let plot = args.iter().any(|a| a == "--plot");
    let config = match args.iter().find(|a| !a.starts_with("--")) {
        Some(file_name) => EngineConfig::from_json_file(file_name)?,
        None => EngineConfig::default(),
    };

    let mut engine = Engine::new(config)?;
    println!("{}", engine);

    let rpm = 3000.0;
    println!("MEP at {} RPM:", rpm);
    for throttle in [0.0, 0.25, 0.5, 0.75, 1.0].iter() {
        let out = engine.simulate_tick(&Controls::new(*throttle, rpm)?)?;
        println!("  throttle {:.2}: {:.2}", throttle, out.mep);
    }

    println!("MEP at full throttle:");
    for rpm in [450.0, 1000.0, 3000.0, 6000.0, 9000.0, 15000.0].iter() {
        let out = engine.simulate_tick(&Controls::new(1.0, *rpm)?)?;
        println!("  {:>6} RPM: {:.2}", rpm, out.mep);
    }

    let mut plotter = CyclePlotter {
        prefix: "cycle".to_string(),
        plot,
    };
    let mep = engine.publish_tick(&Controls::new(1.0, rpm)?, &mut plotter)?;
    println!("samples of the {} RPM cycle (MEP {:.2}) written to cycle.txt", rpm, mep);
    Ok(())
}
