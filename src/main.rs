//! parambind demo - a parameter panel and a reactive view side by side
//!
//! Set `PARAM_JSON_INIT` to a JSON object (or a path to a JSON file) to
//! override the initial parameter values, e.g.
//! `PARAM_JSON_INIT='{"amplitude": 2.5}' parambind-demo`.

use eframe::egui;
use log::{info, warn};

use parambind::param::{JsonInit, Parameter, Parameterized, Value};
use parambind::reactive::{Output, ReactivePane};
use parambind::render::render_layout;
use parambind::{ParamConfig, ParamPanel};

struct DemoApp {
    object: Parameterized,
    panel: ParamPanel,
    summary: ReactivePane,
}

fn shape(name: &str, sides: i64) -> Parameterized {
    Parameterized::new(name)
        .with_param(Parameter::integer("sides", sides).with_bounds(3.0, 12.0))
        .with_param(Parameter::color("fill", "#3366cc"))
}

fn example_object() -> Parameterized {
    let triangle = shape("Triangle", 3);
    let hexagon = shape("Hexagon", 6);
    let object = Parameterized::new("Example")
        .with_param(Parameter::number("amplitude", 1.0).with_bounds(0.0, 10.0).with_step(0.1))
        .with_param(Parameter::integer("frequency", 3).with_bounds(1.0, 20.0))
        .with_param(Parameter::boolean("enabled", true))
        .with_param(Parameter::selector(
            "mode",
            "sine",
            vec!["sine".into(), "square".into(), "triangle".into()],
        ))
        .with_param(Parameter::string("title", "Waveform"))
        .with_param(Parameter::object_selector(
            "shape",
            triangle.clone(),
            vec![triangle.into(), hexagon.into()],
        ))
        .with_param(Parameter::number("internal", 0.0).with_precedence(-1.0))
        .with_param(Parameter::action("reset", |obj| {
            info!("resetting {}", obj.name());
            if let Err(err) = obj.set_params([("amplitude", Value::Float(1.0)), ("frequency", Value::Int(3))]) {
                warn!("{}", err);
            }
        }));
    object.depends_on("summary", &["amplitude", "frequency", "mode", "shape.sides"]);
    object
}

impl DemoApp {
    fn new() -> Result<Self, parambind::ParamError> {
        let object = example_object();
        JsonInit::new().apply(&object);

        let panel = ParamPanel::new(&object, ParamConfig::new().with_expand_button(Some(true)))?;
        let summary = ReactivePane::for_method(&object, "summary", |obj| {
            let sides = match obj.value("shape") {
                Some(Value::Object(shape)) => shape.value("sides").unwrap_or_default(),
                _ => Value::None,
            };
            Output::Text(format!(
                "{} wave, amplitude {}, frequency {}, {} sides",
                obj.value("mode").unwrap_or_default(),
                obj.value("amplitude").unwrap_or_default(),
                obj.value("frequency").unwrap_or_default(),
                sides,
            ))
        });
        Ok(Self { object, panel, summary })
    }
}

impl eframe::App for DemoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("parameters").min_width(320.0).show(ctx, |ui| {
            ui.heading(self.object.name());
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| render_layout(ui, &self.panel.layout()));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Summary");
            render_layout(ui, &self.summary.layout());
            ui.separator();
            let stats = self.summary.stats();
            ui.label(format!(
                "evaluations: {}  merges: {}  replacements: {}",
                stats.evaluations, stats.merges, stats.replacements
            ));
        });
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let app = DemoApp::new()?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native("parambind", options, Box::new(|_cc| Ok(Box::new(app))))?;
    Ok(())
}
