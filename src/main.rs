use clap::Parser;
use skycast::config::LoggingConfig;
use skycast::{Failure, LocationQuery, SkycastConfig, WeatherPipeline, WeatherResult};
use std::path::PathBuf;
use std::process;

/// Skycast: current weather and a five-day forecast for any place.
///
/// Accepts a city name or a coordinate pair. The result is printed as JSON
/// on stdout; a readable summary goes to stderr.
///
/// Examples:
///   skycast Nairobi
///   skycast "Ale Maya"
///   skycast --lat 9.41 --lon 42.03
///   skycast --serve --port 8080
#[derive(Parser)]
#[command(name = "skycast", version, about, long_about = None)]
struct Cli {
    /// City name. Example: skycast Stockholm
    #[arg(index = 1)]
    city: Option<String>,

    /// Latitude (-90 to 90). Takes precedence over CITY together with --lon.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,

    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<String>,

    /// Config file (default: ~/.config/skycast/config.toml).
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Show the summary in Fahrenheit. JSON output stays metric.
    #[arg(long, short = 'f')]
    fahrenheit: bool,

    /// Run the HTTP API instead of a single lookup.
    #[arg(long)]
    serve: bool,

    /// Bind address for --serve.
    #[arg(long)]
    host: Option<String>,

    /// Port for --serve.
    #[arg(long, short = 'p')]
    port: Option<u16>,
}

fn main() {
    let cli = Cli::parse();

    let config = SkycastConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    init_logging(&config.logging);

    let pipeline = WeatherPipeline::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    if cli.serve {
        let host = cli.host.unwrap_or_else(|| config.server.host.clone());
        let port = cli.port.unwrap_or(config.server.port);
        serve(pipeline, &host, port);
        return;
    }

    let query = LocationQuery::from_form(cli.city.as_deref(), cli.lat.as_deref(), cli.lon.as_deref())
        .unwrap_or_else(|e| fail(&e));

    match pipeline.resolve_weather(&query) {
        Ok(result) => {
            eprint!("{}", render_summary(&result, cli.fahrenheit));
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: cannot encode result: {}", e);
                    process::exit(1);
                }
            }
        }
        Err(e) => fail(&e),
    }
}

fn serve(pipeline: WeatherPipeline, host: &str, port: u16) {
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Error: cannot start async runtime: {}", e);
        process::exit(1);
    });
    if let Err(e) = runtime.block_on(skycast::server::start(pipeline, host, port)) {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }
}

fn fail(failure: &Failure) -> ! {
    eprintln!("Error: {}", failure.user_message());
    eprintln!("  kind: {}  next: {:?}", failure.kind(), failure.fallback_hint());
    process::exit(1);
}

fn init_logging(cfg: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_env("SKYCAST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("skycast={}", cfg.level)));

    if cfg.format == "json" {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}

fn render_summary(result: &WeatherResult, fahrenheit: bool) -> String {
    let (unit, convert): (&str, fn(f64) -> f64) = if fahrenheit {
        ("°F", |c| c * 9.0 / 5.0 + 32.0)
    } else {
        ("°C", |c| c)
    };
    let current = &result.current;
    let mut out = String::new();

    out.push_str(&format!("  \u{1F4CD} {}\n", result.place.display_line()));
    if let Some(note) = &result.place.match_note {
        out.push_str(&format!("  \u{26A0}\u{FE0F}  {}\n", note));
    }
    out.push_str(&format!(
        "  {:.0}{}  {}  (feels like {:.0}{})\n",
        convert(current.temperature),
        unit,
        current.condition_text,
        convert(current.feels_like),
        unit
    ));
    out.push_str(&format!(
        "  humidity {}%  wind {:.1} km/h  pressure {:.0} hPa  visibility {:.1} km\n",
        current.humidity_pct, current.wind_kph, current.pressure_hpa, current.visibility_km
    ));
    for day in &result.forecast {
        out.push_str(&format!(
            "  {} {:<7} {:>4.0}{} / {:>4.0}{}  {}\n",
            day.day_label,
            day.date_label,
            convert(day.temp_max),
            unit,
            convert(day.temp_min),
            unit,
            day.description
        ));
    }
    out
}
