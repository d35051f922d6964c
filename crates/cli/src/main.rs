use std::env;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use stroll_agents::{
    AbortHandle, AbortRegistration, GeminiClient, ResolverConfig, TourResolver,
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
};
use stroll_core::{
    build_prompt, route_url, unique_places, Itinerary, LatLng, ResponseMode, TourCategory,
    TourRequest, TourWizard, DURATION_PRESETS_MINUTES,
};
use stroll_observability::{init_tracing, AppMetrics};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "stroll")]
#[command(about = "Walking tour itinerary generator")]
struct Cli {
    /// Falls back to `GEMINI_API_KEY` when neither the flag nor
    /// `STROLL_GEMINI_API_KEY` is set.
    #[arg(long, env = "STROLL_GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "STROLL_MAPS_API_KEY", hide_env_values = true)]
    maps_api_key: Option<String>,

    #[arg(long, env = "STROLL_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    model: String,

    #[arg(long, env = "STROLL_GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    base_url: String,

    #[arg(long, env = "STROLL_RESPONSE_MODE", default_value = "structured")]
    mode: String,

    #[arg(long, env = "STROLL_HTTP_TIMEOUT_SECONDS", default_value_t = 60)]
    timeout_seconds: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one tour and print it as JSON.
    Tour {
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Print the prompt that would be sent, without calling the model.
    Prompt {
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Build a walking directions link through the given places.
    Route { places: Vec<String> },
    /// Step through category, location and duration interactively.
    Wizard,
}

#[derive(Debug, clap::Args)]
struct RequestArgs {
    #[arg(long)]
    category: String,
    #[arg(long)]
    location: String,
    #[arg(long, default_value_t = 60)]
    duration: u32,
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,
}

impl RequestArgs {
    fn into_request(self) -> Result<TourRequest> {
        let category = parse_category(&self.category)?;
        let lat_lng = self.lat.zip(self.lng).map(|(lat, lng)| LatLng::new(lat, lng));
        Ok(TourRequest::new(category, self.location, self.duration, lat_lng)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("stroll_cli");
    let mut cli = Cli::parse();
    cli.api_key = api_key_with_fallback(cli.api_key, env::var("GEMINI_API_KEY").ok());
    let mode = ResponseMode::parse(&cli.mode)
        .ok_or_else(|| anyhow!("invalid --mode '{}', expected structured or grounded", cli.mode))?;

    match cli.command {
        Command::Tour { request } => {
            let request = request.into_request()?;
            let resolver = build_resolver(
                cli.api_key,
                cli.maps_api_key,
                cli.base_url,
                cli.model,
                mode,
                cli.timeout_seconds,
            )?;
            let itinerary = resolver.resolve(&request).await?;
            println!("{}", serde_json::to_string_pretty(&itinerary)?);
        }
        Command::Prompt { request } => {
            let request = request.into_request()?;
            let plan = build_prompt(&request, mode);
            println!("{}", plan.prompt);
        }
        Command::Route { places } => {
            let titles = places.iter().map(String::as_str);
            match route_url(titles.clone()) {
                Some(url) => {
                    println!("stops: {}", unique_places(titles).join(" -> "));
                    println!("{url}");
                }
                None => println!("no places given"),
            }
        }
        Command::Wizard => {
            let resolver = build_resolver(
                cli.api_key,
                cli.maps_api_key,
                cli.base_url,
                cli.model,
                mode,
                cli.timeout_seconds,
            )?;
            run_wizard(resolver).await?;
        }
    }

    Ok(())
}

fn api_key_with_fallback(api_key: Option<String>, fallback: Option<String>) -> Option<String> {
    api_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| fallback.filter(|key| !key.trim().is_empty()))
}

/// The abort handle of the model call in flight, if any.
#[derive(Debug, Clone, Default)]
struct InFlight(Arc<Mutex<Option<AbortHandle>>>);

impl InFlight {
    fn begin(&self) -> AbortRegistration {
        let (handle, registration) = AbortHandle::new_pair();
        *self.0.lock() = Some(handle);
        registration
    }

    fn finish(&self) {
        self.0.lock().take();
    }

    /// Aborts the call in flight. Returns false when nothing was running.
    fn interrupt(&self) -> bool {
        match self.0.lock().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

/// Lives for the whole wizard session: ctrl-c cancels a running call, and
/// exits the process when idle at a prompt.
async fn watch_ctrl_c(in_flight: InFlight) {
    loop {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        if !in_flight.interrupt() {
            println!();
            process::exit(130);
        }
    }
}

fn build_resolver(
    api_key: Option<String>,
    maps_api_key: Option<String>,
    base_url: String,
    model: String,
    mode: ResponseMode,
    timeout_seconds: u64,
) -> Result<TourResolver<GeminiClient>> {
    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(6))
        .timeout(Duration::from_secs(timeout_seconds.max(1)))
        .build()
        .context("failed to build HTTP client")?;

    Ok(TourResolver::new(
        GeminiClient::new(http, base_url, model),
        ResolverConfig {
            api_key,
            maps_api_key,
            mode,
        },
        AppMetrics::shared(),
    ))
}

async fn run_wizard(resolver: TourResolver<GeminiClient>) -> Result<()> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let mut wizard = TourWizard::new();
    info!(session_id = %session_id, "wizard session started");

    let in_flight = InFlight::default();
    tokio::spawn(watch_ctrl_c(in_flight.clone()));

    println!("Stroll tour wizard. type 'exit' at any prompt to quit.");

    loop {
        let Some(category) = ask_category()? else {
            break;
        };
        wizard.select_category(category);

        let Some((location, lat_lng)) = ask_location()? else {
            break;
        };
        if let Err(error) = wizard.set_location(&location, lat_lng) {
            println!("{error}");
            continue;
        }

        loop {
            let Some(duration) = ask_duration()? else {
                return Ok(());
            };
            let request = match wizard.choose_duration(duration) {
                Ok(request) => request,
                Err(error) => {
                    println!("{error}");
                    continue;
                }
            };

            println!("Planning your walk... (ctrl-c to cancel)");
            let registration = in_flight.begin();
            let result = resolver.resolve_abortable(&request, registration).await;
            in_flight.finish();

            info!(
                session_id = %session_id,
                success = result.is_ok(),
                "wizard tour finished"
            );
            wizard.complete(result);

            match wizard.itinerary() {
                Some(itinerary) => {
                    render_itinerary(itinerary);
                    break;
                }
                None => {
                    if let Some(message) = wizard.error() {
                        println!("{message}");
                    }
                }
            }
        }

        if !ask_yes_no("Plan another walk? [y/N] ")? {
            break;
        }
        wizard.start_over();
    }

    Ok(())
}

fn parse_category(value: &str) -> Result<TourCategory> {
    if let Ok(index) = value.trim().parse::<usize>() {
        if let Some(category) = index.checked_sub(1).and_then(|i| TourCategory::ALL.get(i)) {
            return Ok(*category);
        }
    }
    TourCategory::parse(value).ok_or_else(|| anyhow!("unknown category '{value}'"))
}

fn ask_category() -> Result<Option<TourCategory>> {
    println!();
    for (index, category) in TourCategory::ALL.iter().enumerate() {
        println!("  {}. {}", index + 1, category.label());
    }
    loop {
        let Some(answer) = read_answer("What kind of walk? ")? else {
            return Ok(None);
        };
        match parse_category(&answer) {
            Ok(category) => return Ok(Some(category)),
            Err(error) => println!("{error}"),
        }
    }
}

fn ask_location() -> Result<Option<(String, Option<LatLng>)>> {
    let Some(location) = read_answer("Where are you starting? ")? else {
        return Ok(None);
    };
    let Some(coords) = read_answer("Coordinates as lat,lng (blank to skip): ")? else {
        return Ok(None);
    };
    Ok(Some((location, parse_lat_lng(&coords))))
}

fn parse_lat_lng(value: &str) -> Option<LatLng> {
    let (lat, lng) = value.split_once(',')?;
    let coords = LatLng::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    coords.is_valid().then_some(coords)
}

fn ask_duration() -> Result<Option<u32>> {
    let presets = DURATION_PRESETS_MINUTES
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/");
    loop {
        let Some(answer) = read_answer(&format!("How many minutes ({presets})? "))? else {
            return Ok(None);
        };
        match answer.parse::<u32>() {
            Ok(minutes) => return Ok(Some(minutes)),
            Err(_) => println!("enter one of {presets}"),
        }
    }
}

fn ask_yes_no(prompt: &str) -> Result<bool> {
    Ok(read_answer(prompt)?
        .map(|answer| answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
        .unwrap_or(false))
}

/// `None` on end of input or an explicit exit.
fn read_answer(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let answer = line.trim();
    if answer.eq_ignore_ascii_case("exit") || answer.eq_ignore_ascii_case("quit") {
        return Ok(None);
    }
    Ok(Some(answer.to_string()))
}

fn render_itinerary(itinerary: &Itinerary) {
    match itinerary {
        Itinerary::Structured(tour) => {
            println!("\n{}\n{}", tour.tour_name, tour.summary);
            if !tour.total_distance.is_empty() {
                println!("Distance: {}", tour.total_distance);
            }
            for (index, stop) in tour.stops.iter().enumerate() {
                println!("\n{}. {} ({})", index + 1, stop.name, stop.time_to_spend);
                println!("   {}", stop.description);
                if let Some(image) = &stop.image_url {
                    println!("   map: {image}");
                }
            }
            if !tour.directions.is_empty() {
                println!("\nDirections:");
                for leg in &tour.directions {
                    println!("- {} -> {}: {}", leg.from, leg.to, leg.instructions);
                }
            }
        }
        Itinerary::Grounded(tour) => {
            println!("\n{}", tour.text);
            if !tour.grounding_chunks.is_empty() {
                println!("\nPlaces:");
                for chunk in &tour.grounding_chunks {
                    println!("- {} {}", chunk.title, chunk.uri);
                }
            }
            if let Some(url) = &tour.route_url {
                println!("\nOpen the route: {url}");
            }
        }
    }
    println!();
}
