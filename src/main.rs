//! CLI entry point for the metro network core.
//!
//! Provides subcommands for browsing lines and stations, running the
//! debounced station search, planning trips, inspecting incident status,
//! and exporting map features, all against the remote metro service.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use metro_core::infra::rest::RestMetroApi;
use metro_core::model::Incident;
use metro_core::network::load_network;
use metro_core::planner::{PlanView, Side, TripPlanner};
use metro_core::poll::spawn_polling;
use metro_core::search::{QueryPipeline, SearchConfig, SearchStatus};
use metro_core::services::metro_api::MetroApi;
use metro_core::status::{
    group_incidents, incidents_by_line, line_arrivals_preview, network_health, summarize_lines,
    worst_incident,
};

#[derive(Parser)]
#[command(name = "metro_core")]
#[command(about = "Client tooling for the metro network service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all lines with status and active incident counts
    Lines,
    /// Show one line's ordered stations with interchange markers
    Line {
        /// Line id
        id: i64,
    },
    /// Search stations through the debounced pipeline
    Search {
        /// Query text
        query: String,
    },
    /// Show one station with its lines and next arrivals
    Station {
        /// Station id
        id: i64,
    },
    /// Network health and active incidents grouped by scope
    Status,
    /// Plan a trip between two stations
    Plan {
        /// Origin station id
        from: i64,

        /// Destination station id
        to: i64,

        /// Travel date (YYYY-MM-DD); defaults to "now" on the backend
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Time of day (HH:MM:SS); midnight if only a date is given
        #[arg(long)]
        time: Option<NaiveTime>,
    },
    /// Export the station/line GeoJSON collections
    ExportGeo {
        /// Output file path
        #[arg(short, long, default_value = "network.geojson")]
        output: String,
    },
    /// Poll active incidents and print changes
    Watch {
        /// Poll interval in seconds
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/metro_core.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("metro_core.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let api = Arc::new(RestMetroApi::from_env()?);

    match cli.command {
        Commands::Lines => list_lines(api).await?,
        Commands::Line { id } => show_line(api, id).await?,
        Commands::Search { query } => search_stations(api, query).await?,
        Commands::Station { id } => show_station(api, id).await?,
        Commands::Status => show_status(api).await?,
        Commands::Plan {
            from,
            to,
            date,
            time,
        } => plan_trip(api, from, to, date, time).await?,
        Commands::ExportGeo { output } => export_geo(api, &output).await?,
        Commands::Watch { interval } => watch_incidents(api, interval).await?,
    }

    Ok(())
}

async fn list_lines(api: Arc<RestMetroApi>) -> Result<()> {
    let lines = api.list_lines().await?;

    // Incident counts are decoration here; a failed fetch must not hide the
    // line listing.
    let incident_counts = match api.list_active_incidents().await {
        Ok(incidents) => incidents_by_line(&incidents),
        Err(e) => {
            warn!(error = %e, "Could not fetch incidents, counts omitted");
            Default::default()
        }
    };

    for line in &lines {
        info!(
            line_id = line.id,
            code = %line.code,
            name = %line.name,
            status = %line.status,
            incidents = incident_counts.get(&line.id).copied().unwrap_or(0),
            "Line"
        );
    }

    info!(total = lines.len(), "Line list fetched");
    Ok(())
}

async fn show_line(api: Arc<RestMetroApi>, id: i64) -> Result<()> {
    let detail = match api.get_line_detail(id).await {
        Ok(detail) => detail,
        Err(e) if e.is_not_found() => {
            error!(line_id = id, "Line not found");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Interchange markers need the whole network, not just this line.
    let snapshot = load_network(api.clone()).await?;

    info!(code = %detail.code, name = %detail.name, status = %detail.status, "Line detail");

    for (idx, station) in detail.stations.iter().enumerate() {
        let interchange = snapshot
            .interchanges
            .get(&station.id)
            .filter(|e| e.is_interchange());

        match interchange {
            Some(entry) => info!(
                position = idx + 1,
                station_id = station.id,
                name = %station.name,
                interchange_lines = %entry.line_codes.join(" · "),
                "Station (interchange)"
            ),
            None => info!(
                position = idx + 1,
                station_id = station.id,
                name = %station.name,
                "Station"
            ),
        }
    }

    // Arrivals card: the terminus feed mixes every line passing through, so
    // keep only this line's next few departures.
    if let Some(first) = detail.stations.first() {
        match api.get_next_arrivals(first.id).await {
            Ok(arrivals) => {
                for arrival in line_arrivals_preview(&arrivals, detail.id, 3) {
                    info!(
                        from = %first.name,
                        direction = %arrival.direction,
                        minutes = arrival.minutes,
                        "Next departure"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Could not fetch arrivals, preview omitted"),
        }
    }

    Ok(())
}

async fn search_stations(api: Arc<RestMetroApi>, query: String) -> Result<()> {
    let pipeline = QueryPipeline::spawn(api, SearchConfig::default());
    let mut state_rx = pipeline.subscribe();
    pipeline.set_input(query);

    loop {
        state_rx.changed().await?;
        let state = state_rx.borrow().clone();
        match state.status {
            SearchStatus::Searching => continue,
            SearchStatus::Results => {
                for station in &state.results {
                    info!(
                        station_id = station.id,
                        name = %station.name,
                        accessible = station.accessible,
                        "Station"
                    );
                }
                info!(shown = state.results.len(), query = %state.settled, "Search complete");
                break;
            }
            SearchStatus::NoResults => {
                info!(query = %state.settled, "No stations matched");
                break;
            }
            SearchStatus::Error => {
                error!(error = %state.error.unwrap_or_default(), "Search failed");
                break;
            }
            SearchStatus::Idle => {
                info!("Query below minimum length");
                break;
            }
        }
    }

    Ok(())
}

fn facility(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    }
}

async fn show_station(api: Arc<RestMetroApi>, id: i64) -> Result<()> {
    let station = match api.get_station(id).await {
        Ok(station) => station,
        Err(e) if e.is_not_found() => {
            error!(station_id = id, "Station not found");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let coordinates = station
        .coordinates()
        .map(|(lon, lat)| format!("{lat:.4}, {lon:.4}"))
        .unwrap_or_else(|| "no coordinates".to_string());

    info!(
        station_id = station.id,
        name = %station.name,
        accessible = station.accessible,
        coordinates = %coordinates,
        elevator = facility(station.facilities.has_elevator),
        toilets = facility(station.facilities.has_toilets),
        bike_parking = facility(station.facilities.has_bike_parking),
        "Station"
    );

    let lines = api.get_station_lines(id).await?;
    for line in &lines {
        info!(code = %line.code, name = %line.name, status = %line.status, "Served by");
    }

    let arrivals = api.get_next_arrivals(id).await?;
    if arrivals.is_empty() {
        info!("No upcoming arrivals");
    }
    for arrival in &arrivals {
        info!(
            line = %arrival.line_code,
            direction = %arrival.direction,
            minutes = arrival.minutes,
            "Next arrival"
        );
    }

    Ok(())
}

async fn show_status(api: Arc<RestMetroApi>) -> Result<()> {
    let lines = api.list_lines().await?;
    let incidents = api.list_active_incidents().await?;

    let summary = summarize_lines(&lines);
    info!(
        health = %network_health(&lines),
        total = summary.total,
        ok = summary.ok,
        delayed = summary.delayed,
        down = summary.down,
        active_incidents = incidents.len(),
        "Network status"
    );

    if let Some(worst) = worst_incident(&incidents) {
        info!(severity = %worst.severity, title = %worst.title, "Worst incident");
    } else {
        info!("No active incidents. Service is running normally.");
    }

    let board = group_incidents(&incidents);
    for (label, bucket) in [
        ("Network-wide", &board.network),
        ("By line", &board.line),
        ("By station", &board.station),
    ] {
        for incident in bucket {
            let place = incident
                .line_code
                .clone()
                .or_else(|| incident.station_name.clone())
                .unwrap_or_else(|| "Network".to_string());
            info!(
                section = label,
                severity = %incident.severity,
                place = %place,
                title = %incident.title,
                "Incident"
            );
        }
    }

    Ok(())
}

async fn plan_trip(
    api: Arc<RestMetroApi>,
    from: i64,
    to: i64,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
) -> Result<()> {
    let origin = match api.get_station(from).await {
        Ok(station) => station,
        Err(e) if e.is_not_found() => {
            error!(station_id = from, "Origin station not found");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let destination = match api.get_station(to).await {
        Ok(station) => station,
        Err(e) if e.is_not_found() => {
            error!(station_id = to, "Destination station not found");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut planner = TripPlanner::new(api.clone(), SearchConfig::default());
    planner.select(Side::Origin, origin);
    planner.select(Side::Destination, destination);
    planner.set_travel_date(date);
    planner.set_travel_time(time);

    if !planner.can_plan() {
        error!("Origin and destination must be distinct stations");
        return Ok(());
    }

    let api_for_plan = Arc::clone(&api);
    planner
        .plan_with(|req| async move {
            api_for_plan
                .plan_journey(req.origin_id, req.destination_id, req.when)
                .await
        })
        .await;

    match planner.view() {
        PlanView::Route(plan) => {
            info!(
                total_min = plan.total_duration_min,
                transfers = plan.transfers,
                "Journey found"
            );
            for (idx, leg) in plan.legs.iter().enumerate() {
                info!(
                    step = idx + 1,
                    kind = %leg.kind,
                    line = leg.line_code.as_deref().unwrap_or("-"),
                    from = %leg.from_name,
                    to = %leg.to_name,
                    minutes = leg.duration_min,
                    direction = leg.direction.as_deref().unwrap_or("-"),
                    "Leg"
                );
            }
        }
        PlanView::NoRoute => info!("No route found between these stations"),
        PlanView::Error(message) => error!(error = %message, "Planning failed"),
        PlanView::Idle | PlanView::Planning => {}
    }

    Ok(())
}

async fn export_geo(api: Arc<RestMetroApi>, output: &str) -> Result<()> {
    let snapshot = load_network(api).await?;

    let doc = serde_json::json!({
        "stations": snapshot.geo.stations,
        "lines": snapshot.geo.lines,
    });
    std::fs::write(output, serde_json::to_string_pretty(&doc)?)?;

    info!(
        path = output,
        stations = snapshot.geo.stations.features.len(),
        lines = snapshot.geo.lines.features.len(),
        "GeoJSON exported"
    );
    Ok(())
}

async fn watch_incidents(api: Arc<RestMetroApi>, interval: u64) -> Result<()> {
    let fetch_api = Arc::clone(&api);
    let (_handle, mut rx) = spawn_polling(Duration::from_secs(interval), move || {
        let api = Arc::clone(&fetch_api);
        async move { api.list_active_incidents().await }
    });

    info!(interval, "Watching incidents. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let incidents: Vec<Incident> = rx.borrow().clone().unwrap_or_default();
                info!(active = incidents.len(), "Incident refresh");
                if let Some(worst) = worst_incident(&incidents) {
                    info!(severity = %worst.severity, title = %worst.title, "Worst incident");
                }
            }
        }
    }

    info!("Stopped watching");
    Ok(())
}
