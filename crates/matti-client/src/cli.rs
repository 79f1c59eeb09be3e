//! Command line front end.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use matti_advisory::{AdvisoryClient, GeminiClient};
use matti_link::memory::{MemoryDevice, MemoryTransport};
use matti_link::{platform_transport, GattTransport, LinkEvent, LinkStatus, SensorLink};
use matti_shared::fertilizer::{required_fertilizer, Npk};
use matti_shared::i18n::strings;
use matti_shared::schemes::SCHEMES;
use matti_shared::{
    AdvisoryResult, FarmLocation, FarmProfile, FarmerProfile, Language, LandSize, LandUnit,
    ReadingField, SensorReading, SoilType,
};
use matti_store::Database;

use crate::commands::{analysis, history, navigation, profile, sensor, settings};
use crate::config::{parse_fix, ClientConfig};
use crate::context::AppContext;
use crate::location::{FixedLocation, LocationProvider, NoLocation};
use crate::session::AnalysisSource;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "matti", version)]
#[command(about = "Soil testing companion for the SOIL-ESP32 sensor")]
pub struct Cli {
    /// Use a simulated sensor instead of Bluetooth
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the sensor link and stored profile
    Status,
    /// Connect to the sensor and print readings
    Scan {
        /// Stop after this many readings
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
    /// Get an AI report for a live or manually entered reading
    Analyze(AnalyzeArgs),
    /// List saved tests, newest first
    History,
    /// Show how readings changed over time, oldest first
    Trend {
        /// Only tests of this farm (id or name)
        #[arg(long)]
        farm: Option<String>,
    },
    /// Show a saved test
    Replay { id: String },
    /// Manage the farmer profile
    Farmer {
        #[command(subcommand)]
        command: FarmerCommand,
    },
    /// Manage farms
    Farm {
        #[command(subcommand)]
        command: FarmCommand,
    },
    /// Show or change the app language (en, te)
    Language { code: Option<Language> },
    /// Turn spoken reports on or off
    Tts { state: Toggle },
    /// Fertilizer needed for a farm of a given size
    Fertilizer(FertilizerArgs),
    /// List government schemes for farmers
    Schemes,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Wait for a reading from the sensor first
    #[arg(long)]
    live: bool,

    /// Seconds to wait for a live reading
    #[arg(long, default_value_t = 15)]
    wait: u64,

    #[arg(long)]
    ph: Option<f64>,

    #[arg(long)]
    moisture: Option<f64>,

    #[arg(long)]
    temperature: Option<f64>,

    /// Farm id or name the test belongs to (defaults to the first farm)
    #[arg(long)]
    farm: Option<String>,

    /// Save the result to history
    #[arg(long)]
    save: bool,

    /// Write the spoken report to a WAV file
    #[arg(long, value_name = "WAV")]
    speak: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum FarmerCommand {
    /// Create or update the farmer profile
    Set(FarmerArgs),
    /// Print the farmer profile
    Show,
}

#[derive(Args, Debug)]
struct FarmerArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    village: Option<String>,
    #[arg(long)]
    district: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    language: Option<Language>,
}

#[derive(Subcommand, Debug)]
enum FarmCommand {
    /// Add a farm
    Add(FarmArgs),
    /// Change an existing farm
    Edit {
        id: String,
        #[command(flatten)]
        args: FarmArgs,
    },
    /// Delete a farm (history entries are kept)
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List farms
    List,
}

#[derive(Args, Debug)]
struct FarmArgs {
    #[arg(long)]
    name: Option<String>,
    /// Farm size
    #[arg(long)]
    size: Option<f64>,
    /// acres, guntas or hectares
    #[arg(long)]
    unit: Option<LandUnit>,
    /// sandy, loamy, black, red, clay or other
    #[arg(long)]
    soil: Option<SoilType>,
    /// Crop currently grown
    #[arg(long)]
    crop: Option<String>,
    /// GPS position as "lat,lon"
    #[arg(long, conflicts_with = "address", value_parser = parse_fix)]
    gps: Option<matti_shared::GeoFix>,
    /// Free-text location
    #[arg(long)]
    address: Option<String>,
}

#[derive(Args, Debug)]
struct FertilizerArgs {
    /// Farm size
    #[arg(long)]
    size: f64,
    #[arg(long, default_value = "acres")]
    unit: LandUnit,
    /// Target nitrogen, kg/ha
    #[arg(long, default_value_t = 50.0)]
    nitrogen: f64,
    /// Target phosphorus, kg/ha
    #[arg(long, default_value_t = 25.0)]
    phosphorus: f64,
    /// Target potassium, kg/ha
    #[arg(long, default_value_t = 25.0)]
    potassium: f64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

/// Build the services and run one command.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let command = match cli.command {
        Command::Fertilizer(args) => return fertilizer(args),
        Command::Schemes => {
            print_schemes();
            return Ok(());
        }
        other => other,
    };

    let config = ClientConfig::from_env();
    let db = match &config.data_dir {
        Some(dir) => Database::open_in_dir(dir),
        None => Database::new(),
    }
    .context("Failed to open the local database")?;
    if let Some(path) = db.path() {
        info!(path = %path.display(), "database opened");
    }

    let (transport, simulator): (Arc<dyn GattTransport>, Option<JoinHandle<()>>) = if cli.simulate
    {
        let transport = MemoryTransport::new();
        let simulator = spawn_simulator(transport.device());
        (Arc::new(transport), Some(simulator))
    } else {
        (platform_transport(), None)
    };

    let location: Arc<dyn LocationProvider> = match config.location {
        Some(fix) => Arc::new(FixedLocation(fix)),
        None => Arc::new(NoLocation),
    };
    let model = GeminiClient::new(config.gemini.clone()).context("Failed to build HTTP client")?;

    let ctx = AppContext::new(
        AppState::load(db),
        SensorLink::new(transport, config.device_target()),
        AdvisoryClient::new(Arc::new(model)),
        location,
        config.location_timeout,
    );

    let result = execute(&ctx, command).await;

    sensor::disconnect_sensor(&ctx).await;
    if let Some(simulator) = simulator {
        simulator.abort();
    }
    result
}

async fn execute(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Status => status(ctx).await,
        Command::Scan { count } => scan(ctx, count).await?,
        Command::Analyze(args) => analyze(ctx, args).await?,
        Command::History => print_history(ctx),
        Command::Trend { farm } => print_trend(ctx, farm.as_deref())?,
        Command::Replay { id } => {
            let session = history::replay(ctx, &id)?;
            let entry = history::get_entry(ctx, &id)?;
            let language = settings::get_settings(ctx).language;
            println!("{}", format_reading(session.reading()));
            if let Some(report) = session.advisory() {
                print_report(report, language);
            }
            if let Some(fix) = entry.location {
                println!("Location: {fix}");
            }
        }
        Command::Farmer { command } => farmer(ctx, command)?,
        Command::Farm { command } => farm(ctx, command)?,
        Command::Language { code } => match code {
            Some(language) => {
                settings::set_language(ctx, language)?;
                println!("Language set to {}", language.english_name());
            }
            None => println!("{}", settings::get_settings(ctx).language),
        },
        Command::Tts { state } => {
            let enabled = matches!(state, Toggle::On);
            settings::set_tts_enabled(ctx, enabled)?;
            println!("Spoken reports {}", if enabled { "on" } else { "off" });
        }
        Command::Fertilizer(_) | Command::Schemes => {}
    }
    Ok(())
}

async fn status(ctx: &AppContext) {
    let language = settings::get_settings(ctx).language;
    let t = strings(language);
    let sensor = sensor::sensor_status(ctx);
    let label = match sensor.status {
        LinkStatus::Disconnected => t.ble_disconnected,
        LinkStatus::Connecting => t.ble_connecting,
        LinkStatus::Connected => t.ble_connected,
        LinkStatus::Error => t.ble_error,
    };

    if navigation::current_screen(ctx).shows_header() {
        println!("{}", t.app_name);
    }
    println!("Sensor {}: {label}", sensor.device_name);
    if !sensor::bluetooth_available(ctx).await {
        println!("{}", t.ble_no_support);
    }
    match profile::current_farmer(ctx) {
        Some(farmer) => println!("Farmer: {}", farmer.name),
        None => println!("No farmer profile yet. Run `matti farmer set --name <NAME>`."),
    }
    println!("Farms: {}", profile::list_farms(ctx).len());
    println!("Saved tests: {}", history::list_history(ctx).len());
}

async fn scan(ctx: &AppContext, count: usize) -> anyhow::Result<()> {
    let mut events = ctx.link.subscribe();
    sensor::connect_sensor(ctx).await?;
    println!("Connected to {}. Waiting for readings...", ctx.link.target().name);

    let mut seen = 0;
    while seen < count {
        tokio::select! {
            event = events.recv() => match event {
                Ok(LinkEvent::Reading(reading)) => {
                    seen += 1;
                    println!("{}", format_reading(&reading));
                }
                Ok(LinkEvent::Status(LinkStatus::Disconnected)) => {
                    println!("Sensor disconnected");
                    break;
                }
                Ok(LinkEvent::Status(_)) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "missed readings"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

async fn wait_for_reading(ctx: &AppContext, wait: Duration) -> anyhow::Result<SensorReading> {
    let mut events = ctx.link.subscribe();
    sensor::connect_sensor(ctx).await?;

    let reading = tokio::time::timeout(wait, async {
        loop {
            match events.recv().await {
                Ok(LinkEvent::Reading(reading)) => return Some(reading),
                Ok(LinkEvent::Status(LinkStatus::Disconnected)) | Err(RecvError::Closed) => {
                    return None
                }
                Ok(LinkEvent::Status(_)) | Err(RecvError::Lagged(_)) => {}
            }
        }
    })
    .await;

    match reading {
        Ok(Some(reading)) => Ok(reading),
        Ok(None) => anyhow::bail!("Sensor disconnected before sending a reading"),
        Err(_) => anyhow::bail!("No reading from the sensor within {}s", wait.as_secs()),
    }
}

async fn analyze(ctx: &AppContext, args: AnalyzeArgs) -> anyhow::Result<()> {
    let source = if args.live {
        let reading = wait_for_reading(ctx, Duration::from_secs(args.wait)).await?;
        Some(AnalysisSource::Live(reading))
    } else {
        None
    };
    analysis::open_analysis(ctx, source)?;

    for (field, value) in [
        (ReadingField::Ph, args.ph),
        (ReadingField::Moisture, args.moisture),
        (ReadingField::Temperature, args.temperature),
    ] {
        if let Some(value) = value {
            analysis::edit_reading(ctx, field, value)?;
        }
    }

    if let Some(wanted) = &args.farm {
        let farm = find_farm(ctx, wanted)?;
        analysis::select_farm(ctx, &farm.id)?;
    }

    let session = analysis::current_analysis(ctx)?;
    let language = settings::get_settings(ctx).language;
    if let Some(farm_id) = session.selected_farm() {
        let farm = profile::get_farm(ctx, farm_id)?;
        println!("{}: {}", strings(language).analysis_select_farm, farm.name);
    }
    println!("{}", format_reading(session.reading()));

    let report = analysis::run_analysis(ctx).await?;
    print_report(&report, language);

    if args.save {
        if profile::list_farms(ctx).is_empty() {
            println!("{}", strings(language).analysis_add_farm_prompt);
        } else {
            let entry = analysis::save_analysis(ctx).await?;
            println!("Saved as {}", entry.id);
        }
    }

    if let Some(path) = args.speak {
        match analysis::speak_report(ctx).await? {
            Some(clip) => {
                tokio::fs::write(&path, clip.to_wav())
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "Wrote {:.1}s of speech to {}",
                    clip.duration().as_secs_f64(),
                    path.display()
                );
            }
            None => println!("No speech produced (spoken reports off or synthesis failed)"),
        }
    }
    Ok(())
}

fn find_farm(ctx: &AppContext, wanted: &str) -> anyhow::Result<FarmProfile> {
    profile::list_farms(ctx)
        .into_iter()
        .find(|f| f.id == wanted || f.name.eq_ignore_ascii_case(wanted))
        .with_context(|| format!("No farm matches {wanted:?}"))
}

fn farmer(ctx: &AppContext, command: FarmerCommand) -> anyhow::Result<()> {
    match command {
        FarmerCommand::Show => match profile::current_farmer(ctx) {
            Some(farmer) => println!("{}", serde_json::to_string_pretty(&farmer)?),
            None => println!("No farmer profile yet."),
        },
        FarmerCommand::Set(args) => {
            let language = args
                .language
                .unwrap_or_else(|| settings::get_settings(ctx).language);
            let mut farmer = profile::current_farmer(ctx)
                .unwrap_or_else(|| FarmerProfile::new(String::new(), language));
            farmer.language = language;
            if let Some(name) = args.name {
                farmer.name = name;
            }
            set_if_some(&mut farmer.phone, args.phone);
            set_if_some(&mut farmer.village, args.village);
            set_if_some(&mut farmer.district, args.district);
            set_if_some(&mut farmer.state, args.state);

            profile::save_farmer(ctx, farmer)?;
            println!("Farmer profile saved");
        }
    }
    Ok(())
}

fn set_if_some(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *field = Some(value).filter(|v| !v.trim().is_empty());
    }
}

fn farm(ctx: &AppContext, command: FarmCommand) -> anyhow::Result<()> {
    match command {
        FarmCommand::List => {
            let farms = profile::list_farms(ctx);
            if farms.is_empty() {
                println!("No farms yet. Add one with `matti farm add --name <NAME> --size <SIZE>`.");
            }
            for farm in farms {
                println!(
                    "{}  {}  {} {:?}",
                    farm.id,
                    farm.name,
                    farm.size.value,
                    farm.size.unit
                );
            }
        }
        FarmCommand::Add(args) => {
            let mut farm = FarmProfile::new(String::new(), LandSize::default());
            apply_farm_args(&mut farm, args);
            let id = farm.id.clone();
            profile::add_farm(ctx, farm)?;
            println!("Added farm {id}");
        }
        FarmCommand::Edit { id, args } => {
            let mut farm = profile::get_farm(ctx, &id)?;
            apply_farm_args(&mut farm, args);
            profile::update_farm(ctx, farm)?;
            println!("Updated farm {id}");
        }
        FarmCommand::Delete { id, yes } => {
            profile::delete_farm(ctx, &id, yes)?;
            println!("Deleted farm {id}");
        }
    }
    Ok(())
}

fn apply_farm_args(farm: &mut FarmProfile, args: FarmArgs) {
    if let Some(name) = args.name {
        farm.name = name;
    }
    if let Some(size) = args.size {
        farm.size.value = size;
    }
    if let Some(unit) = args.unit {
        farm.size.unit = unit;
    }
    if let Some(soil) = args.soil {
        farm.soil_type = Some(soil);
    }
    if let Some(crop) = args.crop {
        farm.current_crop = Some(crop).filter(|c| !c.trim().is_empty());
    }
    if let Some(fix) = args.gps {
        farm.location = Some(FarmLocation::Gps(fix));
    } else if let Some(address) = args.address {
        farm.location = Some(FarmLocation::Address(address));
    }
}

fn print_history(ctx: &AppContext) {
    let language = settings::get_settings(ctx).language;
    let t = strings(language);
    let rows = history::list_history(ctx);
    if rows.is_empty() {
        println!("{}", t.history_no_tests);
        return;
    }
    for row in rows {
        let when = format_saved_at(row.saved_at);
        println!(
            "{}  {when}  {} {}  {}  {}",
            row.id,
            t.history_farm_name,
            row.farm_name,
            t.health_label(row.soil_health),
            format_reading(&row.reading)
        );
    }
}

fn print_trend(ctx: &AppContext, farm: Option<&str>) -> anyhow::Result<()> {
    let farm_id = farm.map(|wanted| find_farm(ctx, wanted)).transpose()?.map(|f| f.id);
    let points = history::trend(ctx, farm_id.as_deref());
    if points.is_empty() {
        println!("{}", strings(settings::get_settings(ctx).language).history_no_tests);
    }
    for point in points {
        println!(
            "{}  pH {:.1}  moisture {:.1}%  temperature {:.1}°C",
            format_saved_at(point.saved_at),
            point.ph,
            point.moisture,
            point.temperature
        );
    }
    Ok(())
}

fn format_saved_at(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn fertilizer(args: FertilizerArgs) -> anyhow::Result<()> {
    let size = LandSize {
        value: args.size,
        unit: args.unit,
    };
    let target = Npk {
        nitrogen: args.nitrogen,
        phosphorus: args.phosphorus,
        potassium: args.potassium,
    };
    let need = required_fertilizer(size, target)?;
    println!("Nitrogen (N):   {:.2} kg", need.nitrogen);
    println!("Phosphorus (P): {:.2} kg", need.phosphorus);
    println!("Potassium (K):  {:.2} kg", need.potassium);
    Ok(())
}

fn print_schemes() {
    for scheme in SCHEMES {
        println!("{}\n  {}\n  {}\n", scheme.name, scheme.description, scheme.benefit);
    }
}

fn format_reading(reading: &SensorReading) -> String {
    format!(
        "pH {:.1}  moisture {:.1}%  temperature {:.1}°C  battery {:.0}%",
        reading.ph, reading.moisture, reading.temperature, reading.battery
    )
}

fn print_report(report: &AdvisoryResult, language: Language) {
    let t = strings(language);
    println!();
    println!("{}: {}", t.analysis_soil_health, t.health_label(report.soil_health));
    println!();
    println!("{}:\n{}\n", t.analysis_crop_suggestions, report.crop_suggestions);
    println!("{}:\n{}\n", t.analysis_fertilizer_advice, report.fertilizer_advice);
    println!("{}:\n{}", t.analysis_irrigation_suggestion, report.irrigation_suggestion);
}

/// Feed plausible readings into `device` once a second while a session is
/// open.
fn spawn_simulator(device: MemoryDevice) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        let mut step: u32 = 0;
        loop {
            tick.tick().await;
            if !device.is_open() {
                continue;
            }
            let wobble = f64::from(step % 10) / 10.0;
            let payload = json!({
                "ts": step,
                "ph": 6.2 + wobble,
                "moisture": 38.0 + wobble * 5.0,
                "temperature": 27.0 + wobble,
                "battery": 100u32.saturating_sub(step / 60),
            });
            device.notify(payload.to_string().as_bytes()).await;
            step = step.wrapping_add(1);
        }
    })
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "matti", "--simulate", "analyze", "--live", "--ph", "6.5", "--save", "--speak", "out.wav",
        ])
        .unwrap();
        assert!(cli.simulate);
        match cli.command {
            Command::Analyze(args) => {
                assert!(args.live && args.save);
                assert_eq!(args.ph, Some(6.5));
                assert_eq!(args.speak, Some(PathBuf::from("out.wav")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_farm_and_language_values() {
        let cli = Cli::try_parse_from([
            "matti", "farm", "add", "--name", "North", "--size", "10", "--unit", "guntas", "--gps",
            "17.4,78.5",
        ])
        .unwrap();
        match cli.command {
            Command::Farm {
                command: FarmCommand::Add(args),
            } => {
                assert_eq!(args.unit, Some(LandUnit::Guntas));
                assert!(args.gps.is_some());
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["matti", "trend", "--farm", "North"]).unwrap();
        assert!(matches!(cli.command, Command::Trend { farm: Some(ref f) } if f == "North"));

        assert!(Cli::try_parse_from(["matti", "language", "fr"]).is_err());
        assert!(Cli::try_parse_from(["matti", "tts", "maybe"]).is_err());
    }

    #[test]
    fn farm_args_update_only_given_fields() {
        let mut farm = FarmProfile::new("Old", LandSize::acres(2.0));
        apply_farm_args(
            &mut farm,
            FarmArgs {
                name: None,
                size: Some(5.0),
                unit: None,
                soil: Some(SoilType::Black),
                crop: Some("Cotton".into()),
                gps: None,
                address: Some("Near the canal".into()),
            },
        );
        assert_eq!(farm.name, "Old");
        assert_eq!(farm.size, LandSize::acres(5.0));
        assert_eq!(farm.soil_type, Some(SoilType::Black));
        assert_eq!(farm.location, Some(FarmLocation::Address("Near the canal".into())));
    }
}
