//! `board` - inspect and edit stored team dashboards from a shell

use anyhow::{bail, Context, Result};
use board_core::widgets::{content, ideas};
use board_core::{bridge, images, BoardConfig, DashboardController};
use board_model::{ContentPage, TeamId, TeamPatch};
use board_store::{FileArea, TeamStore};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    let team = || {
        Arg::new("team")
            .required(true)
            .value_parser(value_parser!(TeamId))
            .help("Team identifier, e.g. PUD or Team4")
    };

    Command::new("board")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Performance dialogue dashboards")
        .subcommand_required(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .default_value(".board")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding the stored dashboards"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(Command::new("teams").about("List configured and stored teams"))
        .subcommand(
            Command::new("show")
                .about("Print a team dashboard, creating defaults if absent")
                .arg(team()),
        )
        .subcommand(
            Command::new("patch")
                .about("Merge a JSON object of top-level fields into a dashboard")
                .arg(team())
                .arg(Arg::new("json").required(true).help("Patch, e.g. '{\"teamNews\":\"hi\"}'")),
        )
        .subcommand(
            Command::new("export")
                .about("Export every team, or one team's bare document")
                .arg(
                    Arg::new("team")
                        .long("team")
                        .value_parser(value_parser!(TeamId))
                        .help("Export only this team"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to a file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import an export bundle, replacing the teams it contains")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("ideas-csv")
                .about("Print the ideas & actions table as CSV")
                .arg(team()),
        )
        .subcommand(
            Command::new("add-images")
                .about("Attach image files to an additional content page")
                .arg(team())
                .arg(
                    Arg::new("page")
                        .required(true)
                        .value_parser(value_parser!(u8).range(1..=3))
                        .help("Content page 1-3"),
                )
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let writer = std::io::stderr;
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<BoardConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => BoardConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(BoardConfig::local()),
    }
}

fn team_arg(args: &ArgMatches) -> Result<TeamId> {
    args.get_one::<TeamId>("team")
        .cloned()
        .context("missing team argument")
}

async fn open(matches: &ArgMatches) -> Result<DashboardController> {
    let config = load_config(matches)?;
    let dir = matches
        .get_one::<PathBuf>("data-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(".board"));
    let store = config.local_store(FileArea::new(dir));
    store.init().await.context("opening data directory")?;
    Ok(DashboardController::new(Arc::new(store), config))
}

async fn select(board: &DashboardController, team: TeamId) -> Result<()> {
    board
        .select(team.clone())
        .await
        .with_context(|| format!("loading team {team}"))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("log-json"));

    let board = open(&matches).await?;
    let result = run(&board, &matches).await;
    board.dispose().await;
    result
}

async fn run(board: &DashboardController, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("teams", _)) => {
            let stored = board.store().team_ids().await?;
            for team in &board.config().teams {
                let marker = if stored.contains(team) { "*" } else { " " };
                println!("{marker} {:<8} {}", team.as_str(), board.config().header_title(team));
            }
            for team in stored.iter().filter(|t| !board.config().teams.contains(t)) {
                println!("* {:<8} {}", team.as_str(), board.config().header_title(team));
            }
        }
        Some(("show", args)) => {
            select(board, team_arg(args)?).await?;
            let doc = board.document().context("no document loaded")?;
            println!("{}", bridge::team_json(&doc)?);
        }
        Some(("patch", args)) => {
            let raw = args.get_one::<String>("json").context("missing patch")?;
            let patch: TeamPatch =
                serde_json::from_str(raw).context("patch is not a valid dashboard patch")?;
            if patch.is_empty() {
                bail!("patch is empty");
            }
            select(board, team_arg(args)?).await?;
            board.patch(patch).await?;
            board.flush().await?;
        }
        Some(("export", args)) => {
            let json = match args.get_one::<TeamId>("team") {
                Some(team) => {
                    let doc = board
                        .export_team(team)
                        .await?
                        .with_context(|| format!("no stored dashboard for team {team}"))?;
                    bridge::team_json(&doc)?
                }
                None => board.export_all().await?.to_json_pretty()?,
            };
            match args.get_one::<PathBuf>("out") {
                Some(path) => tokio::fs::write(path, json)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Some(("import", args)) => {
            let path = args.get_one::<PathBuf>("file").context("missing file")?;
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let teams = board.import_all(&raw).await?;
            let names: Vec<String> = teams.iter().map(ToString::to_string).collect();
            println!("Imported {}", names.join(", "));
        }
        Some(("ideas-csv", args)) => {
            select(board, team_arg(args)?).await?;
            let doc = board.document().context("no document loaded")?;
            print!("{}", ideas::to_csv(&doc.ideas_actions()));
        }
        Some(("add-images", args)) => {
            let number = *args.get_one::<u8>("page").context("missing page")?;
            let page = ContentPage::from_number(number).context("page must be 1-3")?;
            let files: Vec<PathBuf> = args
                .get_many::<PathBuf>("files")
                .map(|v| v.cloned().collect())
                .unwrap_or_default();

            select(board, team_arg(args)?).await?;
            let doc = board.document().context("no document loaded")?;
            let slots = doc.additional_content(page).remaining_image_slots();
            let batch = images::load_images(&files, slots).await;
            for failure in &batch.failures {
                eprintln!("skipped {}: {failure}", failure.name());
            }
            for path in &batch.skipped {
                eprintln!("no free slot for {}", path.display());
            }

            let loaded = batch.images;
            let added = board
                .update_with(move |doc| Ok(content::add_images(doc, page, loaded).patch))
                .await?;
            board.flush().await?;
            println!(
                "Page {number} now holds {} images",
                added.additional_content(page).uploaded_images.len()
            );
        }
        _ => {}
    }
    Ok(())
}
