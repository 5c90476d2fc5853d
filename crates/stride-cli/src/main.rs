use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::PathBuf;
use stride_cli::{
    load_config, load_graph, parse_curve, parse_ramp_step, run_freeze, run_ladder, run_pacing,
    run_ramp, run_tree, summarize_graph, today, GoalData, CURVE_NAMES,
};
use stride_core::GoalsService;
use stride_graph::GoalId;
use tracing_subscriber::EnvFilter;

fn catalog_arg() -> Arg {
    Arg::new("catalog")
        .long("catalog")
        .value_parser(value_parser!(PathBuf))
        .help("Goal catalog (.yaml, .json or .toml); built-in catalog when omitted")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Engine config (.yaml, .json or .toml)")
}

fn goals_arg() -> Arg {
    Arg::new("goals")
        .long("goals")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON array of goal records")
}

fn snapshots_arg() -> Arg {
    Arg::new("snapshots")
        .long("snapshots")
        .value_parser(value_parser!(PathBuf))
        .help("JSON array of daily snapshots")
}

fn date_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_parser(value_parser!(NaiveDate))
        .help(help)
}

fn cli() -> Command {
    Command::new("stride")
        .version(stride_cli::VERSION)
        .about("Goal progress and achievement engine")
        .subcommand_required(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("validate")
                .about("Load a catalog and report its shape")
                .arg(catalog_arg()),
        )
        .subcommand(
            Command::new("ladder")
                .about("Generate a milestone ladder")
                .arg(
                    Arg::new("start")
                        .long("start")
                        .default_value("0")
                        .value_parser(value_parser!(f64))
                        .help("Starting value"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Target value"),
                )
                .arg(
                    Arg::new("rungs")
                        .long("rungs")
                        .default_value("5")
                        .value_parser(value_parser!(usize))
                        .help("Number of rungs"),
                )
                .arg(
                    Arg::new("curve")
                        .long("curve")
                        .default_value("linear")
                        .value_parser(CURVE_NAMES)
                        .help("Curve preset"),
                ),
        )
        .subcommand(
            Command::new("ramp")
                .about("Compute habit ramp milestone dates")
                .arg(date_arg("start", "First day of the ramp").required(true))
                .arg(
                    Arg::new("step")
                        .long("step")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Ramp step as DAYS:DELTA, repeatable"),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Goal progress tree, optionally filtered")
                .arg(catalog_arg())
                .arg(config_arg())
                .arg(goals_arg())
                .arg(snapshots_arg())
                .arg(date_arg("as-of", "Evaluate as of this day; defaults to today"))
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .action(ArgAction::Append)
                        .help("Filter as KEY=VALUE, e.g. lifeArea=dating,fitness"),
                ),
        )
        .subcommand(
            Command::new("pacing")
                .about("Pace and will gate of one goal")
                .arg(catalog_arg())
                .arg(config_arg())
                .arg(goals_arg())
                .arg(snapshots_arg())
                .arg(
                    Arg::new("goal")
                        .long("goal")
                        .required(true)
                        .help("Goal id"),
                )
                .arg(date_arg("as-of", "Evaluate as of this day; defaults to today")),
        )
        .subcommand(
            Command::new("freeze")
                .about("List goals due for auto-freeze")
                .arg(catalog_arg())
                .arg(config_arg())
                .arg(goals_arg())
                .arg(snapshots_arg())
                .arg(date_arg("as-of", "Evaluate as of this day; defaults to today")),
        )
        .subcommand(
            Command::new("review")
                .about("Weekly review for the ISO week containing a day")
                .arg(catalog_arg())
                .arg(config_arg())
                .arg(goals_arg())
                .arg(snapshots_arg())
                .arg(date_arg("week-of", "Any day of the week; defaults to today")),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{text}");
    Ok(())
}

fn path(args: &ArgMatches, name: &str) -> Option<PathBuf> {
    args.get_one::<PathBuf>(name).cloned()
}

fn date_or_today(args: &ArgMatches, name: &str) -> NaiveDate {
    args.get_one::<NaiveDate>(name).copied().unwrap_or_else(today)
}

fn goal_data(args: &ArgMatches) -> Result<GoalData> {
    let goals = path(args, "goals").context("--goals is required")?;
    GoalData::load(&goals, path(args, "snapshots").as_deref())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    match matches.subcommand() {
        Some(("validate", args)) => {
            let graph = load_graph(path(args, "catalog").as_deref())?;
            print_json(&summarize_graph(&graph))
        }
        Some(("ladder", args)) => {
            let start = *args.get_one::<f64>("start").context("--start")?;
            let target = *args.get_one::<f64>("target").context("--target is required")?;
            let rungs = *args.get_one::<usize>("rungs").context("--rungs")?;
            let curve = parse_curve(args.get_one::<String>("curve").context("--curve")?)?;
            print_json(&run_ladder(start, target, rungs, curve)?)
        }
        Some(("ramp", args)) => {
            let start = *args.get_one::<NaiveDate>("start").context("--start is required")?;
            let steps = args
                .get_many::<String>("step")
                .into_iter()
                .flatten()
                .map(|s| parse_ramp_step(s))
                .collect::<Result<Vec<_>>>()?;
            print_json(&run_ramp(&steps, start)?)
        }
        Some((name @ ("tree" | "pacing" | "freeze" | "review"), args)) => {
            let graph = load_graph(path(args, "catalog").as_deref())?;
            let config = load_config(path(args, "config").as_deref())?;
            let service = GoalsService::new(&graph, config).context("invalid engine config")?;
            let data = goal_data(args)?;
            match name {
                "tree" => {
                    let filters: Vec<String> = args
                        .get_many::<String>("filter")
                        .into_iter()
                        .flatten()
                        .cloned()
                        .collect();
                    let goals = run_tree(&service, &data, date_or_today(args, "as-of"), &filters)?;
                    print_json(&goals)
                }
                "pacing" => {
                    let goal = args.get_one::<String>("goal").context("--goal is required")?;
                    let report = run_pacing(
                        &service,
                        &data,
                        &GoalId::new(goal.as_str()),
                        date_or_today(args, "as-of"),
                    )?;
                    print_json(&report)
                }
                "freeze" => print_json(&run_freeze(&service, &data, date_or_today(args, "as-of"))),
                _ => print_json(&service.compute_weekly_review_data(
                    &data.goals,
                    &data.snapshots,
                    date_or_today(args, "week-of"),
                )),
            }
        }
        _ => Ok(()),
    }
}
