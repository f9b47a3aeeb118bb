use std::fs;
use std::process::ExitCode;

use clap::{value_parser, Arg, ArgAction, Command};
use log::warn;

use tabulator::midi::{write_smf, SmfScore};
use tabulator::parse::parse_tab_with_ticks;
use tabulator::render::render_tab;
use tabulator::timeline::defaults::DEFAULT_VELOCITY;
use tabulator::timeline::{build_timeline, TimelineOptions};
use tabulator::models::timing::{ticks_per_whole, DEFAULT_PPQ};

fn build_cli() -> Command {
    Command::new("tabulator")
        .about("Convert extended ASCII guitar tablature to a Standard MIDI File")
        .arg(
            Arg::new("input")
                .required(true)
                .help("tab text file to read"),
        )
        .arg(
            Arg::new("output")
                .required(true)
                .help("MIDI file to write"),
        )
        .arg(
            Arg::new("ticks")
                .long("ticks")
                .value_parser(value_parser!(u16).range(1..))
                .default_value("480")
                .help("ticks per quarter note (PPQ)"),
        )
        .arg(
            Arg::new("velocity")
                .long("velocity")
                .value_parser(value_parser!(u8).range(1..=127))
                .default_value("90")
                .help("note-on velocity"),
        )
        .arg(
            Arg::new("tempo")
                .long("tempo")
                .value_parser(value_parser!(f64))
                .help("override every tempo marker with this quarter-note BPM"),
        )
        .arg(
            Arg::new("dump-json")
                .long("dump-json")
                .action(ArgAction::SetTrue)
                .help("print the parsed score as JSON instead of writing MIDI"),
        )
        .arg(
            Arg::new("dump-tab")
                .long("dump-tab")
                .action(ArgAction::SetTrue)
                .help("print the re-rendered tab text instead of writing MIDI"),
        )
}

fn run() -> tabulator::Result<()> {
    let matches = build_cli().get_matches();

    let input_path = matches.get_one::<String>("input").expect("required");
    let output_path = matches.get_one::<String>("output").expect("required");
    let ppq = *matches.get_one::<u16>("ticks").unwrap_or(&DEFAULT_PPQ);
    let velocity = *matches
        .get_one::<u8>("velocity")
        .unwrap_or(&DEFAULT_VELOCITY);
    let tempo_override = matches.get_one::<f64>("tempo").copied();

    let text = fs::read_to_string(input_path)?;
    let score = parse_tab_with_ticks(&text, ticks_per_whole(ppq))?;

    for warning in score.warnings.iter() {
        match warning.col {
            Some(col) => warn!(
                "line {}, col {}: {} ({:?})",
                warning.line, col, warning.message, warning.kind
            ),
            None => warn!("line {}: {} ({:?})", warning.line, warning.message, warning.kind),
        }
    }

    if matches.get_flag("dump-json") {
        println!("{}", serde_json::to_string_pretty(&score)?);
        return Ok(());
    }
    if matches.get_flag("dump-tab") {
        print!("{}", render_tab(&score));
        return Ok(());
    }

    let opts = TimelineOptions {
        ppq,
        velocity,
        tempo_override,
    };
    let timeline = build_timeline(&score, &opts);
    let smf = SmfScore::from_timeline(&timeline);
    let mut bytes = Vec::new();
    write_smf(&smf, &mut bytes)?;
    fs::write(output_path, bytes)?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
