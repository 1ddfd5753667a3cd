use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, path::PathBuf};

use gesturectl::config::{Config, ConfigState};
use gesturectl::pipeline::{self, ListenOptions};
use gesturectl::replay;
use gesturectl::{EngineConfig, Extent, Point, Rect, clamp_position, input};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // Options first; whatever is left is positional
    let config_path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
    let device: Option<PathBuf> = pargs.opt_value_from_str("--device")?;
    let json = pargs.contains("--json");

    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("devices") => {
            let devices = input::discover_multitouch();
            if devices.is_empty() {
                println!("no multitouch devices detected");
            }
            for d in devices {
                println!("{}\t{}", d.path, d.name);
            }
            Ok(())
        }

        Some("doctor") => {
            let st = load_config(config_path)?;
            print_response(&st.doctor_report());
            Ok(())
        }

        Some("config") => {
            let st = load_config(config_path)?;
            println!("# {}", st.path.display());
            print!("{}", toml::to_string_pretty(&st.config)?);
            Ok(())
        }

        Some("listen") => {
            let st = load_config(config_path)?;
            pipeline::run_listen(st, ListenOptions { device, json })
        }

        Some("replay") => {
            let file: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl replay <file> [--config FILE]"))?;
            // replays are reproducible: built-in defaults unless a config is named
            let engine = match config_path {
                Some(p) => Config::load(&p)?.engine,
                None => EngineConfig::default(),
            };
            let report = replay::replay_file(&file, engine)?;
            for rec in &report.records {
                println!("{}", serde_json::to_string(rec)?);
            }
            if report.live_contacts > 0 {
                eprintln!(
                    "warning: {} contact(s) never ended; engine left in {:?}",
                    report.live_contacts, report.final_state
                );
            }
            Ok(())
        }

        Some("clamp") => {
            let usage =
                "usage: gesturectl clamp <x> <y> <left> <top> <right> <bottom> <width> <height>";
            let mut v = [0f32; 8];
            for slot in v.iter_mut() {
                *slot = pargs.free_from_str().map_err(|_| anyhow!(usage))?;
            }
            let p = clamp_position(
                Point::new(v[0], v[1]),
                Rect {
                    left: v[2],
                    top: v[3],
                    right: v[4],
                    bottom: v[5],
                },
                Extent {
                    width: v[6],
                    height: v[7],
                },
            );
            println!("{} {}", p.x, p.y);
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<ConfigState> {
    match path {
        Some(p) => ConfigState::load_from(p),
        None => ConfigState::load_or_install_default(),
    }
}

fn print_help() {
    println!(
        r#"gesturectl — multitouch gesture recognizer

USAGE:
  gesturectl help [command]               Show general or command-specific help
  gesturectl devices                      List multitouch input devices
  gesturectl doctor                       Diagnose permissions/devices
  gesturectl config                       Show the effective configuration
  gesturectl listen [--device PATH] [--json]
                                          Recognize gestures from a live device
  gesturectl replay <file>                Run recorded contact events (JSON lines)
  gesturectl clamp <x> <y> <l> <t> <r> <b> <w> <h>
                                          Clamp a drag position into bounds

OPTIONS:
  --config FILE                           Use FILE instead of ~/.config/gesturectl/config.toml

TIPS:
  - RUST_LOG=debug shows gesture state transitions
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "devices" => println!("usage: gesturectl devices\nLists /dev/input devices with multitouch slots."),
        "doctor" => println!(
            "usage: gesturectl doctor\nChecks input group membership and lists detected multitouch devices."
        ),
        "config" => println!(
            "usage: gesturectl config [--config FILE]\nPrints the config path and its parsed contents; installs the default on first use."
        ),
        "listen" => println!(
            "usage: gesturectl listen [--device PATH] [--json] [--config FILE]\nReads a multitouch device and prints gestures until SIGINT/SIGTERM.\nEdits to the config file apply once all fingers are lifted."
        ),
        "replay" => println!(
            "usage: gesturectl replay <file> [--config FILE]\nEach line is a contact event, e.g.\n  {{\"kind\":\"start\",\"id\":1,\"x\":0,\"y\":0,\"timestamp\":0}}\n  {{\"kind\":\"move\",\"id\":1,\"x\":20,\"y\":0,\"timestamp\":50}}\n  {{\"kind\":\"end\",\"id\":1,\"timestamp\":100}}\nPrints gestures, warnings and rejected events as JSON lines.\nUses built-in engine defaults unless --config is given."
        ),
        "clamp" => println!(
            "usage: gesturectl clamp <x> <y> <left> <top> <right> <bottom> <width> <height>\nPrints the position of an extent kept inside the bounds."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
