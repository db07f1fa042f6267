// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn location_arg() -> Arg {
    Arg::new("location")
        .long("location")
        .short('l')
        .required(true)
        .help("Registered location name")
}

fn range_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("from")
            .long("from")
            .help("Start date (default: a week before --to)"),
    )
    .arg(Arg::new("to").long("to").help("End date (default: today)"))
}

fn date_arg() -> Arg {
    Arg::new("date")
        .long("date")
        .help("Report date (default: today)")
}

fn basis_arg() -> Arg {
    Arg::new("basis")
        .long("basis")
        .default_value("year")
        .help("Compare against the same period a year or a month earlier (year|month)")
}

pub fn build_cli() -> Command {
    Command::new("dealermargin")
        .version(clap::crate_version!())
        .about("Per-unit vehicle sale margins and periodic dealership summaries")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Registry database path (default: platform data dir)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity"),
        )
        .subcommand(Command::new("init").about("Create the registry database"))
        .subcommand(
            Command::new("location")
                .about("Manage dealership databases")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("path")
                                .long("path")
                                .required(true)
                                .help("SQLite database of this location"),
                        )
                        .arg(
                            Arg::new("schema")
                                .long("schema")
                                .required(true)
                                .help("Schema variant: full|reduced"),
                        )
                        .arg(
                            Arg::new("init")
                                .long("init")
                                .action(ArgAction::SetTrue)
                                .help("Create the dealership tables if missing"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("remove").arg(Arg::new("name").required(true))),
        )
        .subcommand(
            Command::new("config")
                .about("Registry settings")
                .subcommand(
                    Command::new("set-currency").arg(Arg::new("symbol").required(true)),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(
            Command::new("import").subcommand(
                Command::new("sales")
                    .about("Load flat sale rows from CSV into a location")
                    .arg(location_arg())
                    .arg(Arg::new("path").long("path").required(true)),
            ),
        )
        .subcommand(
            Command::new("margin")
                .about("Per-vehicle margin tools")
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Step-by-step margin of one vehicle")
                        .arg(Arg::new("term").required(true))
                        .arg(location_arg())
                        .arg(
                            Arg::new("by")
                                .long("by")
                                .default_value("frame")
                                .help("frame|order|handover"),
                        ),
                ))
                .subcommand(json_flags(range_args(
                    Command::new("list")
                        .about("Margins for every vehicle handed over in a range")
                        .arg(location_arg())
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(
                            Arg::new("summary-only")
                                .long("summary-only")
                                .action(ArgAction::SetTrue),
                        ),
                )))
                .subcommand(json_flags(range_args(
                    Command::new("reconcile")
                        .about("List vehicles where the payment-split formula disagrees")
                        .arg(location_arg()),
                ))),
        )
        .subcommand(
            Command::new("report")
                .about("Periodic summaries")
                .subcommand(json_flags(
                    Command::new("period")
                        .arg(location_arg())
                        .arg(date_arg())
                        .arg(basis_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("all").arg(date_arg()).arg(basis_arg()),
                ))
                .subcommand(json_flags(Command::new("supervisors").arg(date_arg()))),
        )
        .subcommand(
            Command::new("export").subcommand(range_args(
                Command::new("margins")
                    .arg(location_arg())
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            )),
        )
        .subcommand(range_args(
            Command::new("doctor")
                .about("Check a location's data for gaps")
                .arg(location_arg()),
        ))
}
