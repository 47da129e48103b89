// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Pretty JSON output"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("One JSON object per line"),
    )
}

fn business_arg() -> Arg {
    Arg::new("business")
        .long("business")
        .short('b')
        .required(true)
        .help("Business name")
}

pub fn build_cli() -> Command {
    Command::new("costclip")
        .version(crate_version!())
        .about("Business cost simulation: fixed costs, category distribution and break-even")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging on stderr"),
        )
        .subcommand(Command::new("init").about("Create the database if missing"))
        .subcommand(
            Command::new("business")
                .about("Manage businesses")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("currency").long("currency")),
                )
                .subcommand(
                    Command::new("list").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Include deactivated businesses"),
                    ),
                )
                .subcommand(Command::new("rm").arg(Arg::new("name").required(true))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage cost categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("description").long("description"))
                        .arg(Arg::new("icon").long("icon"))
                        .arg(Arg::new("color").long("color").help("#RRGGBB")),
                )
                .subcommand(
                    Command::new("list").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Include deactivated categories"),
                    ),
                )
                .subcommand(Command::new("rm").arg(Arg::new("name").required(true))),
        )
        .subcommand(
            Command::new("cost")
                .about("Manage fixed cost records")
                .subcommand(
                    Command::new("add")
                        .arg(business_arg())
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_negative_numbers(true),
                        )
                        .arg(
                            Arg::new("frequency")
                                .long("frequency")
                                .default_value("monthly")
                                .help("monthly|semiannual|annual"),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("description").long("description"))
                        .arg(Arg::new("start").long("start").help("YYYY-MM-DD, defaults to today")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(business_arg()).arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Include deactivated costs"),
                    ),
                ))
                .subcommand(
                    Command::new("deactivate").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("product")
                .about("Manage products and their recipes")
                .subcommand(
                    Command::new("add")
                        .arg(business_arg())
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("price")
                                .long("price")
                                .required(true)
                                .allow_negative_numbers(true),
                        ),
                )
                .subcommand(json_flags(Command::new("list").arg(business_arg())))
                .subcommand(
                    Command::new("rm")
                        .arg(business_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(
                    Command::new("ingredient")
                        .about("Add a recipe line to a product")
                        .arg(business_arg())
                        .arg(Arg::new("product").long("product").required(true))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("quantity").long("quantity").required(true))
                        .arg(Arg::new("unit_cost").long("unit-cost").required(true)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Cost projections and break-even")
                .subcommand(json_flags(
                    Command::new("summary").arg(business_arg()).arg(
                        Arg::new("cached")
                            .long("cached")
                            .action(ArgAction::SetTrue)
                            .help("Reuse a fresh snapshot instead of recomputing"),
                    ),
                ))
                .subcommand(json_flags(Command::new("categories").arg(business_arg())))
                .subcommand(json_flags(Command::new("breakeven").arg(business_arg()))),
        )
        .subcommand(
            Command::new("import")
                .about("Import cost records")
                .subcommand(
                    Command::new("costs")
                        .arg(business_arg())
                        .arg(Arg::new("path").long("path").required(true)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export cost records")
                .subcommand(
                    Command::new("costs")
                        .arg(business_arg())
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true).help("currency|cache_days"))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check stored data for problems"))
}
