//! `kitepaint` command-line entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use kite_api::{CachePolicy, KitePaintClient};
use kite_cli::commands::{self, ListOptions};
use kite_cli::{setup_tracing, CliConfig};
use kite_model::{DesignId, ProductId};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("kitepaint")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compose and manage KitePaint designs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .global(true)
                .help("Front-end host whose backend to use (e.g. kitepaint.com)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(
            Command::new("compose")
                .about("Compose every variation of a product offline")
                .arg(
                    Arg::new("product")
                        .long("product")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Product JSON (colors and variations)"),
                )
                .arg(
                    Arg::new("colors")
                        .long("colors")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Applied colors JSON: variation -> panel -> color"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory for <variation>.svg files"),
                ),
        )
        .subcommand(
            Command::new("product")
                .about("Fetch and summarize a product")
                .arg(Arg::new("id").required(true).help("Product id")),
        )
        .subcommand(
            Command::new("designs")
                .about("List saved designs, newest first")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Designs to list (default: feed page size)"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Include unpublished designs"),
                )
                .arg(
                    Arg::new("no-cache")
                        .long("no-cache")
                        .action(ArgAction::SetTrue)
                        .help("Bypass the request cache"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a design")
                .arg(Arg::new("id").required(true).help("Design id")),
        )
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("missing <{name}>"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    setup_tracing(matches.get_flag("verbose"));

    let config = CliConfig::resolve(
        matches.get_one::<PathBuf>("config").map(PathBuf::as_path),
        matches.get_one::<String>("host").map(String::as_str),
    )?;
    let mut stdout = std::io::stdout().lock();

    match matches.subcommand() {
        Some(("compose", args)) => {
            let product = args.get_one::<PathBuf>("product").context("missing --product")?;
            let colors = args.get_one::<PathBuf>("colors").context("missing --colors")?;
            let out_dir = args.get_one::<PathBuf>("out").context("missing --out")?;
            commands::compose_files(product, colors, out_dir, &config.editor, &mut stdout)?;
        }
        Some(("product", args)) => {
            let client = KitePaintClient::connect(&config.client)?;
            let id = ProductId::new(required(args, "id")?.as_str());
            commands::show_product(&client, &id, &mut stdout).await?;
        }
        Some(("designs", args)) => {
            let client = KitePaintClient::connect(&config.client)?;
            let options = ListOptions {
                limit: args
                    .get_one::<usize>("limit")
                    .copied()
                    .unwrap_or(config.feed.page_size),
                include_private: args.get_flag("all") || !config.feed.public_only,
                cache: if args.get_flag("no-cache") {
                    CachePolicy::Bypass
                } else {
                    CachePolicy::Use
                },
            };
            let count = commands::list_designs(&client, options, &mut stdout).await?;
            tracing::debug!(count, "designs listed");
        }
        Some(("delete", args)) => {
            let client = KitePaintClient::connect(&config.client)?;
            let id = DesignId::new(required(args, "id")?.as_str());
            commands::delete_design(&client, &id, &mut stdout).await?;
        }
        _ => unreachable!("subcommand_required"),
    }

    Ok(())
}
