use std::env;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use clinicdb_core::config::Config;
use clinicdb_core::types::SortKey;
use clinicdb_query::QueryParser;
use clinicdb_session::{SearchSession, SearchView};

const USAGE: &str = "Usage: clinicdb <command> [args...]

Commands:
  parse <text>                       show how a query is understood
  search <text> [--sort KEY] [--page N]
                                     run a query against the data directory
  link <text>                        print the shareable link for a query
  open <query-string> [--page N]     restore a shared link and show results
  suggest <term> [--limit N]         list search suggestions";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

/// Splits `--flag value` pairs from the positional words.
fn split_flags(args: &[String]) -> anyhow::Result<(String, Vec<(String, String)>)> {
    let mut words = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(name) = arg.strip_prefix("--") {
            let value = iter
                .next()
                .ok_or_else(|| anyhow::anyhow!("--{name} needs a value"))?;
            flags.push((name.to_string(), value.clone()));
        } else {
            words.push(arg.as_str());
        }
    }
    Ok((words.join(" "), flags))
}

fn flag<'a>(flags: &'a [(String, String)], name: &str) -> Option<&'a str> {
    flags.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
}

fn parse_number(flags: &[(String, String)], name: &str, default: usize) -> anyhow::Result<usize> {
    flag(flags, name).map_or(Ok(default), |v| {
        v.parse().map_err(|e| anyhow::anyhow!("--{name} '{v}': {e}"))
    })
}

fn print_view(view: &SearchView<'_>) {
    println!("{}", view.interpretation);
    for applied in &view.applied {
        println!("  - {applied}");
    }
    println!(
        "{} result(s), page {} of {} (sorted by {})",
        view.total_results, view.page, view.total_pages, view.sort
    );
    for record in &view.items {
        let rating = record.rating().map_or_else(|| "unrated".to_string(), |r| format!("{r:.1}★"));
        println!("  {:<40} {:<20} {rating}", record.name, record.city);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let (cmd, args) = parse_args();
    let (text, flags) = split_flags(&args)?;

    match cmd.as_str() {
        "parse" => {
            let parser = QueryParser::with_cheap_thresholds(&config.parser_settings()?.cheap_thresholds);
            let parsed = parser.parse(&text);
            println!("interpretation: {}", parsed.interpretation);
            println!("confidence:     {}", parsed.confidence);
            for (facet, range) in &parsed.services {
                let range = range.map_or_else(|| "listed".to_string(), |r| format!("{r:?}"));
                println!("{:<15} {range}", facet.as_str());
            }
            if let Some(rating) = parsed.rating {
                println!("rating:         {rating:?}");
            }
            if !parsed.locations.is_empty() {
                println!("cities:         {}", parsed.locations.join(", "));
            }
            if !parsed.remainder.is_empty() {
                println!("remainder:      {}", parsed.remainder);
            }
            for hint in &parsed.suggestions {
                println!("hint: {hint}");
            }
        }
        "search" => {
            let mut session = SearchSession::from_config(&config)?;
            session.search_text(&text);
            if let Some(sort) = flag(&flags, "sort") {
                let sort: SortKey = sort.parse()?;
                session.set_sort(sort);
            }
            session.set_page(parse_number(&flags, "page", 1)?);
            print_view(&session.view());
        }
        "link" => {
            let mut session = SearchSession::from_config(&config)?;
            session.search_text(&text);
            println!("?{}", session.deep_link());
        }
        "open" => {
            let mut session = SearchSession::from_config(&config)?;
            session.open_deep_link(&text);
            session.set_page(parse_number(&flags, "page", 1)?);
            info!(query = session.controller().query(), "restored shared link");
            print_view(&session.view());
        }
        "suggest" => {
            let session = SearchSession::from_config(&config)?;
            for suggestion in session.suggestions(&text, parse_number(&flags, "limit", 10)?) {
                println!("{:<12} {}", suggestion.field.as_str(), suggestion.value);
            }
        }
        _ => {
            eprintln!("Unknown command: {cmd}\n\n{USAGE}");
            process::exit(1);
        }
    }
    Ok(())
}
