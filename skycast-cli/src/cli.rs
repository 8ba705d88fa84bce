use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use skycast_core::{Config, Country, LookupPipeline, OpenWeatherApi, SearchRequest};

use crate::{form, view};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "City weather finder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key used for lookups.
    Configure,

    /// Look up current weather for a city/country pair.
    Search {
        /// City name; prompted for interactively when omitted.
        #[arg(long)]
        city: Option<String>,

        /// ISO country code, e.g. "US"; prompted for interactively when omitted.
        #[arg(long)]
        country: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { city, country } => search(city, country).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()
        .context("API key entry aborted")?;

    config.set_api_key(api_key);
    config.save()?;

    println!("API key saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn search(city: Option<String>, country: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let api_key = config.resolve_api_key()?;
    let pipeline = LookupPipeline::new(Box::new(OpenWeatherApi::new(api_key)));

    println!("{}", view::TITLE);

    // Both-or-either flag present: a single non-interactive lookup, run
    // through the same form validation as the prompts.
    if city.is_some() || country.is_some() {
        let draft = form::SearchDraft {
            city: city.unwrap_or_default(),
            country_code: country.unwrap_or_default(),
        };

        // The interactive select constrains the country to the reference
        // list; the flag path enforces the same constraint here.
        match draft.submit() {
            Ok(mut request) => match Country::by_code(&request.country_code) {
                Some(country) => {
                    request.country_code = country.code.to_string();
                    run_lookup(&pipeline, &request).await;
                }
                None => println!("{}", view::alert("Country code is not in the selection list")),
            },
            Err(message) => println!("{}", view::alert(message)),
        }

        return Ok(());
    }

    // Interactive loop; the draft persists between submissions.
    let mut draft = form::SearchDraft::default();
    loop {
        draft = form::prompt(&draft)?;

        match draft.submit() {
            Ok(request) => run_lookup(&pipeline, &request).await,
            Err(message) => println!("{}", view::alert(message)),
        }

        let again = inquire::Confirm::new("Search again?")
            .with_default(false)
            .prompt()
            .unwrap_or(false);
        if !again {
            return Ok(());
        }
    }
}

async fn run_lookup(pipeline: &LookupPipeline, request: &SearchRequest) {
    debug!(city = %request.city, country = %request.country_code, "starting lookup");

    println!("{}", view::loading_line());
    let outcome = pipeline.fetch_weather(request).await;

    print!("{}", view::render(&pipeline.state()));
    if let Some(line) = view::render_outcome(&outcome) {
        println!("{line}");
    }
}
