use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, bail, Context};
use tokio;

use clonehub::git;
use clonehub::github;
use clonehub::summary::BatchSummary;


const DEFAULT_CLONE_DIR: &'static str = "repos";


#[derive(Debug, PartialEq)]
enum Mode {
    Starred(String),
    Org(String),
}

#[derive(Debug, PartialEq)]
struct Config {
    token: String,
    mode: Mode,
    clone_dir: PathBuf,
}

impl Config {
    /// Build the run configuration from parsed options, falling back to
    /// `env_token` when `--token` was not given.
    fn from_matches(
        matches: &getopts::Matches,
        env_token: Option<String>,
    ) -> anyhow::Result<Self> {
        let token = matches.opt_str("token")
            .or(env_token)
            .ok_or_else(|| {
                anyhow!("no token given (use --token or GITHUB_TOKEN)")
            })?;

        let mode = match (matches.opt_str("starred"), matches.opt_str("org")) {
            (Some(user), None) => Mode::Starred(user),
            (None, Some(org)) => Mode::Org(org),
            (Some(_), Some(_)) =>
                bail!("--starred and --org are mutually exclusive"),
            (None, None) => bail!("one of --starred or --org is required"),
        };

        let clone_dir = matches.opt_str("clone-dir")
            .unwrap_or_else(|| DEFAULT_CLONE_DIR.to_owned());

        Ok(
            Config {
                token: token,
                mode: mode,
                clone_dir: clone_dir.into(),
            }
        )
    }
}


fn options() -> getopts::Options {
    let mut opts = getopts::Options::new();

    opts.optopt("", "token", "GitHub personal access token", "TOKEN");
    opts.optopt("", "starred", "clone the repositories USER has starred", "USER");
    opts.optopt("", "org", "clone the repositories of ORG and its members", "ORG");
    opts.optopt(
        "",
        "clone-dir",
        &format!("directory to clone into (default: {})", DEFAULT_CLONE_DIR),
        "DIR",
    );
    opts.optflag("h", "help", "print this help menu");
    opts.optflag("V", "version", "show the program version");

    opts
}

fn print_usage(opts: &getopts::Options) {
    print!(
        "{}",
        opts.usage(
            "usage: clonehub --token TOKEN (--starred USER | --org ORG) [--clone-dir DIR]",
        ),
    );
}


/// List the repositories for the selected mode.
///
/// Organization mode concatenates the organization's own repositories
/// with those of each of its members, in API order.
async fn list_repos(
    client: &github::Client,
    mode: &Mode,
) -> Result<Vec<github::Repo>, github::Error> {
    match mode {
        Mode::Starred(user) => client.starred_repos(user).await,
        Mode::Org(org) => {
            let mut repos = client.org_repos(org).await?;

            for member in client.org_members(org).await? {
                repos.extend(client.user_repos(&member.login).await?);
            }

            Ok(repos)
        },
    }
}

async fn run(config: &Config) -> anyhow::Result<BatchSummary> {
    fs::create_dir_all(&config.clone_dir)
        .with_context(|| format!(
            "unable to create clone directory '{}'",
            config.clone_dir.display(),
        ))?;

    let client = github::Client::new(&config.token)?;

    let repos = list_repos(&client, &config.mode).await
        .context("unable to fetch the repository list")?;

    println!(
        "{} repositories to clone into '{}'",
        repos.len(),
        config.clone_dir.display(),
    );

    Ok(git::clone_all(&repos, &config.clone_dir))
}


#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let opts = options();
    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(exitcode::USAGE);
        },
    };

    if matches.opt_present("h") {
        print_usage(&opts);
        process::exit(exitcode::OK);
    }

    if matches.opt_present("V") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        process::exit(exitcode::OK);
    }

    let env_token = std::env::var("GITHUB_TOKEN").ok();
    let config = match Config::from_matches(&matches, env_token) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            print_usage(&opts);
            process::exit(exitcode::USAGE);
        },
    };

    match run(&config).await {
        Ok(summary) => {
            println!("{}", summary);

            if summary.has_failures() {
                process::exit(exitcode::SOFTWARE);
            }
        },
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(exitcode::SOFTWARE);
        },
    }
}
