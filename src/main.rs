use crate::config::{load_config, Settings};
use crate::fetch::fetch_latest;
use crate::report::{MailSender, SmtpMailer};
use crate::retention::{enforce_retention, RetentionOutcome};
use crate::ssh::{RemoteStore, SftpStore};
use chrono::{Local, NaiveDate};
use std::io;
use std::path::PathBuf;
use structopt::StructOpt;

mod config;
mod fetch;
mod report;
mod retention;
mod ssh;

#[derive(StructOpt)]
#[structopt(name = "backup-courier", about = "A CLI for staging appliance backups")]
struct Cli {
    #[structopt(subcommand)]
    command: Command,

    #[structopt(short = "c", long = "config", parse(from_os_str))]
    config_path: Option<PathBuf>,
}

#[derive(StructOpt)]
enum Command {
    /// Fetch the latest backup, prune stale copies and email a report
    Run,
    /// Fetch the latest remote backup into the staging directory
    Fetch,
    /// Prune staged backups older than the retention window
    Prune,
    /// List the remote backup directory
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::from_args();

    let config_path = args.config_path.unwrap_or_else(|| PathBuf::from("config.toml"));
    let settings = load_config(config_path)?;

    match args.command {
        Command::Run => {
            let remote = SftpStore::new(&settings);
            let mailer = SmtpMailer::new(&settings);
            run_job(&settings, &remote, &mailer, Local::now().date_naive())?;
        }
        Command::Fetch => {
            let remote = SftpStore::new(&settings);
            fetch_latest(&settings, &remote)?;
        }
        Command::Prune => {
            match enforce_retention(&settings, Local::now().date_naive())? {
                RetentionOutcome::Pruned { deleted, remaining } => {
                    println!("Pruned {} file(s), {} remaining.", deleted.len(), remaining);
                }
                RetentionOutcome::LowCount { expected, actual } => {
                    println!("ERROR: Expected {} backup files, got {}", expected, actual);
                }
            }
        }
        Command::List => {
            let remote = SftpStore::new(&settings);
            println!("Available backups in remote directory:");
            for name in remote.list()? {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

/// Full pipeline: fetch, prune, report. A fatal fetch or prune error still gets
/// an error report dispatched before the error reaches the exit status.
fn run_job(
    settings: &Settings,
    remote: &dyn RemoteStore,
    mailer: &dyn MailSender,
    today: NaiveDate,
) -> io::Result<()> {
    match fetch_and_prune(settings, remote, today) {
        Ok(report) => mailer.send(&report),
        Err(e) => {
            if let Err(mail_err) = mailer.send(&report::run_failure(&e)) {
                println!("Failed to send failure report: {}", mail_err);
            }
            Err(e)
        }
    }
}

fn fetch_and_prune(
    settings: &Settings,
    remote: &dyn RemoteStore,
    today: NaiveDate,
) -> io::Result<report::Report> {
    let latest = fetch_latest(settings, remote)?;
    let outcome = enforce_retention(settings, today)?;

    Ok(match outcome {
        RetentionOutcome::Pruned { deleted, .. } => {
            report::success(&latest.staged_name, deleted.len())
        }
        RetentionOutcome::LowCount { expected, actual } => report::low_count(expected, actual),
    })
}
