#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for dispatching mail requests from the command line
//!
//! Service configuration comes from the environment (see
//! [`MailerConfig::from_env`]); set `MAILER_FAKE=true` to exercise the
//! full request/reply path without a real SMTP server.

use clap::{Parser, Subcommand};
use mail_dispatch::{
    MailReply, MailRequest, Mailer, MailerConfig, Recipients, Status,
    is_valid_address,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailer-cli")]
#[command(
    about = "Dispatch mail requests through the mail-dispatch service"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Send a single message
    Send {
        /// Sender address
        #[arg(long)]
        from: String,

        /// Recipient address (repeatable)
        #[arg(long, required = true)]
        to: Vec<String>,

        /// Carbon-copy recipient (repeatable)
        #[arg(long)]
        cc: Vec<String>,

        /// Blind-carbon-copy recipient (repeatable)
        #[arg(long)]
        bcc: Vec<String>,

        /// Message subject
        #[arg(long)]
        subject: String,

        /// Message body
        #[arg(long)]
        body: String,
    },

    /// Check whether an address passes format validation
    Check {
        /// Address to validate
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let json = args.json;

    match args.command {
        Command::Send {
            from,
            to,
            cc,
            bcc,
            subject,
            body,
        } => {
            cmd_send(json, from, to, cc, bcc, subject, body).await?;
        }
        Command::Check { address } => {
            cmd_check(json, &address);
        }
    }

    Ok(())
}

async fn cmd_send(
    json: bool,
    from: String,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    subject: String,
    body: String,
) -> anyhow::Result<()> {
    let config = MailerConfig::from_env()?;
    let mailer = Mailer::start(&config)?;

    let mut request =
        MailRequest::new(from, Recipients::from(to), subject, body);
    request.cc = Recipients::from(cc);
    request.bcc = Recipients::from(bcc);

    let reply = mailer.dispatch(request).await?;
    print_reply(&reply, json)?;

    if reply.status == Status::Error {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_check(json: bool, address: &str) {
    let valid = is_valid_address(address);

    if json {
        println!(
            "{}",
            serde_json::json!({ "address": address, "valid": valid })
        );
    } else if valid {
        println!("valid");
    } else {
        println!("invalid");
    }

    if !valid {
        std::process::exit(1);
    }
}

fn print_reply(reply: &MailReply, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(reply)?);
    } else {
        match (reply.status, &reply.detail) {
            (Status::Ok, _) => println!("ok"),
            (Status::Error, Some(detail)) => println!("error: {detail}"),
            (Status::Error, None) => println!("error"),
        }
    }
    Ok(())
}
