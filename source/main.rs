// Thin demonstration binary (SPEC_FULL.md §1): connect, log in, list
// folders, show a STATUS summary, exercising the ambient stack (CLI
// parsing, logging, TLS) the way the teacher's source/main.rs exercised
// its own sync engine. Not a sync tool: all engine behavior lives in the
// library crate.

use clap::Parser as _;
use std::path;

#[derive(clap::Parser)]
struct Arguments {
  #[arg(long, help = "IMAP server address")]
  address: String,
  #[arg(long, default_value_t = 993, help = "IMAP server port")]
  port: u16,
  #[arg(long, help = "Dial with STARTTLS instead of implicit TLS")]
  starttls: bool,
  #[arg(long, help = "Dial without any TLS at all")]
  plain: bool,
  #[arg(long, help = "Login user")]
  user: String,
  #[arg(long, help = "Login password")]
  password: String,
  #[arg(long, help = "Mailbox pattern to LIST", default_value = "*")]
  pattern: String,
  #[arg(
    long = "log-directory",
    help = "Log directory",
    default_value_t = String::from("$ENV{XDG_RUNTIME_DIR}")
  )]
  pub log_directory: String,
  #[clap(flatten)]
  verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,
}

fn init_logging(arguments: &Arguments) -> anyhow::Result<()> {
  let encoder = Box::new(log4rs::encode::pattern::PatternEncoder::new(
    "{d(%F %T)} {l} {t} - {m}{n}",
  ));
  log4rs::init_config(
    log4rs::config::Config::builder()
      .appender(
        log4rs::config::Appender::builder()
          .filter(Box::new(log4rs::filter::threshold::ThresholdFilter::new(
            log::LevelFilter::Trace,
          )))
          .build(
            "file",
            Box::new(
              log4rs::append::file::FileAppender::builder()
                .encoder(encoder.clone())
                .build(path::Path::new(&arguments.log_directory).join("rimap-cli.log"))?,
            ),
          ),
      )
      .appender(
        log4rs::config::Appender::builder()
          .filter(Box::new(log4rs::filter::threshold::ThresholdFilter::new(
            arguments.verbose.log_level_filter(),
          )))
          .build(
            "console",
            Box::new(
              log4rs::append::console::ConsoleAppender::builder()
                .encoder(encoder)
                .build(),
            ),
          ),
      )
      .build(
        log4rs::config::Root::builder()
          .appenders(["console", "file"])
          .build(log::LevelFilter::Trace),
      )?,
  )?;
  Ok(())
}

fn main() -> anyhow::Result<()> {
  let arguments = Arguments::parse();
  init_logging(&arguments)?;

  let security = match (arguments.plain, arguments.starttls) {
    (true, _) => rimap::Security::Plain,
    (false, true) => rimap::Security::StartTls,
    (false, false) => rimap::Security::Tls,
  };
  let authenticator = Box::new(rimap::StaticCredentials::new(&arguments.user, &arguments.password));
  let mut store = rimap::Store::connect(
    &arguments.address,
    arguments.port,
    security,
    authenticator,
    rimap::Context::default(),
  )?;

  log::info!(
    "connected to {}:{} (hierarchy separator: {:?})",
    arguments.address,
    arguments.port,
    store.hierarchy_separator().map(|b| b as char),
  );

  for listing in store.list("", &arguments.pattern)? {
    let status = store.status(&listing.path).unwrap_or_default();
    println!(
      "{}\tmessages={} unseen={} uidvalidity={} uidnext={}",
      listing.path, status.message_count, status.unseen, status.uid_validity, status.uid_next,
    );
  }

  store.disconnect()
}
