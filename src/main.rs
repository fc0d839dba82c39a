use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use libris::api::{Book, BookApi, BookQuery, LoginRequest};
use libris::config::Config;
use libris::http::{CacheConfig, ConsoleNotifier, HttpClient, Navigator, RequestOptions};
use libris::logging;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "libris")]
#[command(about = "Command-line client for the Libris book-management API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/libris/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Mirror logs to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Book records
  #[command(subcommand)]
  Books(BooksCommand),
  /// Sign in; the password is read from LIBRIS_PASSWORD
  Login { name: String },
  Logout,
  /// Issue an arbitrary API request and print the envelope payload
  Request {
    #[arg(value_parser = parse_method)]
    method: Method,
    path: String,
    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,
    /// JSON request body
    #[arg(short, long)]
    body: Option<String>,
    #[arg(long, default_value_t = 0)]
    retry: u32,
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Cache the response for this many milliseconds
    #[arg(long)]
    cache_ttl: Option<u64>,
  },
  /// Save a raw response body to a file
  Download { path: String, dest: PathBuf },
  /// Upload a file as multipart form data
  Upload { path: String, file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum BooksCommand {
  List {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    author: Option<String>,
  },
  /// Fetch one or more books by id
  Get {
    #[arg(required = true)]
    ids: Vec<String>,
  },
  Search { keyword: String },
  /// Create a book from a JSON document
  Create { json: String },
  /// Apply a partial JSON update
  Update { id: String, json: String },
  Delete { id: String },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
  s.split_once('=')
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn parse_method(s: &str) -> Result<Method, String> {
  Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

/// Tells the user to sign in again when the session is rejected.
struct CliNavigator;

impl Navigator for CliNavigator {
  fn redirect_to_login(&self) {
    eprintln!("Session expired. Run `libris login <name>` to sign in again.");
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init_tracing(&config.log_level, args.verbose)?;

  let http = HttpClient::new(&config)?
    .with_notifier(Arc::new(ConsoleNotifier))
    .with_navigator(Arc::new(CliNavigator));
  let api = BookApi::new(http.clone());

  tokio::select! {
    result = run(args.command, &api) => result,
    _ = tokio::signal::ctrl_c() => {
      let cancelled = http.cancel_all();
      info!(cancelled, "interrupted");
      Err(eyre!("Interrupted"))
    }
  }
}

async fn run(command: Command, api: &BookApi) -> Result<()> {
  match command {
    Command::Books(books) => run_books(books, api).await,
    Command::Login { name } => {
      let request = LoginRequest {
        name,
        password: Config::get_password()?,
      };
      print_json(api.login(&request, true).await?)
    }
    Command::Logout => print_json(api.logout().await?),
    Command::Request {
      method,
      path,
      params,
      body,
      retry,
      timeout_ms,
      cache_ttl,
    } => {
      let mut options = RequestOptions::new().method(method).retry(retry).throw_error(true);
      for (key, value) in params {
        options = options.param(key, value);
      }
      if let Some(body) = body {
        options = options.json(parse_json(&body)?);
      }
      if let Some(ms) = timeout_ms {
        options = options.timeout(Duration::from_millis(ms));
      }
      if let Some(ms) = cache_ttl {
        options = options.cache(CacheConfig::with_ttl(Duration::from_millis(ms)));
      }
      print_json(api.http().request::<Value>(&path, options).await?)
    }
    Command::Download { path, dest } => {
      let written = api.http().download(&path, &dest).await?;
      info!(path = %path, bytes = written, "downloaded");
      println!("{} bytes written to {}", written, dest.display());
      Ok(())
    }
    Command::Upload { path, file } => {
      let bytes = tokio::fs::read(&file)
        .await
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
      let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
      let result = api
        .http()
        .upload::<Value>(&path, &file_name, bytes, RequestOptions::new())
        .await?;
      print_json(result)
    }
  }
}

async fn run_books(command: BooksCommand, api: &BookApi) -> Result<()> {
  match command {
    BooksCommand::List {
      page,
      page_size,
      name,
      author,
    } => {
      let query = BookQuery {
        current: page,
        page_size,
        name,
        author,
        ..BookQuery::default()
      };
      print_json(api.list(&query).await?)
    }
    BooksCommand::Get { ids } => {
      let books = join_all(ids.iter().map(|id| api.get(id))).await;
      let books = books.into_iter().collect::<Result<Vec<_>, _>>()?;
      print_json(Some(books))
    }
    BooksCommand::Search { keyword } => print_json(api.search(&keyword).await?),
    BooksCommand::Create { json } => {
      let book: Book =
        serde_json::from_str(&json).map_err(|e| eyre!("Invalid book JSON: {}", e))?;
      print_json(api.create(&book).await?)
    }
    BooksCommand::Update { id, json } => print_json(api.update(&id, &parse_json(&json)?).await?),
    BooksCommand::Delete { id } => print_json(api.delete(&id).await?),
  }
}

fn parse_json(raw: &str) -> Result<Value> {
  serde_json::from_str(raw).map_err(|e| eyre!("Invalid JSON '{}': {}", raw, e))
}

/// Print a payload as pretty JSON; `None` means the failure was already reported.
fn print_json<T: Serialize>(value: Option<T>) -> Result<()> {
  match value {
    Some(value) => {
      let out =
        serde_json::to_string_pretty(&value).map_err(|e| eyre!("Failed to format output: {}", e))?;
      println!("{}", out);
      Ok(())
    }
    None => Err(eyre!("Request failed")),
  }
}
