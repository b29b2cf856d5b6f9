use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};
use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};

use nextchar_core::io::{CORPUS_EXTENSION, list_corpora, normalize_folder};
use nextchar_core::{LoadError, Predictor};

#[derive(Parser)]
#[command(name = "nextchar-server", about = "Serves next-character rankings over HTTP")]
struct Args {
	/// Folder holding `<name>.dat` corpus files
	#[arg(short, long, default_value = "./data")]
	data: String,

	/// Corpus loaded at startup (file name without extension)
	#[arg(short, long)]
	corpus: Option<String>,

	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(short, long, default_value_t = 5000)]
	port: u16,
}

/// Query parameters for the ranking endpoints.
#[derive(Deserialize)]
struct HistoryQuery {
	/// Explicit history tail; the session's own history when absent
	history: Option<String>,
}

#[derive(Deserialize)]
struct AcceptQuery {
	#[serde(rename = "char")]
	character: Option<String>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct CandidateScores {
	candidate: char,
	scores: Vec<f64>,
}

/// One typing session shared by every client of the server.
struct SharedData {
	data_folder: PathBuf,
	/// `None` until a corpus loads successfully
	predictor: Option<Predictor>,
}

impl SharedData {
	fn load(&mut self, name: &str) -> Result<(), LoadError> {
		let path = self.data_folder.join(format!("{name}.{CORPUS_EXTENSION}"));
		let predictor = Predictor::open(&path)?;
		info!("Loaded corpus {name} ({} contexts)", predictor.store().corpus().len());
		self.predictor = Some(predictor);
		Ok(())
	}
}

type Shared = web::Data<Mutex<SharedData>>;

const NO_CORPUS: &str = "No corpus loaded";

fn ranking_body(ranking: Vec<char>) -> String {
	ranking.into_iter().collect()
}

/// HTTP GET endpoint `/v1/rank`
///
/// Returns the 27 candidates as one string, best first. Uses `?history=`
/// when given, the session history otherwise. Never mutates the session.
#[get("/v1/rank")]
async fn get_rank(data: Shared, query: web::Query<HistoryQuery>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	let Some(predictor) = &shared_data.predictor else {
		return HttpResponse::ServiceUnavailable().body(NO_CORPUS);
	};

	let ranking = match &query.history {
		Some(history) => predictor.rank(history),
		None => predictor.predictions(),
	};
	HttpResponse::Ok().body(ranking_body(ranking))
}

/// HTTP PUT endpoint `/v1/accept?char=e`
///
/// Accepts exactly one character and returns the updated ranking.
#[put("/v1/accept")]
async fn put_accept(data: Shared, query: web::Query<AcceptQuery>) -> impl Responder {
	let mut chars = query.character.as_deref().unwrap_or_default().chars();
	let character = match (chars.next(), chars.next()) {
		(Some(c), None) => c,
		_ => return HttpResponse::BadRequest().body("Expected exactly one character in 'char'"),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	let Some(predictor) = shared_data.predictor.as_mut() else {
		return HttpResponse::ServiceUnavailable().body(NO_CORPUS);
	};

	HttpResponse::Ok().body(ranking_body(predictor.accept_and_rank(character)))
}

#[get("/v1/history")]
async fn get_history(data: Shared) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	match &shared_data.predictor {
		Some(predictor) => HttpResponse::Ok().body(predictor.history()),
		None => HttpResponse::ServiceUnavailable().body(NO_CORPUS),
	}
}

/// HTTP GET endpoint `/v1/scores`
///
/// JSON list of candidates in ranked order with their key vectors.
#[get("/v1/scores")]
async fn get_scores(data: Shared, query: web::Query<HistoryQuery>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	let Some(predictor) = &shared_data.predictor else {
		return HttpResponse::ServiceUnavailable().body(NO_CORPUS);
	};

	let history = query.history.clone().unwrap_or_else(|| predictor.history());
	let scores: Vec<CandidateScores> = predictor
		.scores(&history)
		.into_iter()
		.map(|(candidate, scores)| CandidateScores { candidate, scores })
		.collect();
	HttpResponse::Ok().json(scores)
}

#[get("/v1/corpora")]
async fn get_corpora(data: Shared) -> impl Responder {
	let data_folder = match data.lock() {
		Ok(m) => m.data_folder.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	match list_corpora(&data_folder) {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

/// HTTP PUT endpoint `/v1/load_corpus?name=freqs`
///
/// Starts a fresh session over the named corpus. On failure the current
/// session is left untouched.
#[put("/v1/load_corpus")]
async fn put_load_corpus(data: Shared, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	if name.contains(['/', '\\']) || name.contains("..") {
		return HttpResponse::BadRequest().body("Corpus name must be a plain file name");
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	match shared_data.load(name) {
		Ok(()) => HttpResponse::Ok().body("Corpus loaded successfully"),
		Err(e) => {
			error!("Failed to load corpus {name}: {e}");
			HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}"))
		}
	}
}

fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_rank)
		.service(put_accept)
		.service(get_history)
		.service(get_scores)
		.service(get_corpora)
		.service(put_load_corpus);
}

/// Main entry point for the server.
///
/// Optionally loads a corpus, wraps the session in a `Mutex`, and starts
/// an actix-web server. A corpus named on the command line must load, or
/// the server does not start.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let args = Args::parse();

	let mut shared_data = SharedData {
		data_folder: normalize_folder(&args.data),
		predictor: None,
	};
	if let Some(name) = &args.corpus {
		shared_data.load(name).map_err(std::io::Error::other)?;
	}
	let shared_session = web::Data::new(Mutex::new(shared_data));

	info!("Listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_session.clone())
			.configure(configure)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
