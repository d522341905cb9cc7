//! Answer one ego graph request event.
//!
//! Reads `{"queryStringParameters": {"band_name": ..., "radius"?: ..., "max_nodes"?: ...}}`
//! from stdin and prints `{"statusCode": N, "body": "<json>"}` to stdout.
//! The body is a path-mode ego graph on success or a JSON string message on
//! failure.
//!
//! Usage: ego-request --database /tmp/sim.db < event.json

use anyhow::{Context, Result};
use band_ego_graph::models::{CenterRef, PresentationMode};
use band_ego_graph::{run_query, EgoConfig, EgoError, QueryParams, SimilarityGraph};
use clap::Parser;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ego-request")]
#[command(about = "Serve a single ego graph request event from stdin")]
struct Args {
    #[arg(long, default_value = "/tmp/sim.db")]
    database: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RequestEvent {
    #[serde(rename = "queryStringParameters", default)]
    query: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
struct Reply {
    #[serde(rename = "statusCode")]
    status_code: u16,
    body: String,
}

impl Reply {
    fn message(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: serde_json::to_string(message).unwrap_or_default(),
        }
    }

    fn from_error(err: &EgoError) -> Self {
        Self::message(err.status_code(), &err.to_string())
    }
}

fn parse_param(
    query: &HashMap<String, String>,
    key: &str,
    default: i64,
) -> std::result::Result<i64, EgoError> {
    match query.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            EgoError::InvalidParameter(format!("{} must be an integer, got '{}'", key, raw))
        }),
    }
}

fn handle(event: &RequestEvent, database: &Path, config: &EgoConfig) -> Reply {
    let Some(query) = event.query.as_ref() else {
        return Reply::message(400, "You must specify a 'band_name' query");
    };
    let Some(band_name) = query.get("band_name") else {
        return Reply::message(400, "You must specify a 'band_name' query");
    };
    debug!("Got band_name={}", band_name);

    let params = match (
        parse_param(query, "radius", config.radius),
        parse_param(query, "max_nodes", config.max_nodes),
    ) {
        (Ok(radius), Ok(max_nodes)) => QueryParams::new(CenterRef::Name(band_name.clone()), config)
            .with_radius(radius)
            .with_max_nodes(max_nodes),
        (Err(e), _) | (_, Err(e)) => return Reply::from_error(&e),
    };
    // Bad parameters are reported before the database is touched
    if let Err(e) = params.validate() {
        return Reply::from_error(&e);
    }

    let graph = match SimilarityGraph::open(database) {
        Ok(graph) => graph,
        Err(e) => {
            error!("Couldn't load similarity database: {}", e);
            return Reply::message(500, "Couldn't load similarity database");
        }
    };

    let body = run_query(&graph, config, &params)
        .and_then(|outcome| outcome.response.to_json().map_err(EgoError::from));
    match body {
        Ok(body) => Reply {
            status_code: 200,
            body,
        },
        Err(e) => Reply::from_error(&e),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EgoConfig::from_file(path)?,
        None => EgoConfig::default(),
    };
    config.mode = PresentationMode::Path;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read request event from stdin")?;
    let reply = match serde_json::from_str::<RequestEvent>(&input) {
        Ok(event) => handle(&event, &args.database, &config),
        Err(e) => Reply::message(400, &format!("Malformed request event: {}", e)),
    };

    println!("{}", serde_json::to_string(&reply)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(pairs: &[(&str, &str)]) -> RequestEvent {
        RequestEvent {
            query: Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }

    fn path_config() -> EgoConfig {
        EgoConfig {
            mode: PresentationMode::Path,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_band_name() {
        let reply = handle(&RequestEvent::default(), Path::new("/nonexistent.db"), &path_config());
        assert_eq!(reply.status_code, 400);
        assert!(reply.body.contains("band_name"));

        let reply = handle(&event(&[("radius", "1")]), Path::new("/nonexistent.db"), &path_config());
        assert_eq!(reply.status_code, 400);
    }

    #[test]
    fn test_bad_radius_before_database() {
        let reply = handle(
            &event(&[("band_name", "Opeth"), ("radius", "-2")]),
            Path::new("/nonexistent.db"),
            &path_config(),
        );
        assert_eq!(reply.status_code, 400);

        let reply = handle(
            &event(&[("band_name", "Opeth"), ("max_nodes", "lots")]),
            Path::new("/nonexistent.db"),
            &path_config(),
        );
        assert_eq!(reply.status_code, 400);
        assert!(reply.body.contains("max_nodes must be an integer"));
    }

    #[test]
    fn test_unloadable_database() {
        let reply = handle(
            &event(&[("band_name", "Opeth")]),
            Path::new("/nonexistent/sim.db"),
            &path_config(),
        );
        assert_eq!(reply.status_code, 500);
    }

    fn fixture_db(dir: &Path) -> PathBuf {
        let db = dir.join("sim.db");
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE Bands (band_id INTEGER PRIMARY KEY, band TEXT NOT NULL, band_url TEXT);
             CREATE TABLE Similarities (band_id INTEGER, similar_to_id INTEGER, score INTEGER);
             INSERT INTO Bands VALUES (1, 'Opeth', NULL), (2, 'Katatonia', NULL), (3, 'Anathema', NULL);
             INSERT INTO Similarities VALUES (1, 2, 200), (2, 3, 90), (3, 2, 60);",
        )
        .unwrap();
        db
    }

    #[test]
    fn test_success_returns_path_mode_body() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixture_db(dir.path());
        let reply = handle(&event(&[("band_name", "Opeth")]), &db, &path_config());
        assert_eq!(reply.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body["nodes"][0]["name"], "Opeth");
        assert!(body["nodes"][0]["path"].as_array().unwrap().is_empty());
        assert_eq!(body["nodes"][2]["path"][1], "Katatonia");
        assert!(body.get("min_radius").is_none());
    }

    #[test]
    fn test_unknown_band_name() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixture_db(dir.path());
        let reply = handle(&event(&[("band_name", "Opet")]), &db, &path_config());
        assert_eq!(reply.status_code, 400);
        assert!(reply.body.contains("was not found"));
    }

    #[test]
    fn test_reply_serializes_status_code_key() {
        let json = serde_json::to_string(&Reply::message(404, "nope")).unwrap();
        assert_eq!(json, r#"{"statusCode":404,"body":"\"nope\""}"#);
    }
}
