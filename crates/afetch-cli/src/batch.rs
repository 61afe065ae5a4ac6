//! Batch dispatch of the fetch command
//!
//! The command takes a whitespace-separated list of identifiers plus
//! keyword-style options. Arguments are validated up front; only then is the
//! batch run, either inline or as a background task.

use crate::app::App;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::fetch::{Destination, FetchRequest, FetchStatus, Fetcher};
use crate::session::{LoadOptions, Session, StructureLoader};
use afetch_common::types::legal_name;
use afetch_common::StructureFormat;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Keyword arguments understood by [`FetchArgs::from_pairs`]
pub const FETCH_ARG_KEYS: &[&str] = &[
    "code", "name", "state", "finish", "discrete", "multiplex", "zoom", "type", "async", "async_", "path",
    "file", "quiet",
];

/// Raw arguments of the fetch command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchArgs {
    /// One identifier or several separated by whitespace
    pub code: String,
    pub name: String,
    pub state: i32,
    pub finish: i32,
    pub discrete: i32,
    pub multiplex: i32,
    pub zoom: i32,
    /// `pdb`, `cif`, `pdb<N>`; empty for the configured default
    pub format: String,
    /// 1: background, 0: blocking, negative: background unless quiet
    pub async_: i32,
    /// Fetch directory; empty for the configured one
    pub path: String,
    /// Explicit file (`-` for stdout)
    pub file: Option<String>,
    pub quiet: i32,
}

impl Default for FetchArgs {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            state: 0,
            finish: 1,
            discrete: -1,
            multiplex: -2,
            zoom: -1,
            format: String::new(),
            async_: 0,
            path: String::new(),
            file: None,
            quiet: 1,
        }
    }
}

fn parse_int(key: &str, value: &str) -> Result<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::invalid_argument(key, value, "Expected an integer."))
}

impl FetchArgs {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Build arguments from keyword/value pairs
    ///
    /// Unknown keys are rejected, all of them at once, before any value is
    /// looked at. `async` and `async_` are synonyms.
    pub fn from_pairs<I, K, V>(code: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();

        let unknown: Vec<&str> = pairs
            .iter()
            .map(|(k, _)| k.as_ref())
            .filter(|k| !FETCH_ARG_KEYS.contains(k))
            .collect();
        if !unknown.is_empty() {
            return Err(CliError::UnknownArgument(unknown.join(", ")));
        }

        let mut args = Self::new(code);
        for (key, value) in &pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "code" => args.code = value.to_string(),
                "name" => args.name = value.to_string(),
                "state" => args.state = parse_int(key, value)?,
                "finish" => args.finish = parse_int(key, value)?,
                "discrete" => args.discrete = parse_int(key, value)?,
                "multiplex" => args.multiplex = parse_int(key, value)?,
                "zoom" => args.zoom = parse_int(key, value)?,
                "type" => args.format = value.to_string(),
                "async" | "async_" => args.async_ = parse_int(key, value)?,
                "path" => args.path = value.to_string(),
                "file" => args.file = Some(value.to_string()),
                "quiet" => args.quiet = parse_int(key, value)?,
                _ => unreachable!("keys are checked against FETCH_ARG_KEYS"),
            }
        }
        Ok(args)
    }

    /// Validate and resolve defaults from `config`
    ///
    /// Fails on an unknown format or an empty identifier list; nothing has
    /// touched the network at this point.
    pub fn resolve(&self, config: &Config) -> Result<(BatchRequest, ExecutionMode)> {
        let format = if self.format.trim().is_empty() {
            config.default_format
        } else {
            StructureFormat::parse(self.format.trim())?
        };

        let codes: Vec<String> = self.code.split_whitespace().map(str::to_string).collect();
        if codes.is_empty() {
            return Err(CliError::invalid_argument("code", &self.code, "At least one identifier is required."));
        }

        let fetch_path = if self.path.trim().is_empty() {
            config.fetch_path.clone()
        } else {
            PathBuf::from(self.path.trim())
        };

        let quiet = self.quiet != 0;
        let name = self.name.trim().to_string();

        let mut discrete = self.discrete;
        if !name.is_empty() && codes.len() > 1 && discrete < 0 {
            // several entries into one named object
            discrete = 1;
        }

        let batch = BatchRequest {
            codes,
            name,
            format,
            fetch_path,
            destination: Destination::from_arg(self.file.as_deref()),
            load: LoadOptions {
                state: self.state,
                finish: self.finish,
                discrete,
                multiplex: self.multiplex,
                zoom: self.zoom,
                quiet,
            },
            quiet,
        };

        Ok((batch, ExecutionMode::resolve(self.async_, quiet)))
    }
}

/// How a batch is run, decided once per command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// On the caller's task, with view refreshes blocked until done
    Blocking,
    /// Submitted to the runtime; the caller gets a join handle
    Background,
}

impl ExecutionMode {
    pub fn resolve(async_: i32, quiet: bool) -> Self {
        match async_ {
            a if a > 0 => ExecutionMode::Background,
            0 => ExecutionMode::Blocking,
            _ if quiet => ExecutionMode::Blocking,
            _ => ExecutionMode::Background,
        }
    }
}

/// Validated batch, one entry per identifier
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub codes: Vec<String>,
    pub name: String,
    pub format: StructureFormat,
    pub fetch_path: PathBuf,
    pub destination: Destination,
    pub load: LoadOptions,
    pub quiet: bool,
}

impl BatchRequest {
    /// Per-identifier requests, in input order
    pub fn requests(&self) -> impl Iterator<Item = FetchRequest> + '_ {
        self.codes.iter().map(move |code| {
            let object_name = if self.name.is_empty() { code.as_str() } else { self.name.as_str() };
            FetchRequest {
                code: code.clone(),
                name: legal_name(object_name),
                format: self.format,
                fetch_path: self.fetch_path.clone(),
                destination: self.destination.clone(),
                load: self.load,
                quiet: self.quiet,
            }
        })
    }
}

/// Per-identifier statuses of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub entries: Vec<(String, FetchStatus)>,
}

impl BatchReport {
    /// Status of the last identifier; earlier results do not affect it
    pub fn status(&self) -> FetchStatus {
        self.entries
            .last()
            .map(|(_, status)| status.clone())
            .unwrap_or(FetchStatus::Failed)
    }
}

/// Fetch every identifier of `batch` in order, one at a time
pub async fn multifetch<L>(batch: &BatchRequest, fetcher: &Fetcher, loader: &L) -> BatchReport
where
    L: StructureLoader + ?Sized,
{
    let mut report = BatchReport::default();
    for request in batch.requests() {
        let status = fetcher.fetch(&request, loader).await;
        debug!(code = %request.code, status = ?status, "Fetched batch entry");
        report.entries.push((request.code, status));
    }
    report
}

/// A dispatched batch
#[derive(Debug)]
pub enum Dispatched {
    Completed(BatchReport),
    Background(JoinHandle<BatchReport>),
}

impl Dispatched {
    /// Wait for the batch, whichever way it was run
    pub async fn wait(self) -> Result<BatchReport> {
        match self {
            Dispatched::Completed(report) => Ok(report),
            Dispatched::Background(handle) => Ok(handle.await?),
        }
    }
}

/// Run a fetch command against the application's session
pub async fn dispatch(args: &FetchArgs, app: &App) -> Result<Dispatched> {
    let (batch, mode) = args.resolve(app.config())?;
    info!(codes = batch.codes.len(), format = %batch.format, mode = ?mode, "Dispatching fetch");

    Ok(match mode {
        ExecutionMode::Blocking => {
            let session = app.session();
            let _flush = session.block_flush();
            Dispatched::Completed(multifetch(&batch, app.fetcher(), session.as_ref()).await)
        },
        ExecutionMode::Background => {
            let fetcher = Arc::clone(app.fetcher_handle());
            let session: Arc<Session> = Arc::clone(app.session());
            Dispatched::Background(tokio::spawn(async move {
                multifetch(&batch, &fetcher, session.as_ref()).await
            }))
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::AlphaFoldClient;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PDB: &str = "ATOM      1  N   MET A   1      -9.012  17.210  -3.290  1.00 70.00           N\n";

    fn app_for(server: &MockServer, dir: &TempDir) -> App {
        let mut config = Config::default();
        config.set("base_url", &server.uri()).unwrap();
        config.set("max_version", "2").unwrap();
        config.set("fetch_path", dir.path().to_str().unwrap()).unwrap();
        App::new(config).unwrap()
    }

    #[test]
    fn test_from_pairs_unknown_keys() {
        let err = FetchArgs::from_pairs("P69905", [("name", "hb"), ("colour", "red"), ("size", "2")]).unwrap_err();
        match err {
            CliError::UnknownArgument(keys) => assert_eq!(keys, "colour, size"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_from_pairs_async_alias() {
        let args = FetchArgs::from_pairs("P1", [("async", "1"), ("type", "pdb"), ("zoom", "0")]).unwrap();
        assert_eq!(args.async_, 1);
        assert_eq!(args.format, "pdb");
        assert_eq!(args.zoom, 0);

        let args = FetchArgs::from_pairs("P1", [("async_", "-1")]).unwrap();
        assert_eq!(args.async_, -1);
    }

    #[test]
    fn test_from_pairs_bad_integer() {
        let err = FetchArgs::from_pairs("P1", [("state", "two")]).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_resolve_rejects_unknown_format() {
        let args = FetchArgs {
            format: "xyz".to_string(),
            ..FetchArgs::new("P69905")
        };
        let err = args.resolve(&Config::default()).unwrap_err();
        assert!(matches!(err, CliError::InvalidFormat(_)));
    }

    #[test]
    fn test_resolve_defaults() {
        let (batch, mode) = FetchArgs::new("P69905").resolve(&Config::default()).unwrap();
        assert_eq!(batch.format, StructureFormat::Cif);
        assert_eq!(batch.fetch_path, PathBuf::from("."));
        assert_eq!(batch.destination, Destination::Auto);
        assert_eq!(mode, ExecutionMode::Blocking);
        assert!(batch.quiet);
    }

    #[test]
    fn test_resolve_requires_identifier() {
        assert!(FetchArgs::new("   ").resolve(&Config::default()).is_err());
    }

    #[test]
    fn test_named_batch_becomes_discrete() {
        let args = FetchArgs {
            name: " combined ".to_string(),
            ..FetchArgs::new("P1 P2")
        };
        let (batch, _) = args.resolve(&Config::default()).unwrap();
        assert_eq!(batch.load.discrete, 1);
        assert!(batch.requests().all(|r| r.name == "combined"));

        let (single, _) = FetchArgs {
            name: "solo".to_string(),
            ..FetchArgs::new("P1")
        }
        .resolve(&Config::default())
        .unwrap();
        assert_eq!(single.load.discrete, -1);
    }

    #[test]
    fn test_unnamed_batch_uses_codes() {
        let (batch, _) = FetchArgs::new("P1\tQ2  R3").resolve(&Config::default()).unwrap();
        let names: Vec<_> = batch.requests().map(|r| r.name).collect();
        assert_eq!(names, vec!["P1", "Q2", "R3"]);
    }

    #[test]
    fn test_execution_mode_resolve() {
        assert_eq!(ExecutionMode::resolve(1, true), ExecutionMode::Background);
        assert_eq!(ExecutionMode::resolve(0, false), ExecutionMode::Blocking);
        assert_eq!(ExecutionMode::resolve(-1, false), ExecutionMode::Background);
        assert_eq!(ExecutionMode::resolve(-1, true), ExecutionMode::Blocking);
    }

    #[test]
    fn test_report_status_is_last_entry() {
        let report = BatchReport {
            entries: vec![
                ("A".to_string(), FetchStatus::Failed),
                (
                    "B".to_string(),
                    FetchStatus::Loaded {
                        name: "B".to_string(),
                        version: Some(1),
                        path: None,
                    },
                ),
            ],
        };
        assert!(!report.status().is_failed());
        assert!(BatchReport::default().status().is_failed());
    }

    #[tokio::test]
    async fn test_multifetch_one_fetch_per_code_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PDB))
            .expect(3)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let app = app_for(&server, &dir);
        let args = FetchArgs {
            format: "pdb".to_string(),
            ..FetchArgs::new("P1 P2 P3")
        };

        let report = dispatch(&args, &app).await.unwrap().wait().await.unwrap();

        let codes: Vec<_> = report.entries.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, vec!["P1", "P2", "P3"]);

        let requested: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(
            requested,
            vec![
                "/AF-P1-F1-model_v2.pdb",
                "/AF-P2-F1-model_v2.pdb",
                "/AF-P3-F1-model_v2.pdb",
            ]
        );
        assert_eq!(app.session().object_names(), vec!["P1", "P2", "P3"]);
    }

    #[tokio::test]
    async fn test_blocking_dispatch_refreshes_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PDB))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let app = app_for(&server, &dir);
        let args = FetchArgs {
            format: "pdb".to_string(),
            ..FetchArgs::new("P1 P2")
        };

        let dispatched = dispatch(&args, &app).await.unwrap();
        assert!(matches!(dispatched, Dispatched::Completed(_)));
        assert!(!app.session().is_flush_blocked());
        assert_eq!(app.session().refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_background_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PDB))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let app = app_for(&server, &dir);
        let args = FetchArgs {
            format: "pdb".to_string(),
            async_: 1,
            ..FetchArgs::new("P1")
        };

        let dispatched = dispatch(&args, &app).await.unwrap();
        assert!(matches!(dispatched, Dispatched::Background(_)));
        let report = dispatched.wait().await.unwrap();
        assert!(!report.status().is_failed());
        assert!(app.session().get("P1").is_some());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_batch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::path_regex("^/AF-GOOD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PDB))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let app = app_for(&server, &dir);
        let args = FetchArgs {
            format: "pdb".to_string(),
            ..FetchArgs::new("GOOD BAD")
        };

        let report = dispatch(&args, &app).await.unwrap().wait().await.unwrap();
        assert!(!report.entries[0].1.is_failed());
        assert!(report.status().is_failed());
    }

    #[tokio::test]
    async fn test_invalid_format_issues_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PDB))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let app = app_for(&server, &dir);
        let args = FetchArgs {
            format: "xyz".to_string(),
            ..FetchArgs::new("P1 P2")
        };

        assert!(matches!(dispatch(&args, &app).await, Err(CliError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_multifetch_with_custom_loader_seam() {
        use crate::session::ContentKind;
        use std::path::Path;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder {
            loads: Mutex<Vec<String>>,
        }

        impl StructureLoader for Recorder {
            fn load_file(&self, _path: &Path, name: &str, _options: &LoadOptions) -> Result<()> {
                self.loads.lock().unwrap().push(name.to_string());
                Ok(())
            }

            fn load_bytes(&self, _contents: &[u8], _kind: ContentKind, name: &str, _options: &LoadOptions) -> Result<()> {
                self.loads.lock().unwrap().push(name.to_string());
                Ok(())
            }

            fn color_by_bfactor(&self, _name: &str, _palette: &str) -> Result<()> {
                Ok(())
            }
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PDB))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(AlphaFoldClient::new(server.uri(), 5).unwrap(), 1);
        let (batch, _) = FetchArgs {
            format: "pdb".to_string(),
            path: dir.path().display().to_string(),
            name: "combo".to_string(),
            ..FetchArgs::new("P1 P2")
        }
        .resolve(&Config::default())
        .unwrap();

        let recorder = Recorder::default();
        let report = multifetch(&batch, &fetcher, &recorder).await;
        assert_eq!(report.entries.len(), 2);
        assert_eq!(*recorder.loads.lock().unwrap(), vec!["combo", "combo"]);
    }
}
