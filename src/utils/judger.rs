use crate::config::env;
use anyhow::Result;
use futures::future::BoxFuture;
use futures::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use hyper::{client::Client, client::HttpConnector, Body, Method, Request, Uri};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Finished { stdout: String },
    TimedOut,
    Failed { error: String },
}

impl ExecOutcome {
    /// What is shown as the "actual output" of a case.
    pub fn actual_output(&self) -> String {
        match self {
            ExecOutcome::Finished { stdout } => stdout.clone(),
            ExecOutcome::TimedOut => "Time Limit Exceeded".to_string(),
            ExecOutcome::Failed { error } => format!("Runtime Error: {}", error),
        }
    }
}

/// Runs one program against one input. Implementations must never panic on
/// user code; every failure becomes an `ExecOutcome`.
pub trait Executor: Send + Sync {
    fn run<'a>(
        &'a self,
        lang: &'a str,
        src: &'a str,
        input: &'a str,
        time_limit: Duration,
    ) -> BoxFuture<'a, ExecOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMatch {
    Exact,
    /// Trailing whitespace on each line and trailing blank lines are ignored.
    #[default]
    Normalized,
}

impl OutputMatch {
    pub fn matches(&self, expected: &str, actual: &str) -> bool {
        match self {
            OutputMatch::Exact => expected == actual,
            OutputMatch::Normalized => normalize(expected) == normalize(actual),
        }
    }
}

fn normalize(s: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = s.lines().map(|l| l.trim_end()).collect();
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Bounds how many programs run at the same time.
#[derive(Clone)]
pub struct JudgeSlots(Arc<Semaphore>);

impl JudgeSlots {
    pub fn new(n: usize) -> Self {
        JudgeSlots(Arc::new(Semaphore::new(n.max(1))))
    }

    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        Ok(self.0.clone().acquire_owned().await?)
    }
}

struct LangSpec {
    name: &'static str,
    file_name: &'static str,
    program: &'static str,
}

const LANGS: [LangSpec; 2] = [
    LangSpec {
        name: "javascript",
        file_name: "main.js",
        program: "node",
    },
    LangSpec {
        name: "python",
        file_name: "main.py",
        program: "python3",
    },
];

/// The child's environment is cleared down to `PATH` and a scratch `HOME`.
const SANDBOX_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
/// Per stream. Anything past it is discarded and the run fails.
pub const MAX_OUTPUT_BYTES: u64 = 1 << 20;

/// Reads at most `MAX_OUTPUT_BYTES`, then drains the rest so the child never
/// blocks on a full pipe. The flag is set when something was discarded.
async fn read_capped<R: AsyncRead + Unpin>(mut r: R) -> std::io::Result<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    (&mut r).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await?;
    let rest = futures::io::copy(&mut r, &mut futures::io::sink()).await?;
    Ok((buf, rest > 0))
}

/// Interprets the source with a local toolchain in a scratch directory, with
/// a cleared environment and capped output.
#[derive(Default)]
pub struct LocalRunner;

impl LocalRunner {
    async fn run_inner(&self, lang: &str, src: &str, input: &str, time_limit: Duration) -> Result<ExecOutcome> {
        let spec = match LANGS.iter().find(|l| l.name.eq_ignore_ascii_case(lang)) {
            Some(s) => s,
            None => {
                return Ok(ExecOutcome::Failed {
                    error: format!("unsupported language {}", lang),
                })
            }
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(spec.file_name);
        async_fs::write(&path, src).await?;

        let mut child = async_process::Command::new(spec.program)
            .arg(&path)
            .current_dir(dir.path())
            .env_clear()
            .env("PATH", SANDBOX_PATH)
            .env("HOME", dir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("child stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("child stderr not captured"))?;
        let feed = async move {
            if let Some(stdin) = stdin.as_mut() {
                // the program may exit without reading its input
                let _ = stdin.write_all(input.as_bytes()).await;
                let _ = stdin.close().await;
            }
        };
        let run = async move {
            let (_, out, err, status) =
                futures::join!(feed, read_capped(stdout), read_capped(stderr), child.status());
            Ok::<_, std::io::Error>((out?, err?, status?))
        };

        let ((stdout, truncated), (stderr, _), status) = match tokio::time::timeout(time_limit, run).await {
            Ok(res) => res?,
            Err(_) => return Ok(ExecOutcome::TimedOut),
        };
        if truncated {
            return Ok(ExecOutcome::Failed {
                error: "Output Limit Exceeded".to_string(),
            });
        }
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Ok(ExecOutcome::Failed {
                error: stderr.lines().last().unwrap_or("non-zero exit").to_string(),
            });
        }
        Ok(ExecOutcome::Finished {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
        })
    }
}

impl Executor for LocalRunner {
    fn run<'a>(
        &'a self,
        lang: &'a str,
        src: &'a str,
        input: &'a str,
        time_limit: Duration,
    ) -> BoxFuture<'a, ExecOutcome> {
        Box::pin(async move {
            match self.run_inner(lang, src, input, time_limit).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("local runner failed: {:#}", e);
                    ExecOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        })
    }
}

#[derive(Serialize, Debug)]
struct RunRequest<'a> {
    lang: &'a str,
    src: &'a str,
    input: &'a str,
    time_limit_ms: u64,
}

#[derive(Deserialize, Debug, Default)]
struct RunResponse {
    status: String, // ok | timeout | error
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    error: String,
}

/// Delegates execution to a sandboxed judge service over HTTP.
pub struct RemoteJudger {
    client: Client<HttpConnector, Body>,
    run_uri: Uri,
    access_token: String,
}

impl RemoteJudger {
    pub fn new(base_url: &str, access_token: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            run_uri: format!("{}/run", base_url.trim_end_matches('/')).parse::<Uri>()?,
            access_token: access_token.to_string(),
        })
    }

    async fn run_inner(&self, lang: &str, src: &str, input: &str, time_limit: Duration) -> Result<ExecOutcome> {
        let body = serde_json::to_vec(&RunRequest {
            lang,
            src,
            input,
            time_limit_ms: time_limit.as_millis() as u64,
        })?;
        let req = Request::builder()
            .uri(&self.run_uri)
            .method(Method::POST)
            .header("content-type", "application/json")
            .header("ACCESS_TOKEN", self.access_token.as_str())
            .body(Body::from(body))?;
        let res = self.client.request(req).await?;
        if !res.status().is_success() {
            anyhow::bail!("judge request failed with status {}", res.status());
        }
        let buf = hyper::body::to_bytes(res.into_body()).await?;
        let rr: RunResponse = serde_json::from_slice(&buf)
            .map_err(|e| anyhow::Error::msg(format!("judge response malformed : {}", e)))?;
        debug!(status = %rr.status, "remote judge answered");
        Ok(match rr.status.as_str() {
            "ok" => ExecOutcome::Finished { stdout: rr.stdout },
            "timeout" => ExecOutcome::TimedOut,
            _ => ExecOutcome::Failed { error: rr.error },
        })
    }
}

impl Executor for RemoteJudger {
    fn run<'a>(
        &'a self,
        lang: &'a str,
        src: &'a str,
        input: &'a str,
        time_limit: Duration,
    ) -> BoxFuture<'a, ExecOutcome> {
        Box::pin(async move {
            match self.run_inner(lang, src, input, time_limit).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("remote judge failed: {:#}", e);
                    ExecOutcome::Failed {
                        error: "judge unavailable".to_string(),
                    }
                }
            }
        })
    }
}

/// Remote judge when `JUDGE_URL` is set, local interpreters otherwise.
pub fn executor_from_env() -> Result<Arc<dyn Executor>> {
    Ok(match env::get_opt("JUDGE_URL") {
        Some(url) => {
            let token = env::get_or("JUDGE_ACCESS_TOKEN", String::new());
            Arc::new(RemoteJudger::new(url.as_str(), token.as_str())?)
        }
        None => Arc::new(LocalRunner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_match_ignores_trailing_whitespace_only() {
        let m = OutputMatch::Normalized;
        assert!(m.matches("0 1", "0 1\n"));
        assert!(m.matches("a\nb", "a  \nb\n\n"));
        assert!(!m.matches("0 1", " 0 1"));
        assert!(!m.matches("a\nb", "a\n\nb"));
        assert!(!OutputMatch::Exact.matches("0 1", "0 1\n"));
    }

    #[tokio::test]
    async fn unknown_language_fails_without_spawning() {
        let out = LocalRunner
            .run("cobol", "DISPLAY 'HI'.", "", Duration::from_secs(1))
            .await;
        assert!(matches!(out, ExecOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn judge_slots_bound_concurrency() {
        let slots = JudgeSlots::new(1);
        let first = slots.acquire().await.unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(20), slots.acquire()).await;
        assert!(pending.is_err());
        drop(first);
        assert!(slots.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn server_environment_is_not_visible_to_programs() {
        std::env::set_var("BLIND_JUDGE_TEST_SECRET", "leaked-signing-key");
        let out = LocalRunner
            .run(
                "python",
                "import os\nprint(os.environ.get('BLIND_JUDGE_TEST_SECRET'))",
                "",
                Duration::from_secs(5),
            )
            .await;
        // a host without python3 fails to spawn, which leaks nothing either
        assert!(!out.actual_output().contains("leaked-signing-key"));
        if let ExecOutcome::Finished { stdout } = out {
            assert_eq!(stdout.trim(), "None");
        }
    }

    #[tokio::test]
    async fn oversized_output_is_rejected() {
        let out = LocalRunner
            .run("python", "print('x' * 3000000)", "", Duration::from_secs(5))
            .await;
        assert!(!matches!(out, ExecOutcome::Finished { .. }));
    }

    #[tokio::test]
    async fn capped_reader_flags_discarded_bytes() {
        let small = vec![b'a'; 10];
        let (buf, truncated) = read_capped(small.as_slice()).await.unwrap();
        assert_eq!(buf.len(), 10);
        assert!(!truncated);

        let big = vec![b'a'; MAX_OUTPUT_BYTES as usize + 5];
        let (buf, truncated) = read_capped(big.as_slice()).await.unwrap();
        assert_eq!(buf.len() as u64, MAX_OUTPUT_BYTES);
        assert!(truncated);
    }

    #[test]
    fn outcome_renders_actual_output() {
        assert_eq!(ExecOutcome::TimedOut.actual_output(), "Time Limit Exceeded");
        assert_eq!(
            ExecOutcome::Finished { stdout: "3\n".into() }.actual_output(),
            "3\n"
        );
    }
}
