use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::generator::Target;

/// Outcome of one completed probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProbeResult {
    pub status_code: u16,
    pub target: Target,
    pub header_description: String,
}

impl ProbeResult {
    pub fn new(status_code: u16, target: Target) -> Self {
        let header_description = target.header_description();
        Self {
            status_code,
            target,
            header_description,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.status_code == 200
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    code: u16,
    target: &'a str,
    header: &'a str,
}

pub fn format_result(result: &ProbeResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Plain => Ok(format!(
            "{}\t{}\t{}",
            result.status_code, result.target.host, result.header_description
        )),
        OutputFormat::Json => Ok(serde_json::to_string(&JsonLine {
            code: result.status_code,
            target: &result.target.host,
            header: &result.header_description,
        })?),
    }
}

/// Spawn a background task printing every received result.
/// Hits (200) go to stdout; anything else to stderr unless `silent`.
/// Resolves to the number of hits written.
pub fn spawn_result_writer(
    rx: mpsc::Receiver<ProbeResult>,
    format: OutputFormat,
    silent: bool,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(write_results(rx, tokio::io::stdout(), tokio::io::stderr(), format, silent))
}

pub async fn write_results<O, E>(
    mut rx: mpsc::Receiver<ProbeResult>,
    mut hits: O,
    mut misses: E,
    format: OutputFormat,
    silent: bool,
) -> usize
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(result) = rx.recv().await {
        if !result.is_hit() && silent {
            continue;
        }
        let line = match format_result(&result, format) {
            Ok(line) => line + "\n",
            Err(e) => {
                tracing::error!(error=%e, host=%result.target.host, "failed to format result");
                continue;
            }
        };
        let res = if result.is_hit() {
            hits.write_all(line.as_bytes()).await
        } else {
            misses.write_all(line.as_bytes()).await
        };
        match res {
            Ok(()) if result.is_hit() => written += 1,
            Ok(()) => {}
            Err(e) => tracing::error!(error=%e, "failed to write result line"),
        }
    }
    if let Err(e) = hits.flush().await {
        tracing::error!(error=%e, "failed to flush result writer");
    }
    if let Err(e) = misses.flush().await {
        tracing::error!(error=%e, "failed to flush result writer");
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: u16, header: bool) -> ProbeResult {
        let target = if header {
            Target::with_header("http://example.com/admin", "X-Forwarded-For", "127.0.0.1")
        } else {
            Target::new("http://example.com/..;/admin")
        };
        ProbeResult::new(code, target)
    }

    #[test]
    fn test_plain_format() {
        assert_eq!(
            format_result(&sample(200, true), OutputFormat::Plain).unwrap(),
            "200\thttp://example.com/admin\tX-Forwarded-For:127.0.0.1"
        );
        assert_eq!(
            format_result(&sample(403, false), OutputFormat::Plain).unwrap(),
            "403\thttp://example.com/..;/admin\t"
        );
    }

    #[test]
    fn test_json_format() {
        let line = format_result(&sample(200, true), OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["code"], 200);
        assert_eq!(v["target"], "http://example.com/admin");
        assert_eq!(v["header"], "X-Forwarded-For:127.0.0.1");
    }

    #[tokio::test]
    async fn test_hits_and_misses_are_split() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(sample(200, true)).await.unwrap();
        tx.send(sample(404, false)).await.unwrap();
        drop(tx);

        let mut out = Vec::new();
        let mut err = Vec::new();
        let written = write_results(rx, &mut out, &mut err, OutputFormat::Plain, false).await;

        assert_eq!(written, 1);
        assert!(String::from_utf8(out).unwrap().starts_with("200\t"));
        assert!(String::from_utf8(err).unwrap().starts_with("404\t"));
    }

    #[tokio::test]
    async fn test_silent_drops_misses() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(sample(500, false)).await.unwrap();
        drop(tx);

        let mut out = Vec::new();
        let mut err = Vec::new();
        let written = write_results(rx, &mut out, &mut err, OutputFormat::Json, true).await;

        assert_eq!(written, 0);
        assert!(out.is_empty());
        assert!(err.is_empty());
    }
}
