//! Fetch a page, following redirects and answering input prompts.

use std::io::Write;

use anyhow::{Context, Result, bail};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use starsearch_client::{FetchClient, parse};
use starsearch_core::{AppConfig, Document, Response, StatusCategory, status};
use url::Url;

use crate::args::BrowseArgs;
use crate::render;

pub async fn run(client: &FetchClient, config: &AppConfig, args: BrowseArgs) -> Result<()> {
    let mut url = args.url.clone().unwrap_or_else(|| config.home_url.clone());
    let mut input = args.input.clone();
    let mut redirects = 0;

    loop {
        let response = if args.reload { client.reload(&url).await? } else { client.fetch(&url).await? };
        let code = i32::from(response.status);

        match StatusCategory::from_code(code) {
            Some(StatusCategory::Input) => {
                let Some(text) = input.take() else {
                    let kind = if status::is_sensitive_input(code) { "sensitive input" } else { "input" };
                    bail!("{} asks for {kind}: {} (answer with --input)", response.url, response.meta);
                };
                url = with_input(&response.url, &text)?;
            }
            Some(StatusCategory::Redirect) => {
                if redirects >= config.max_redirects {
                    bail!("too many redirects (limit {})", config.max_redirects);
                }
                redirects += 1;

                let target = resolve_target(&response.url, &response.meta)?;
                tracing::info!(
                    "{} redirect {} -> {}",
                    if status::is_permanent_redirect(code) { "permanent" } else { "temporary" },
                    response.url,
                    target
                );
                url = target;
            }
            Some(StatusCategory::Success) => return print(&response, args.json),
            _ => bail!("{} {}: {}", response.status, status::status_message(code), response.meta),
        }
    }
}

fn print(response: &Response, json: bool) -> Result<()> {
    let doc = match parse(response) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!("{}", err);
            *err.document
        }
    };

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &render::PageOutput::new(&doc))?;
        writeln!(stdout)?;
    } else if is_opaque(&doc) {
        stdout.write_all(&doc.raw_body)?;
    } else {
        stdout.write_all(render::document(&doc).as_bytes())?;
    }
    stdout.flush()?;
    Ok(())
}

fn is_opaque(doc: &Document) -> bool {
    doc.lines.is_empty() && !doc.raw_body.is_empty()
}

/// Resolve a redirect target, which may be relative, against the current URL.
pub fn resolve_target(current: &str, meta: &str) -> Result<String> {
    let base = Url::parse(current).with_context(|| format!("invalid URL {current}"))?;
    let target = base
        .join(meta.trim())
        .with_context(|| format!("invalid redirect target {meta:?}"))?;
    Ok(target.to_string())
}

/// Replace the query of `url` with percent-encoded `text`.
pub fn with_input(url: &str, text: &str) -> Result<String> {
    let mut parsed = Url::parse(url).with_context(|| format!("invalid URL {url}"))?;
    let encoded = utf8_percent_encode(text, NON_ALPHANUMERIC).to_string();
    parsed.set_query(Some(&encoded));
    Ok(parsed.to_string())
}
