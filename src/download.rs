use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

const USER_AGENT: &str = concat!("vhs-action/", env!("CARGO_PKG_VERSION"));

fn client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("build http client")
}

fn authorized(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut resp = client()?
        .get(url)
        .send()
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("download failed for {url}"))?;

    let mut file = File::create(dest).with_context(|| format!("create {}", dest.display()))?;
    io::copy(&mut resp, &mut file).with_context(|| format!("write {}", dest.display()))?;
    Ok(())
}

pub fn fetch_text(url: &str) -> Result<String> {
    client()?
        .get(url)
        .send()
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("request failed for {url}"))?
        .text()
        .with_context(|| format!("read body of {url}"))
}

pub fn fetch_json<T: DeserializeOwned>(url: &str, token: Option<&str>) -> Result<T> {
    let request = client()?
        .get(url)
        .header("Accept", "application/vnd.github+json");
    authorized(request, token)
        .send()
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("request failed for {url}"))?
        .json::<T>()
        .with_context(|| format!("parse JSON from {url}"))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn normalize_hex(value: &str) -> String {
    value
        .trim()
        .trim_start_matches("sha256:")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_file_hashes_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("abc.txt");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn normalize_hex_strips_prefix_and_case() {
        assert_eq!(normalize_hex("  sha256:ABCDEF \n"), "abcdef");
        assert_eq!(normalize_hex("00ff"), "00ff");
    }

    #[test]
    fn user_agent_names_the_action() {
        assert!(USER_AGENT.starts_with("vhs-action/"));
    }
}
