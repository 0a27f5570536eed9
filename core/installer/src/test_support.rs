//! Fakes and fixtures shared by the unit tests.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Mutex;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::errors::{InstallError, Result};
use crate::http::{HttpResponse, Transport};

/// Reader that hands out at most `chunk` bytes per call.
pub struct TrickleReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl TrickleReader {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk: chunk.max(1),
        }
    }
}

impl Read for TrickleReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(self.chunk).min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

#[derive(Clone)]
pub struct MockRoute {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_length: Option<u64>,
}

/// In-memory [`Transport`]. Unknown URLs fail as if the host were unreachable.
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<String, MockRoute>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let content_length = Some(body.len() as u64);
        self.with_route(
            url,
            MockRoute {
                status,
                body,
                content_length,
            },
        )
    }

    pub fn with_route(mut self, url: &str, route: MockRoute) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == url)
            .count()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        let route = self
            .routes
            .get(url)
            .ok_or_else(|| InstallError::network(url, "connection refused"))?;
        Ok(HttpResponse {
            status: route.status,
            content_length: route.content_length,
            body: Box::new(TrickleReader::new(route.body.clone(), 1000)),
        })
    }
}

/// Entry of a fixture archive.
pub enum Entry<'a> {
    Dir(&'a str, u32),
    File(&'a str, &'a [u8], u32),
    /// File whose name is written verbatim, bypassing the tar builder's path checks.
    Unchecked(&'a str, &'a [u8]),
}

/// Builds a gzip-compressed tar archive from `entries`, in order.
pub fn tar_gz(entries: &[Entry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in entries {
        let mut header = tar::Header::new_gnu();
        match entry {
            Entry::Dir(name, mode) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(*mode);
                header.set_cksum();
                builder.append_data(&mut header, name, io::empty()).unwrap();
            }
            Entry::File(name, data, mode) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_mode(*mode);
                header.set_cksum();
                builder.append_data(&mut header, name, *data).unwrap();
            }
            Entry::Unchecked(name, data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
                header.set_cksum();
                builder.append(&header, *data).unwrap();
            }
        }
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Builds a zip archive from `entries`, in order.
pub fn zip(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));

    for entry in entries {
        match entry {
            Entry::Dir(name, mode) => {
                let options =
                    zip::write::SimpleFileOptions::default().unix_permissions(*mode);
                writer.add_directory(*name, options).unwrap();
            }
            Entry::File(name, data, mode) => {
                let options =
                    zip::write::SimpleFileOptions::default().unix_permissions(*mode);
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
            Entry::Unchecked(name, data) => {
                let options = zip::write::SimpleFileOptions::default();
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}

/// SHA-256 of `data`, hex-encoded.
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(data))
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
