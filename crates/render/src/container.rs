//! Reading and deterministically re-writing the zip container.

use crate::error::ContainerError;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub name: String,
    pub data: Vec<u8>,
    pub method: CompressionMethod,
    pub is_dir: bool,
}

/// An archive held fully in memory, entries in their original order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Container {
    entries: Vec<Entry>,
}

impl Container {
    pub fn open(bytes: &[u8]) -> Result<Self, ContainerError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                method: file.compression(),
                is_dir: file.is_dir(),
                data,
            });
        }
        Ok(Self { entries })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    pub fn text(&self, name: &str) -> Result<Option<&str>, ContainerError> {
        match self.get(name) {
            Some(data) => std::str::from_utf8(data)
                .map(Some)
                .map_err(|_| ContainerError::NotUtf8(name.to_string())),
            None => Ok(None),
        }
    }

    /// Replaces an entry's contents, or appends a new deflated entry.
    pub fn put(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
                method: CompressionMethod::Deflated,
                is_dir: false,
            }),
        }
    }

    /// Serialises the archive. The same entries always produce the same
    /// bytes: timestamps are fixed and each entry keeps its compression.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let method = match entry.method {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default()
                .compression_method(method)
                .last_modified_time(DateTime::default());
            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }
        }
        Ok(writer.finish()?.into_inner())
    }
}
