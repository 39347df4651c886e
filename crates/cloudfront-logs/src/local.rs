// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Object source backed by a local directory tree laid out as `<root>/<bucket>/<key>`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::destination::ObjectSource;
use crate::errors::SourceError;

#[derive(Debug, Clone)]
pub struct LocalObjectSource {
    root: PathBuf,
}

impl LocalObjectSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(bucket).join(key);
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if bucket.is_empty() || key.is_empty() || escapes_root {
            return Err(SourceError::Backend(format!(
                "object path {bucket}/{key} is outside {}",
                self.root.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectSource for LocalObjectSource {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, SourceError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SourceError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}
