/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use workbench_core::error::CoreResult;
use workbench_core::project::ProjectSnapshot;

use super::detect::{INDEX, Profile};

#[derive(Debug, Clone, PartialEq)]
pub struct BuildArtifact {
    pub path: String,
    pub data: Bytes,
}

/// Turns a project snapshot into the files served from its preview. A real
/// bundler plugs in here.
#[async_trait]
pub trait Transformer: Send + Sync + fmt::Debug {
    async fn transform(
        &self,
        snapshot: &ProjectSnapshot,
        profile: &Profile,
    ) -> CoreResult<Vec<BuildArtifact>>;
}

/// Copies sources unchanged. Framework projects without a root `index.html`
/// get a host document that loads the entry module.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTransformer;

#[async_trait]
impl Transformer for PassthroughTransformer {
    async fn transform(
        &self,
        snapshot: &ProjectSnapshot,
        profile: &Profile,
    ) -> CoreResult<Vec<BuildArtifact>> {
        let mut artifacts: Vec<BuildArtifact> = snapshot
            .files()
            .map(|(path, data)| BuildArtifact {
                path: path.to_string(),
                data: data.clone(),
            })
            .collect();

        if let Some(entry) = profile.entry() {
            if snapshot.get(INDEX).is_none() {
                artifacts.push(BuildArtifact {
                    path: INDEX.to_string(),
                    data: Bytes::from(host_document(&snapshot.project.name, entry)),
                });
            }
        }

        Ok(artifacts)
    }
}

pub fn host_document(title: &str, entry: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{}</title>
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="./{}"></script>
  </body>
</html>
"#,
        escape_html(title),
        escape_html(entry)
    )
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_document_references_entry() {
        let html = host_document("demo", "src/main.jsx");
        assert!(html.contains(r#"<script type="module" src="./src/main.jsx"></script>"#));
        assert!(html.contains("<title>demo</title>"));
        assert!(html.contains(r#"<div id="root"></div>"#));
    }

    #[test]
    fn test_host_document_escapes_title() {
        let html = host_document("<b>Tom & Jerry</b>", "src/main.js");
        assert!(html.contains("<title>&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;</title>"));
    }
}
