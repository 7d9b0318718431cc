/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use bytes::Bytes;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use workbench_core::error::{CoreError, CoreResult};
use workbench_core::project::ProjectSnapshot;

pub const MANIFEST: &str = "package.json";
pub const INDEX: &str = "index.html";

/// Entry points probed for framework projects, in order of preference.
pub const ENTRY_CANDIDATES: [&str; 8] = [
    "src/main.tsx",
    "src/main.jsx",
    "src/main.ts",
    "src/main.js",
    "src/index.tsx",
    "src/index.jsx",
    "src/index.ts",
    "src/index.js",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    Preact,
    React,
    Vue,
    Svelte,
}

impl Framework {
    const PACKAGES: [(&'static str, Framework); 4] = [
        ("preact", Framework::Preact),
        ("react", Framework::React),
        ("vue", Framework::Vue),
        ("svelte", Framework::Svelte),
    ];
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Framework::Preact => "preact",
            Framework::React => "react",
            Framework::Vue => "vue",
            Framework::Svelte => "svelte",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bundler {
    Vite,
    Webpack,
    Parcel,
    Esbuild,
    Rollup,
}

impl Bundler {
    const PACKAGES: [(&'static str, Bundler); 5] = [
        ("vite", Bundler::Vite),
        ("webpack", Bundler::Webpack),
        ("parcel", Bundler::Parcel),
        ("esbuild", Bundler::Esbuild),
        ("rollup", Bundler::Rollup),
    ];
}

impl fmt::Display for Bundler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bundler::Vite => "vite",
            Bundler::Webpack => "webpack",
            Bundler::Parcel => "parcel",
            Bundler::Esbuild => "esbuild",
            Bundler::Rollup => "rollup",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Bundled {
        framework: Framework,
        bundler: Bundler,
        entry: String,
    },
    Framework {
        framework: Framework,
        entry: String,
    },
    Static,
    Unknown,
}

impl Profile {
    pub fn entry(&self) -> Option<&str> {
        match self {
            Profile::Bundled { entry, .. } | Profile::Framework { entry, .. } => Some(entry),
            Profile::Static | Profile::Unknown => None,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Bundled {
                framework, bundler, ..
            } => write!(f, "bundled ({} + {})", framework, bundler),
            Profile::Framework { framework, .. } => write!(f, "framework ({})", framework),
            Profile::Static => write!(f, "static"),
            Profile::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: HashMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: HashMap<String, serde_json::Value>,
}

impl PackageManifest {
    fn depends_on(&self, package: &str) -> bool {
        self.dependencies.contains_key(package) || self.dev_dependencies.contains_key(package)
    }
}

pub fn detect_profile(snapshot: &ProjectSnapshot) -> CoreResult<Profile> {
    let files: HashMap<&str, &Bytes> = snapshot.files().collect();
    classify(&files)
}

fn classify(files: &HashMap<&str, &Bytes>) -> CoreResult<Profile> {
    let manifest = match files.get(MANIFEST) {
        Some(data) => serde_json::from_slice::<PackageManifest>(data)
            .map_err(|e| CoreError::Validation(format!("Invalid {}: {}", MANIFEST, e)))?,
        None => PackageManifest::default(),
    };

    let framework = Framework::PACKAGES
        .iter()
        .find(|(package, _)| manifest.depends_on(package))
        .map(|(_, framework)| *framework);

    let Some(framework) = framework else {
        return Ok(if files.contains_key(INDEX) {
            Profile::Static
        } else {
            Profile::Unknown
        });
    };

    let entry = ENTRY_CANDIDATES
        .iter()
        .find(|candidate| files.contains_key(*candidate))
        .map(|candidate| candidate.to_string())
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "No entry file found for {} project, expected one of: {}",
                framework,
                ENTRY_CANDIDATES.join(", ")
            ))
        })?;

    let bundler = Bundler::PACKAGES
        .iter()
        .find(|(package, _)| manifest.depends_on(package))
        .map(|(_, bundler)| *bundler);

    Ok(match bundler {
        Some(bundler) => Profile::Bundled {
            framework,
            bundler,
            entry,
        },
        None => Profile::Framework { framework, entry },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_files(files: &[(&'static str, &'static str)]) -> CoreResult<Profile> {
        let owned: Vec<(&str, Bytes)> = files
            .iter()
            .map(|(path, data)| (*path, Bytes::from_static(data.as_bytes())))
            .collect();
        let files: HashMap<&str, &Bytes> = owned.iter().map(|(path, data)| (*path, data)).collect();
        classify(&files)
    }

    #[test]
    fn test_framework_with_bundler_is_bundled() {
        let profile = classify_files(&[
            (
                "package.json",
                r#"{"dependencies":{"react":"^18.0.0"},"devDependencies":{"vite":"^5.0.0"}}"#,
            ),
            ("src/main.jsx", "render()"),
        ])
        .unwrap();

        assert_eq!(
            profile,
            Profile::Bundled {
                framework: Framework::React,
                bundler: Bundler::Vite,
                entry: "src/main.jsx".to_string(),
            }
        );
        assert_eq!(profile.to_string(), "bundled (react + vite)");
    }

    #[test]
    fn test_framework_alone() {
        let profile = classify_files(&[
            ("package.json", r#"{"dependencies":{"vue":"^3.4.0"}}"#),
            ("src/index.js", ""),
            ("src/main.ts", ""),
        ])
        .unwrap();

        assert_eq!(
            profile,
            Profile::Framework {
                framework: Framework::Vue,
                entry: "src/main.ts".to_string(),
            }
        );
    }

    #[test]
    fn test_preact_wins_over_react_compat() {
        let profile = classify_files(&[
            (
                "package.json",
                r#"{"dependencies":{"preact":"^10.0.0","react":"npm:@preact/compat"}}"#,
            ),
            ("src/main.js", ""),
        ])
        .unwrap();

        assert!(matches!(
            profile,
            Profile::Framework {
                framework: Framework::Preact,
                ..
            }
        ));
    }

    #[test]
    fn test_static_and_unknown() {
        assert_eq!(
            classify_files(&[("index.html", "<h1>hi</h1>")]).unwrap(),
            Profile::Static
        );
        assert_eq!(
            classify_files(&[
                ("package.json", r#"{"dependencies":{"lodash":"4"}}"#),
                ("index.html", ""),
            ])
            .unwrap(),
            Profile::Static
        );
        assert_eq!(
            classify_files(&[("README.md", "# hi")]).unwrap(),
            Profile::Unknown
        );
        assert_eq!(classify_files(&[]).unwrap(), Profile::Unknown);
    }

    #[test]
    fn test_missing_entry_names_candidates() {
        let err = classify_files(&[
            ("package.json", r#"{"dependencies":{"react":"18"}}"#),
            ("index.html", ""),
        ])
        .unwrap_err();

        match err {
            CoreError::Validation(message) => {
                assert!(message.contains("src/main.tsx"));
                assert!(message.contains("src/index.js"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_manifest() {
        let err = classify_files(&[("package.json", "{ not json")]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
