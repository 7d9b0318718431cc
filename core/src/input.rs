/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::consts::*;

pub fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a port number"))?;

    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

pub fn greater_than_zero<
    T: std::str::FromStr + std::cmp::PartialOrd + std::fmt::Display + Default,
>(
    s: &str,
) -> Result<T, String> {
    let num: T = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid number", s))?;

    if num > T::default() {
        Ok(num)
    } else {
        Err(format!("`{}` is not larger than 0", s))
    }
}

pub fn load_secret(f: &str) -> String {
    let s = std::fs::read_to_string(f).unwrap_or_default();
    s.trim().replace(char::from(25), "")
}

/// Checks a project-relative file path: forward-slash delimited, no leading
/// slash, no empty, `.` or `..` segments.
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Path cannot be empty".to_string());
    }

    if path.starts_with('/') {
        return Err("Path cannot start with a slash".to_string());
    }

    if path.contains('\\') || path.contains('\0') {
        return Err("Path contains invalid characters".to_string());
    }

    for segment in path.split('/') {
        validate_file_name(segment).map_err(|e| format!("Invalid path `{}`: {}", path, e))?;
    }

    Ok(())
}

pub fn validate_file_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if name == "." || name == ".." {
        return Err("Name cannot be a relative reference".to_string());
    }

    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err("Name contains invalid characters".to_string());
    }

    Ok(())
}

pub fn parent_of(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

pub fn file_name_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

pub fn join_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{}/{}", parent, name),
        None => name.to_string(),
    }
}

/// Returns true when `path` equals `ancestor` or lies below it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn check_project_name(s: &str) -> Result<(), String> {
    if s.trim().is_empty() {
        return Err("Project name cannot be empty".to_string());
    }

    if s.len() > 128 {
        return Err("Project name cannot exceed 128 characters".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("index.html").is_ok());
        assert!(validate_path("src/components/App.jsx").is_ok());

        assert!(validate_path("").is_err());
        assert!(validate_path("/index.html").is_err());
        assert!(validate_path("src//main.js").is_err());
        assert!(validate_path("src/").is_err());
        assert!(validate_path("../secret").is_err());
        assert!(validate_path("src/./main.js").is_err());
        assert!(validate_path("src\\main.js").is_err());
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(parent_of("src/main.js"), Some("src"));
        assert_eq!(parent_of("a/b/c"), Some("a/b"));
        assert_eq!(parent_of("index.html"), None);

        assert_eq!(file_name_of("src/main.js"), "main.js");
        assert_eq!(file_name_of("index.html"), "index.html");

        assert_eq!(join_path(Some("src"), "App.jsx"), "src/App.jsx");
        assert_eq!(join_path(None, "App.jsx"), "App.jsx");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("src", "src"));
        assert!(is_within("src/main.js", "src"));
        assert!(!is_within("srcs/main.js", "src"));
        assert!(!is_within("lib/src", "src"));
    }

    #[test]
    fn test_port_in_range() {
        assert_eq!(port_in_range("8080"), Ok(8080));
        assert!(port_in_range("0").is_err());
        assert!(port_in_range("70000").is_err());
        assert!(port_in_range("http").is_err());
    }

    #[test]
    fn test_greater_than_zero() {
        assert_eq!(greater_than_zero::<usize>("4"), Ok(4));
        assert!(greater_than_zero::<usize>("0").is_err());
        assert!(greater_than_zero::<u64>("-1").is_err());
    }

    #[test]
    fn test_check_project_name() {
        assert!(check_project_name("demo").is_ok());
        assert!(check_project_name("   ").is_err());
        assert!(check_project_name(&"x".repeat(129)).is_err());
    }
}
