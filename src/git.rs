//! Commit metadata from the local git checkout.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{Commit, Extra, Person};

// Fields are separated by NUL; the message body comes last since it may hold newlines.
const LOG_FORMAT: &str = "--format=%H%x00%T%x00%an%x00%ae%x00%cn%x00%ce%x00%aI%x00%B";

fn git(repo: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .map_err(|e| Error::Git(format!("cannot run git: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Git(format!("git {} failed: {}", args.join(" "), stderr.trim())));
    }
    String::from_utf8(output.stdout).map_err(|e| Error::Git(e.to_string()))
}

/// Metadata for `HEAD`. The commit URL is derived from `repo_url` when given.
pub fn head_commit(repo: &Path, repo_url: Option<&str>) -> Result<Commit> {
    let raw = git(repo, &["log", "-1", LOG_FORMAT])?;
    let commit = parse_log(&raw, repo_url)?;
    debug!(id = %commit.id, "read HEAD commit");
    Ok(commit)
}

fn parse_log(raw: &str, repo_url: Option<&str>) -> Result<Commit> {
    let fields: Vec<&str> = raw.splitn(8, '\0').collect();
    let [id, tree, an, ae, cn, ce, timestamp, message] = fields[..] else {
        return Err(Error::Git(format!("unexpected git log output: {raw:?}")));
    };
    let id = id.trim().to_string();
    let url = repo_url.map(|base| commit_url(base, &id));
    Ok(Commit {
        author: Person::new(an, ae),
        committer: Person::new(cn, ce),
        distinct: None,
        id,
        message: message.trim_end().to_string(),
        timestamp: timestamp.to_string(),
        tree_id: Some(tree.to_string()),
        url,
        extra: Extra::new(),
    })
}

pub fn commit_url(repo_url: &str, id: &str) -> String {
    format!("{}/commit/{id}", repo_url.trim_end_matches('/'))
}

/// The `origin` remote as a browsable https URL.
pub fn origin_url(repo: &Path) -> Result<String> {
    let raw = git(repo, &["config", "--get", "remote.origin.url"])?;
    Ok(normalize_remote(raw.trim()))
}

/// `git@github.com:o/r.git` and `https://github.com/o/r.git` both become `https://github.com/o/r`.
pub fn normalize_remote(remote: &str) -> String {
    let url = remote.trim_end_matches('/');
    let url = url.strip_suffix(".git").unwrap_or(url);
    if let Some(rest) = url.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            return format!("https://{host}/{path}");
        }
    }
    if let Some(rest) = url.strip_prefix("ssh://git@") {
        return format!("https://{rest}");
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_record() {
        let raw = "82b191755462b9e2ee3c06862283991e5838b83d\04fb00a7e48be8d72df892d194f65a19b5134075a\0Dev\0dev@example.com\0CI\0ci@example.com\02025-07-08T09:31:07-05:00\0Fix: pnpm setup\n\nbody line\n\n";
        let c = parse_log(raw, Some("https://github.com/o/r/")).unwrap();
        assert_eq!(c.id, "82b191755462b9e2ee3c06862283991e5838b83d");
        assert_eq!(c.tree_id.as_deref(), Some("4fb00a7e48be8d72df892d194f65a19b5134075a"));
        assert_eq!(c.author.name, "Dev");
        assert_eq!(c.committer.email, "ci@example.com");
        assert_eq!(c.timestamp, "2025-07-08T09:31:07-05:00");
        assert_eq!(c.message, "Fix: pnpm setup\n\nbody line");
        assert_eq!(
            c.url.as_deref(),
            Some("https://github.com/o/r/commit/82b191755462b9e2ee3c06862283991e5838b83d")
        );
        assert_eq!(c.distinct, None);
    }

    #[test]
    fn no_repo_url_means_no_commit_url() {
        let raw = "a\0b\0c\0d\0e\0f\0g\0msg";
        assert_eq!(parse_log(raw, None).unwrap().url, None);
    }

    #[test]
    fn truncated_output_is_an_error() {
        assert!(matches!(parse_log("abc\0def", None), Err(Error::Git(_))));
    }

    #[test]
    fn remotes_are_normalized() {
        assert_eq!(normalize_remote("git@github.com:dibshrestha-kunai/qwik.git"), "https://github.com/dibshrestha-kunai/qwik");
        assert_eq!(normalize_remote("https://github.com/o/r.git"), "https://github.com/o/r");
        assert_eq!(normalize_remote("ssh://git@github.com/o/r"), "https://github.com/o/r");
        assert_eq!(normalize_remote("https://github.com/o/r/"), "https://github.com/o/r");
    }
}
