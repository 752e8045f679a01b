//! Tests for scan and upload argument parsing.

use std::path::PathBuf;

use super::{parse, parse_err};
use crate::cli::CliCommand;
use vidup_core::job::PrivacyStatus;

const BASE: &[&str] = &[
    "vidup", "scan", "/videos", "--title", "Vlog", "--begin", "05-01-21", "--end", "05-31-21",
];

#[test]
fn cli_parse_scan_defaults() {
    match parse(BASE) {
        CliCommand::Scan { gather } => {
            assert_eq!(gather.dir, PathBuf::from("/videos"));
            assert_eq!(gather.title, "Vlog");
            assert_eq!(gather.begin, "05-01-21");
            assert_eq!(gather.end, "05-31-21");
            assert_eq!(gather.description, "");
            assert!(gather.extensions.is_empty());
            assert!(gather.category.is_none());
            assert!(gather.privacy.is_none());
        }
        _ => panic!("expected Scan"),
    }
}

#[test]
fn cli_parse_scan_overrides() {
    let mut args = BASE.to_vec();
    args.extend([
        "--ext", "mp4", "--ext", "MOV", "--category", "10", "--privacy", "Public", "-d", "trip",
    ]);
    match parse(&args) {
        CliCommand::Scan { gather } => {
            assert_eq!(gather.extensions, vec!["mp4", "MOV"]);
            assert_eq!(gather.category, Some(10));
            assert_eq!(gather.privacy, Some(PrivacyStatus::Public));
            assert_eq!(gather.description, "trip");
        }
        _ => panic!("expected Scan"),
    }
}

#[test]
fn cli_parse_scan_requires_dates() {
    let err = parse_err(&["vidup", "scan", "/videos", "--title", "Vlog", "--begin", "05-01-21"]);
    assert_eq!(err, clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn cli_parse_bad_privacy() {
    let mut args = BASE.to_vec();
    args.extend(["--privacy", "secret"]);
    assert_eq!(parse_err(&args), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn cli_parse_upload() {
    let mut args = BASE.to_vec();
    args[1] = "upload";
    args.extend(["--snapshot", "/tmp/left.json"]);
    match parse(&args) {
        CliCommand::Upload {
            gather,
            snapshot,
            no_snapshot,
            discard_snapshot,
        } => {
            assert_eq!(gather.title, "Vlog");
            assert_eq!(snapshot, Some(PathBuf::from("/tmp/left.json")));
            assert!(!no_snapshot);
            assert!(!discard_snapshot);
        }
        _ => panic!("expected Upload"),
    }
}

#[test]
fn cli_parse_upload_no_snapshot() {
    let mut args = BASE.to_vec();
    args[1] = "upload";
    args.push("--no-snapshot");
    match parse(&args) {
        CliCommand::Upload {
            snapshot,
            no_snapshot,
            ..
        } => {
            assert!(snapshot.is_none());
            assert!(no_snapshot);
        }
        _ => panic!("expected Upload"),
    }

    args.extend(["--snapshot", "/tmp/x.json"]);
    assert_eq!(parse_err(&args), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn cli_parse_upload_discard_snapshot() {
    let mut args = BASE.to_vec();
    args[1] = "upload";
    args.push("--discard-snapshot");
    match parse(&args) {
        CliCommand::Upload {
            discard_snapshot,
            no_snapshot,
            ..
        } => {
            assert!(discard_snapshot);
            assert!(!no_snapshot);
        }
        _ => panic!("expected Upload"),
    }

    args.push("--no-snapshot");
    assert_eq!(parse_err(&args), clap::error::ErrorKind::ArgumentConflict);
}
