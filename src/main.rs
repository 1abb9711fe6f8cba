use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use content_shroud::codec;
use content_shroud::rewriter::{self, RewriteOutcome};
use std::fs;
use std::path::{Path, PathBuf};

/// content-shroud - build-time content obfuscation for static sites
///
/// Encrypts marked sections of HTML in place; the runtime ContentDecoder
/// reveals them after the access check passes.
#[derive(Parser)]
#[command(name = "content-shroud")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode marked sections in a file, or in every HTML file under a directory
    Encode {
        /// Path to the file or directory to process
        path: PathBuf,

        /// Site root the decoder script path is computed against
        /// (defaults to the directory itself, or the file's parent)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Report intended changes without modifying files
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Decode a literal payload (for testing)
    Decode {
        /// Base64 payload, e.g. copied from a data-payload attribute
        payload: String,

        /// The block's salt (from its data-salt attribute)
        #[arg(default_value = "")]
        salt: String,
    },

    /// Show version information
    Version,
}

/// Filenames never encoded in directory mode; these pages must stay
/// readable before the access check runs.
const CORE_FILES: &[&str] = &[
    "index.html",
    "unauthorized.html",
    "sorting.html",
    "dashboard.html",
];

/// Outcome of processing one file.
#[derive(Debug)]
enum FileOutcome {
    Encoded(usize),
    WouldEncode(usize),
    Skipped,
    Error,
}

/// Counts reported at the end of every run.
#[derive(Debug, Default, PartialEq)]
struct Summary {
    processed: usize,
    skipped: usize,
    errored: usize,
    sections: usize,
}

impl Summary {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Encoded(n) | FileOutcome::WouldEncode(n) => {
                self.processed += 1;
                self.sections += n;
            }
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Error => self.errored += 1,
        }
    }
}

/// The `../` chain from a file back to the site root, one segment per
/// path component of the file relative to the root.
fn path_prefix(path: &Path, root: &Path) -> String {
    let depth = match path.strip_prefix(root) {
        Ok(rel) => rel.components().count(),
        Err(_) => 1,
    };
    "../".repeat(depth)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read, rewrite, and write back a single file. Per-file failures are
/// reported and converted into an outcome; they never abort the batch.
fn process_file(path: &Path, root: &Path, dry_run: bool) -> FileOutcome {
    let name = file_label(path);

    let html = match fs::read_to_string(path) {
        Ok(html) => html,
        Err(e) => {
            eprintln!("  ERROR reading {}: {}", name, e);
            return FileOutcome::Error;
        }
    };

    let prefix = path_prefix(path, root);
    match rewriter::rewrite(&html, &prefix) {
        RewriteOutcome::AlreadyEncoded => {
            println!("  SKIP (already encoded): {}", name);
            FileOutcome::Skipped
        }
        RewriteOutcome::NoMarkers => {
            println!("  SKIP (no encode markers): {}", name);
            FileOutcome::Skipped
        }
        RewriteOutcome::Rewritten { html, sections } => {
            if dry_run {
                println!("  WOULD ENCODE ({} sections): {}", sections, name);
                return FileOutcome::WouldEncode(sections);
            }
            match fs::write(path, &html) {
                Ok(()) => {
                    println!("  ENCODED ({} sections): {}", sections, name);
                    FileOutcome::Encoded(sections)
                }
                Err(e) => {
                    eprintln!("  ERROR writing {}: {}", name, e);
                    FileOutcome::Error
                }
            }
        }
    }
}

/// Process every HTML file under a directory, strictly sequentially.
fn process_directory(dir: &Path, root: &Path, dry_run: bool, summary: &mut Summary) -> Result<()> {
    fn scan_directory(
        dir: &Path,
        root: &Path,
        dry_run: bool,
        summary: &mut Summary,
    ) -> Result<()> {
        for entry in
            fs::read_dir(dir).with_context(|| format!("Failed to read directory {:?}", dir))?
        {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                scan_directory(&path, root, dry_run, summary)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some("html") {
                let name = file_label(&path);
                if CORE_FILES.contains(&name.as_str()) {
                    println!("  SKIP (core file): {}", name);
                    summary.record(FileOutcome::Skipped);
                } else {
                    summary.record(process_file(&path, root, dry_run));
                }
            }
        }
        Ok(())
    }

    scan_directory(dir, root, dry_run, summary)
}

fn print_summary(summary: &Summary, dry_run: bool) {
    println!();
    println!("{}", "=".repeat(60));
    println!(
        "Processed: {}  Skipped: {}  Errors: {}",
        summary.processed, summary.skipped, summary.errored
    );
    println!(
        "Total sections {}encoded: {}",
        if dry_run { "would be " } else { "" },
        summary.sections
    );
    println!("{}", "=".repeat(60));
}

fn handle_encode(path: PathBuf, root: Option<PathBuf>, dry_run: bool) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {:?}", path);
    }

    if dry_run {
        println!("{}", "=".repeat(60));
        println!("DRY RUN MODE - No files will be modified");
        println!("{}", "=".repeat(60));
    }

    let mut summary = Summary::default();

    if path.is_dir() {
        let root = root.unwrap_or_else(|| path.clone());
        println!("Processing directory: {:?}", path);
        println!("{}", "-".repeat(60));
        process_directory(&path, &root, dry_run, &mut summary)?;
    } else if path.is_file() {
        let root = root
            .unwrap_or_else(|| path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf());
        summary.record(process_file(&path, &root, dry_run));
    } else {
        anyhow::bail!("Path must be a file or directory: {:?}", path);
    }

    print_summary(&summary, dry_run);
    Ok(())
}

fn handle_decode(payload: String, salt: String) -> Result<()> {
    let decoded = codec::decode(&payload, &salt).context("Failed to decode payload")?;
    println!("Decoded content:");
    println!("{}", "-".repeat(40));
    println!("{}", decoded);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            path,
            root,
            dry_run,
        } => handle_encode(path, root, dry_run),
        Commands::Decode { payload, salt } => handle_decode(payload, salt),
        Commands::Version => {
            println!("content-shroud {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_shroud::rewriter::PROTECTED_CLASS;

    const PAGE: &str = r#"<html>
<head><title>Lesson</title></head>
<body>
    <div class="encode-content"><p>Secret Lesson</p></div>
    <!-- ENCODE-START -->
    <h2>Also secret</h2>
    <!-- ENCODE-END -->
</body>
</html>"#;

    #[test]
    fn test_cli_parses_encode_basic() {
        let cli = Cli::parse_from(["cs", "encode", "/site/page.html"]);
        match cli.command {
            Commands::Encode {
                path,
                root,
                dry_run,
            } => {
                assert_eq!(path, PathBuf::from("/site/page.html"));
                assert!(root.is_none());
                assert!(!dry_run);
            }
            _ => panic!("Expected Encode command"),
        }
    }

    #[test]
    fn test_cli_parses_encode_with_options() {
        let cli = Cli::parse_from(["cs", "encode", "/site", "--root", "/site", "--dry-run"]);
        match cli.command {
            Commands::Encode {
                path,
                root,
                dry_run,
            } => {
                assert_eq!(path, PathBuf::from("/site"));
                assert_eq!(root, Some(PathBuf::from("/site")));
                assert!(dry_run);
            }
            _ => panic!("Expected Encode command"),
        }
    }

    #[test]
    fn test_cli_parses_decode() {
        let cli = Cli::parse_from(["cs", "decode", "JRKHP2dncAUrHA9qNA==", "ab3d9X2k"]);
        match cli.command {
            Commands::Decode { payload, salt } => {
                assert_eq!(payload, "JRKHP2dncAUrHA9qNA==");
                assert_eq!(salt, "ab3d9X2k");
            }
            _ => panic!("Expected Decode command"),
        }
    }

    #[test]
    fn test_cli_decode_salt_defaults_empty() {
        let cli = Cli::parse_from(["cs", "decode", "abcd"]);
        match cli.command {
            Commands::Decode { salt, .. } => assert_eq!(salt, ""),
            _ => panic!("Expected Decode command"),
        }
    }

    #[test]
    fn test_cli_parses_version() {
        let cli = Cli::parse_from(["cs", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_path_prefix_depth() {
        let root = Path::new("/site");
        assert_eq!(path_prefix(Path::new("/site/page.html"), root), "../");
        assert_eq!(
            path_prefix(Path::new("/site/houses/lyra/page.html"), root),
            "../../../"
        );
        // Files outside the root fall back to one level.
        assert_eq!(path_prefix(Path::new("/elsewhere/page.html"), root), "../");
    }

    #[test]
    fn test_process_file_encodes_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("lesson.html");
        fs::write(&page, PAGE).unwrap();

        let outcome = process_file(&page, dir.path(), false);
        assert!(matches!(outcome, FileOutcome::Encoded(2)));

        let rewritten = fs::read_to_string(&page).unwrap();
        assert_eq!(rewritten.matches(PROTECTED_CLASS).count(), 2);
        assert!(rewritten.contains("../components/ContentDecoder.js"));
        assert!(!rewritten.contains("Secret Lesson"));
    }

    #[test]
    fn test_process_file_second_run_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("lesson.html");
        fs::write(&page, PAGE).unwrap();

        assert!(matches!(
            process_file(&page, dir.path(), false),
            FileOutcome::Encoded(2)
        ));
        let first = fs::read_to_string(&page).unwrap();

        assert!(matches!(
            process_file(&page, dir.path(), false),
            FileOutcome::Skipped
        ));
        assert_eq!(fs::read_to_string(&page).unwrap(), first);
    }

    #[test]
    fn test_process_file_dry_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("lesson.html");
        fs::write(&page, PAGE).unwrap();

        let outcome = process_file(&page, dir.path(), true);
        assert!(matches!(outcome, FileOutcome::WouldEncode(2)));
        assert_eq!(fs::read_to_string(&page).unwrap(), PAGE);
    }

    #[test]
    fn test_process_file_unreadable_reports_error() {
        let outcome = process_file(Path::new("/no/such/file.html"), Path::new("/no"), false);
        assert!(matches!(outcome, FileOutcome::Error));
    }

    #[test]
    fn test_process_directory_recurses_and_skips_core_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("houses").join("lyra");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("index.html"), PAGE).unwrap();
        fs::write(nested.join("lesson.html"), PAGE).unwrap();
        fs::write(nested.join("plain.html"), "<html><head></head></html>").unwrap();
        fs::write(nested.join("notes.txt"), "not html").unwrap();

        let mut summary = Summary::default();
        process_directory(dir.path(), dir.path(), false, &mut summary).unwrap();

        // index.html is a core file, plain.html has no markers.
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.errored, 0);
        assert_eq!(summary.sections, 2);

        assert_eq!(
            fs::read_to_string(dir.path().join("index.html")).unwrap(),
            PAGE
        );
        let lesson = fs::read_to_string(nested.join("lesson.html")).unwrap();
        assert!(lesson.contains("../../../components/ContentDecoder.js"));
    }

    #[test]
    fn test_summary_record() {
        let mut summary = Summary::default();
        summary.record(FileOutcome::Encoded(3));
        summary.record(FileOutcome::WouldEncode(1));
        summary.record(FileOutcome::Skipped);
        summary.record(FileOutcome::Error);

        assert_eq!(
            summary,
            Summary {
                processed: 2,
                skipped: 1,
                errored: 1,
                sections: 4,
            }
        );
    }
}
