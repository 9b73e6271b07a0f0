use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};
use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use lwgmark_core::{
    Diagnostic, DiagnosticSeverity, Extractor, Issue, IssueError, LwgStatuses, ModDateSource,
    Rewriter, SectionDb, WgSectionLinker, parse_commit_dates, parse_paper_titles, sanitize_html,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Compile LWG issue files into HTML fragments.
#[derive(Debug, Parser)]
#[command(name = "lwgmark-cli", version)]
struct Args {
    /// Directory holding issueNNNN.xml files.
    issues_dir: PathBuf,
    /// Section index, one `[prefix ][name] number` per line.
    #[arg(long, env = "LWGMARK_SECTIONS")]
    sections: Option<PathBuf>,
    /// Paper titles, one `NUMBER Title` per line.
    #[arg(long, env = "LWGMARK_PAPER_TITLES")]
    paper_titles: Option<PathBuf>,
    /// Commit dates, one `issue unix-seconds` per line.
    #[arg(long, env = "LWGMARK_COMMIT_DATES")]
    commit_dates: Option<PathBuf>,
    /// Write issueNNNN.html files here instead of printing to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Clean each fragment with the HTML sanitizer.
    #[arg(long)]
    sanitized: bool,
    #[arg(long, value_enum)]
    diagnostics: Option<DiagnosticsMode>,
    /// Skip issues that fail instead of stopping at the first one.
    #[arg(long)]
    keep_going: bool,
    /// Log filter, e.g. `debug` or `lwgmark_core=trace`. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum DiagnosticsMode {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let mut reporter = Reporter::new(args.diagnostics);
    let outcome = run(&args, &mut reporter);
    reporter.finish();
    outcome?;

    if reporter.failed {
        process::exit(1);
    }
    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args, reporter: &mut Reporter) -> Result<()> {
    let mut sections = match &args.sections {
        Some(path) => SectionDb::parse_index(&read(path)?)
            .wrap_err_with(|| format!("failed to parse section index {}", path.display()))?,
        None => SectionDb::new(),
    };
    let papers = match &args.paper_titles {
        Some(path) => parse_paper_titles(&read(path)?),
        None => HashMap::new(),
    };
    let commits = match &args.commit_dates {
        Some(path) => parse_commit_dates(&read(path)?)
            .wrap_err_with(|| format!("failed to parse commit dates {}", path.display()))?,
        None => HashMap::new(),
    };

    let mut issues = Vec::new();
    let mut files = HashMap::new();
    for path in issue_files(&args.issues_dir)? {
        let name = file_name(&path).to_string();
        let dates = IssueDates {
            commits: &commits,
            modified: modified_date(&path),
        };
        let extractor = Extractor {
            mod_dates: &dates,
            statuses: &LwgStatuses,
        };
        match extractor.extract(read(&path)?, &name, &mut sections) {
            Ok(extracted) => {
                for diagnostic in &extracted.diagnostics {
                    reporter.diagnostic(&name, diagnostic);
                }
                let num = extracted.issue.num;
                if let Some(first) = files.get(&num) {
                    tracing::debug!(issue = num, first = %first, "issue number already taken");
                    reporter.error(&name, &IssueError::duplicate_issue(num));
                    if !args.keep_going {
                        return Ok(());
                    }
                    continue;
                }
                files.insert(num, name);
                issues.push(extracted.issue);
            }
            Err(err) => {
                reporter.error(&name, &err);
                if !args.keep_going {
                    return Ok(());
                }
            }
        }
    }
    tracing::debug!(issues = issues.len(), sections = sections.len(), "extracted issues");

    let rewriter = Rewriter {
        linker: &WgSectionLinker,
        papers: &papers,
        statuses: &LwgStatuses,
    };
    issues.sort_by_key(|issue| issue.num);
    let mut rewritten = vec![false; issues.len()];
    for index in 0..issues.len() {
        match rewriter.rewrite_issue(index, &mut issues, &mut sections) {
            Ok(()) => rewritten[index] = true,
            Err(err) => {
                let name = files.get(&issues[index].num).map_or("", String::as_str);
                reporter.error(name, &err);
                if !args.keep_going {
                    return Ok(());
                }
            }
        }
    }

    let done: Vec<&Issue> = issues
        .iter()
        .zip(&rewritten)
        .filter_map(|(issue, &ok)| ok.then_some(issue))
        .collect();
    write_output(args, &done)?;
    tracing::info!(written = done.len(), "done");
    Ok(())
}

fn write_output(args: &Args, issues: &[&Issue]) -> Result<()> {
    let render = |issue: &Issue| {
        if args.sanitized {
            sanitize_html(&issue.text)
        } else {
            issue.text.clone()
        }
    };

    match &args.out {
        Some(dir) => {
            fs::create_dir_all(dir)
                .wrap_err_with(|| format!("failed to create {}", dir.display()))?;
            for issue in issues {
                let path = dir.join(format!("issue{:04}.html", issue.num));
                fs::write(&path, render(issue))
                    .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            }
        }
        None => {
            for issue in issues {
                println!("<div id=\"{}\">\n{}\n</div>", issue.num, render(issue).trim_end());
            }
        }
    }
    Ok(())
}

fn issue_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).wrap_err_with(|| format!("failed to read directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let name = file_name(&path);
        if name.starts_with("issue") && name.ends_with(".xml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
}

fn modified_date(path: &Path) -> Option<Date> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    let timestamp = Timestamp::try_from(modified).ok()?;
    Some(timestamp.to_zoned(TimeZone::UTC).date())
}

/// Commit dates first, then the file's own modification time.
struct IssueDates<'a> {
    commits: &'a HashMap<u32, Date>,
    modified: Option<Date>,
}

impl ModDateSource for IssueDates<'_> {
    fn mod_date(&self, issue: u32) -> Option<Date> {
        self.commits.mod_date(issue).or(self.modified)
    }
}

struct Reporter {
    mode: Option<DiagnosticsMode>,
    collected: Vec<JsonDiagnostic>,
    failed: bool,
}

#[derive(Serialize)]
struct JsonDiagnostic {
    file: String,
    issue: Option<u32>,
    code: &'static str,
    severity: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<JsonPosition>,
}

#[derive(Serialize)]
struct JsonPosition {
    line: usize,
    character: usize,
}

impl Reporter {
    fn new(mode: Option<DiagnosticsMode>) -> Self {
        Self {
            mode,
            collected: Vec::new(),
            failed: false,
        }
    }

    fn diagnostic(&mut self, file: &str, diagnostic: &Diagnostic) {
        if diagnostic.severity == DiagnosticSeverity::Error {
            self.failed = true;
        }
        match self.mode {
            Some(DiagnosticsMode::Json) => self.collected.push(JsonDiagnostic {
                file: file.to_string(),
                issue: diagnostic.issue,
                code: diagnostic.code,
                severity: severity_label(diagnostic.severity),
                message: diagnostic.message.clone(),
                position: diagnostic.position.map(|position| JsonPosition {
                    line: position.line,
                    character: position.character,
                }),
            }),
            Some(DiagnosticsMode::Pretty) => {
                eprintln!("{}", diagnostic_to_pretty(file, diagnostic))
            }
            None => {}
        }
    }

    fn error(&mut self, file: &str, error: &IssueError) {
        self.diagnostic(file, &Diagnostic::from(error));
        self.failed = true;
        match self.mode {
            Some(DiagnosticsMode::Json) => {}
            Some(DiagnosticsMode::Pretty) => {
                if let Some(context) = &error.context {
                    eprintln!("{context}");
                }
            }
            None => eprintln!("error: {file}: {error}"),
        }
    }

    fn finish(&self) {
        if self.mode == Some(DiagnosticsMode::Json) {
            match serde_json::to_string_pretty(&self.collected) {
                Ok(json) => eprintln!("{json}"),
                Err(err) => eprintln!("failed to serialize diagnostics: {err}"),
            }
        }
    }
}

fn diagnostic_to_pretty(file: &str, diagnostic: &Diagnostic) -> String {
    let severity = severity_label(diagnostic.severity);
    match diagnostic.position {
        Some(position) => format!(
            "{}:{}:{} {} {} {}",
            file,
            position.line + 1,
            position.character + 1,
            severity,
            diagnostic.code,
            diagnostic.message
        ),
        None => format!("{}: {} {} {}", file, severity, diagnostic.code, diagnostic.message),
    }
}

fn severity_label(severity: DiagnosticSeverity) -> &'static str {
    match severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    }
}
