use crate::error::ReportError;
use crate::model::ScoredAccount;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

pub const HEADER: [&str; 8] = [
    "twitterid",
    "handle",
    "followers",
    "friends",
    "desc",
    "website",
    "common_followers",
    "similarity_score",
];

static LINE_BREAKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r|\n|\t|CR|LF").expect("static pattern"));
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("static pattern"));

/// Flatten a profile description onto one line: CR, LF, tab and the literal
/// tokens `CR`/`LF` become spaces, runs of spaces collapse to one and the
/// ends are trimmed.
pub fn sanitize_description(desc: &str) -> String {
    let spaced = LINE_BREAKERS.replace_all(desc, " ");
    SPACE_RUNS.replace_all(spaced.trim(), " ").into_owned()
}

/// Write the header and one row per account. Returns the number of rows.
pub fn write_report<W: Write>(writer: W, accounts: &[ScoredAccount]) -> Result<usize, ReportError> {
    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    tsv.write_record(HEADER)?;
    for scored in accounts {
        let account = &scored.account;
        tsv.write_record([
            account.id.to_string(),
            account.handle.clone(),
            account.followers_count.to_string(),
            account.following_count.to_string(),
            sanitize_description(&account.description),
            account.website.clone().unwrap_or_default(),
            scored.common_followers.to_string(),
            scored.similarity_score.to_string(),
        ])?;
    }
    tsv.flush().map_err(csv::Error::from)?;

    Ok(accounts.len())
}

pub fn write_report_file(path: &Path, accounts: &[ScoredAccount]) -> Result<usize, ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::Io(parent.to_path_buf(), e))?;
    }
    let file = std::fs::File::create(path).map_err(|e| ReportError::Io(path.to_path_buf(), e))?;
    let rows = write_report(std::io::BufWriter::new(file), accounts)?;
    tracing::info!(path = %path.display(), rows, "wrote similarity report");
    Ok(rows)
}
