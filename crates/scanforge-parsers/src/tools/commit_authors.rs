//! `commit-authors` parser (spec §4.5). Input is `git log --format='%an
//! <%ae>' | sort -u` output: one `Name <email>` per line, already deduped
//! and sorted by the shell pipeline.

use scanforge_core::ScanDefinition;

use crate::output::ParserOutput;
use crate::ParseError;

pub fn parse(raw_stdout: &str, _raw_stderr: &str, _def: &ScanDefinition) -> Result<ParserOutput, ParseError> {
    let authors: Vec<String> = raw_stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    // An empty repository (no commits yet) is "no authors", not a failure.
    Ok(ParserOutput::CommitAuthors(authors))
}
