//! `git blame --porcelain` output parser.
//!
//! For a single-line blame the porcelain format is a header line
//! `<40-hex sha> <orig line> <final line> <count>` followed by `key value` lines
//! and finally the tab-prefixed source line. Only four keys are of interest.

use crate::model::BlameRecord;

const SHA_LEN: usize = 40;
const SHORT_SHA_LEN: usize = 8;

/// Parse porcelain blame output into a [`BlameRecord`].
///
/// Missing keys leave the corresponding field `None`. Only the first commit
/// header line is used.
pub fn parse_porcelain(output: &str) -> BlameRecord {
    let mut record = BlameRecord::default();

    for line in output.lines() {
        if let Some(author) = line.strip_prefix("author ") {
            record.author = Some(author.to_string());
        } else if let Some(mail) = line.strip_prefix("author-mail ") {
            record.email = Some(mail.trim_matches(|c| c == '<' || c == '>').to_string());
        } else if let Some(summary) = line.strip_prefix("summary ") {
            record.summary = Some(summary.to_string());
        } else if record.commit.is_none() && starts_with_sha(line) {
            record.commit = Some(line[..SHORT_SHA_LEN].to_string());
        }
    }

    record
}

fn starts_with_sha(line: &str) -> bool {
    line.len() >= SHA_LEN
        && line.as_bytes()[..SHA_LEN]
            .iter()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
