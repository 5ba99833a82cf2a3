use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Search contracting experience records in delimited files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report which column fills each semantic role (identifier, description, values, codes)
    Resolve(ResolveArgs),
    /// Filter records by classification codes and description keyword, with totals
    Search(SearchArgs),
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Input delimited file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination file for the role mapping as JSON
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,
    /// Delimiter character (';' then ',' are tried automatically when omitted)
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Substitute canonical column positions for roles no keyword matched
    #[arg(long = "positional-fallback")]
    pub positional_fallback: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Input delimited file (omitted: the bundled sample dataset is used)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Comma-separated classification codes a record must carry all of
    #[arg(long)]
    pub codes: Option<String>,
    /// Keyword to look for in the contract description (case-insensitive)
    #[arg(long)]
    pub text: Option<String>,
    /// Write the filtered rows to this CSV file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Character encoding for the output file (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Delimiter character (';' then ',' are tried automatically when omitted)
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Substitute canonical column positions for roles no keyword matched
    #[arg(long = "positional-fallback")]
    pub positional_fallback: bool,
    /// Print the aggregate totals as JSON instead of the result table
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "semicolon" | ";" => Ok(b';'),
        "pipe" | "|" => Ok(b'|'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_named_spellings() {
        assert_eq!(parse_delimiter("semicolon").unwrap(), b';');
        assert_eq!(parse_delimiter("comma").unwrap(), b',');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("|").unwrap(), b'|');
    }

    #[test]
    fn parse_delimiter_rejects_multi_character_input() {
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
