use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::record::{CombineClass, Precedence};

#[derive(Debug, Parser)]
#[command(author, version, about = "Manage tabular record files efficiently", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge one or more delimited files into a single output
    Merge(MergeArgs),
    /// Sort a single file and combine records sharing the same key
    Dedupe(DedupeArgs),
    /// Sort, filter, and project a single delimited file
    Sort(SortArgs),
    /// Report per-column statistics for a delimited file
    Profile(ProfileArgs),
    /// Render a dictionary file's definitions and aliases as a table
    Dictionary(DictionaryArgs),
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// One or more delimited files to merge
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Destination file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Dictionary file supplying aliases, formatting rules, and calculated fields
    #[arg(short = 'd', long = "dictionary")]
    pub dictionary: Option<PathBuf>,
    /// Sort directives of the form `column[:asc|desc]`
    #[arg(long = "sort", action = clap::ArgAction::Append)]
    pub sort: Vec<String>,
    /// Combine records whose sort keys match
    #[arg(long = "combine", requires = "sort")]
    pub combine: bool,
    /// Which record wins when combined field values conflict
    #[arg(long = "precedence", value_enum, default_value = "later")]
    pub precedence: PrecedenceArg,
    /// Worst per-column outcome a combine may commit
    #[arg(long = "max-allowed", value_enum, default_value = "override")]
    pub max_allowed: MaxAllowedArg,
    /// Minimum lossless column agreements required at the ceiling
    #[arg(long = "min-no-loss", default_value_t = 0)]
    pub min_no_loss: usize,
    /// Row-level filters such as `amount >= 100` or `status = shipped`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Limit the number of records taken from each input
    #[arg(long)]
    pub limit: Option<usize>,
    /// Delimiter character for reading inputs
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter for the output (defaults to the output path's extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct DedupeArgs {
    /// Delimited file to deduplicate
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Dictionary file supplying aliases, formatting rules, and calculated fields
    #[arg(short = 'd', long = "dictionary")]
    pub dictionary: Option<PathBuf>,
    /// Key directives of the form `column[:asc|desc]`
    #[arg(long = "key", required = true, action = clap::ArgAction::Append)]
    pub keys: Vec<String>,
    /// Which record wins when combined field values conflict
    #[arg(long = "precedence", value_enum, default_value = "later")]
    pub precedence: PrecedenceArg,
    /// Worst per-column outcome a combine may commit
    #[arg(long = "max-allowed", value_enum, default_value = "override")]
    pub max_allowed: MaxAllowedArg,
    /// Minimum lossless column agreements required at the ceiling
    #[arg(long = "min-no-loss", default_value_t = 0)]
    pub min_no_loss: usize,
    /// Delimiter character for reading the input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter for the output (defaults to the output path's extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct SortArgs {
    /// Delimited file to sort
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Dictionary file supplying aliases, formatting rules, and calculated fields
    #[arg(short = 'd', long = "dictionary")]
    pub dictionary: Option<PathBuf>,
    /// Sort directives of the form `column[:asc|desc]`
    #[arg(long = "sort", action = clap::ArgAction::Append)]
    pub sort: Vec<String>,
    /// Restrict output to this comma-separated list of columns
    #[arg(short = 'C', long = "columns", action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
    /// Row-level filters such as `amount >= 100` or `status = shipped`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Limit the number of records read
    #[arg(long)]
    pub limit: Option<usize>,
    /// Delimiter character for reading the input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter for the output (defaults to the output path's extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Render output as an elastic table to stdout instead of writing a file
    #[arg(long = "table", conflicts_with = "output")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Delimited file to profile
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Dictionary file supplying aliases and semantic types
    #[arg(short = 'd', long = "dictionary")]
    pub dictionary: Option<PathBuf>,
    /// Limit the number of records scanned
    #[arg(long)]
    pub limit: Option<usize>,
    /// Delimiter character for reading the input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Emit the profile as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DictionaryArgs {
    /// Dictionary file to display
    #[arg(short = 'd', long = "dictionary")]
    pub dictionary: PathBuf,
    /// Delimiter character for reading the dictionary file
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum PrecedenceArg {
    Earlier,
    Later,
    None,
}

impl From<PrecedenceArg> for Precedence {
    fn from(arg: PrecedenceArg) -> Self {
        match arg {
            PrecedenceArg::Earlier => Precedence::EarlierWins,
            PrecedenceArg::Later => Precedence::LaterWins,
            PrecedenceArg::None => Precedence::NoOverride,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum MaxAllowedArg {
    None,
    Override,
    Append,
}

impl From<MaxAllowedArg> for CombineClass {
    fn from(arg: MaxAllowedArg) -> Self {
        match arg {
            MaxAllowedArg::None => CombineClass::NoDataLoss,
            MaxAllowedArg::Override => CombineClass::Override,
            MaxAllowedArg::Append => CombineClass::Append,
        }
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
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
    fn delimiter_accepts_names_and_single_ascii() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn precedence_and_ceiling_map_to_core_enums() {
        assert_eq!(
            Precedence::from(PrecedenceArg::Earlier),
            Precedence::EarlierWins
        );
        assert_eq!(CombineClass::from(MaxAllowedArg::None), CombineClass::NoDataLoss);
        assert_eq!(CombineClass::from(MaxAllowedArg::Append), CombineClass::Append);
    }
}
