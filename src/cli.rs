use crate::error::Result;
use crate::filter::{FileMatchPolicy, FilterOptions};
use crate::git::GitRepo;
use crate::history::CommitSource;
use crate::model::Dimension;
use crate::pipeline::{ReportPipeline, DEFAULT_CHANNEL_CAPACITY};
use crate::report::{output_json, output_ndjson, Report};
use anyhow::Context;
use clap::{ArgAction, Args, Parser};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gitdesc")]
#[command(about = "Commits, additions and deletions per author, email and file of a git history")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[clap(flatten)]
    pub filter: FilterArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    #[arg(short, long, action = ArgAction::Count, help = "More log output on stderr (repeatable)")]
    pub verbose: u8,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to git repository (default: discovered from the current directory)")]
    pub repo: Option<PathBuf>,

    #[arg(long, help = "Diff binary files line by line instead of counting them as zero lines", default_value_t = false)]
    pub binary: bool,

    #[arg(long, help = "Commits buffered between history walk and aggregation", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,
}

#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    #[arg(long, help = "Only commits attributed to a name matching this regex (committer, else author)")]
    pub author: Option<String>,

    #[arg(long, help = "Only commits attributed to an email matching this regex (committer, else author)")]
    pub email: Option<String>,

    #[arg(long, help = "Only commits whose message matches this regex")]
    pub message: Option<String>,

    #[arg(long, help = "Only commits touching a path that matches this regex")]
    pub file: Option<String>,

    #[arg(long, help = "Walk back no further than this date; commits made exactly then are kept")]
    pub before: Option<String>,

    #[arg(long, help = "Only commits made strictly after this date")]
    pub after: Option<String>,

    #[arg(long, help = "Only commits made at or before this date")]
    pub until: Option<String>,

    #[arg(
        short = 'n',
        long = "max-count",
        help = "Only the N most recent commits (0: no limit)",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub max_count: i64,

    #[arg(long, help = "Leave out merge commits", default_value_t = false)]
    pub no_merges: bool,

    #[arg(long, help = "Abort when --file cannot read a commit's changes instead of skipping it", default_value_t = false)]
    pub strict_file_match: bool,
}

#[derive(Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = Dimension::ALL, help = "Tables to print, in order")]
    pub group: Vec<Dimension>,

    #[arg(long, help = "Rows per table (0: all)", default_value_t = 0)]
    pub top: usize,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, help = "Output as NDJSON")]
    pub ndjson: bool,
}

impl FilterArgs {
    /// Turns the raw flags into filter options, resolving dates against `repo`.
    pub fn resolve(&self, repo: &GitRepo) -> Result<FilterOptions> {
        let date = |input: &Option<String>| -> Result<_> {
            input.as_deref().map(|s| repo.resolve_date(s)).transpose()
        };
        let options = FilterOptions {
            author: self.author.clone(),
            email: self.email.clone(),
            message: self.message.clone(),
            file: self.file.clone(),
            before: date(&self.before)?,
            after: date(&self.after)?,
            until: date(&self.until)?,
            max_count: self.max_count,
            skip_merges: self.no_merges,
            file_match_policy: if self.strict_file_match {
                FileMatchPolicy::Strict
            } else {
                FileMatchPolicy::Lenient
            },
        };
        options.validate()?;
        Ok(options)
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> anyhow::Result<()> {
        crate::logging::init(self.verbose);

        let repo = GitRepo::open(self.common.repo.as_ref())
            .context("Failed to open git repository")?
            .with_binary(self.common.binary);

        let options = self.filter.resolve(&repo).context("Invalid filter options")?;
        let validity = options.build_validity().context("Invalid filter options")?;
        let limit = options.build_limit().context("Invalid filter options")?;

        let location = repo.location();
        let machine_output = self.output.json || self.output.ndjson;
        let progress = if machine_output {
            ProgressBar::hidden()
        } else {
            spinner()
        };

        let report = ReportPipeline::new(validity, limit)
            .channel_capacity(self.common.channel_capacity)
            .progress(progress)
            .run(repo)
            .context("Failed to build report")?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        if self.output.json {
            output_json(&mut out, &report, &location, &self.output.group)?;
        } else if self.output.ndjson {
            output_ndjson(&mut out, &report, &self.output.group)?;
        } else {
            output_tables(&mut out, &report, &self.output)?;
        }
        out.flush()?;
        Ok(())
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {pos}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Reading commits...");
    pb
}

fn output_tables<W: Write>(out: &mut W, report: &Report, args: &OutputArgs) -> anyhow::Result<()> {
    if report.commits() == 0 {
        writeln!(out, "No commits matched")?;
        return Ok(());
    }
    writeln!(out, "{}", style(format!("{} commits", report.commits())).bold())?;
    writeln!(out)?;
    let top = (args.top > 0).then_some(args.top);
    report.render(out, &args.group, top)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_every_group_in_order() {
        let cli = Cli::try_parse_from(["gitdesc"]).unwrap();
        assert_eq!(cli.output.group, Dimension::ALL.to_vec());
        assert_eq!(cli.filter.max_count, 0);
        assert_eq!(cli.common.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn group_list_is_comma_separated() {
        let cli = Cli::try_parse_from(["gitdesc", "--group", "file,author"]).unwrap();
        assert_eq!(cli.output.group, vec![Dimension::File, Dimension::Author]);
    }

    #[test]
    fn negative_count_parses_so_it_can_be_reported() {
        let cli = Cli::try_parse_from(["gitdesc", "-n", "-2"]).unwrap();
        assert_eq!(cli.filter.max_count, -2);
    }

    #[test]
    fn unknown_group_is_rejected() {
        assert!(Cli::try_parse_from(["gitdesc", "--group", "branch"]).is_err());
    }
}
