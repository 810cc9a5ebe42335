//! 命令行参数与交互式提示

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::MigrationConfig;
use crate::error::AppError;
use crate::models::{ScriptId, ScriptMetadata};

/// Migrate the version history of a Greasy Fork user script into a git repository
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "greasygit", author, version, about, long_about = None)]
pub struct Args {
    /// Script id or script URL (prompted when omitted)
    #[arg()]
    pub script: Option<String>,

    /// Target repository directory [default: the script slug]
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Tracked script file name [default: <slug>.user.js]
    #[arg(short, long)]
    pub file: Option<String>,

    /// Include versions hidden from the default history listing
    #[arg(long)]
    pub all_versions: bool,

    /// Only migrate the versions of the default history listing
    #[arg(long, conflicts_with = "all_versions")]
    pub listed_only: bool,

    /// Create a lightweight tag for every committed version
    #[arg(long)]
    pub tag: bool,

    /// Do not create the initial README commit
    #[arg(long)]
    pub no_readme: bool,

    /// Site root, e.g. https://sleazyfork.org
    #[arg(long)]
    pub base_url: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Accept defaults instead of prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Print the summary (or the error) as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut MigrationConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if self.all_versions {
            config.all_versions = true;
        }
        if self.listed_only {
            config.all_versions = false;
        }
        if self.tag {
            config.tag_versions = true;
        }
        if self.no_readme {
            config.readme = false;
        }
    }
}

/// Line-oriented prompter over any reader/writer pair
pub struct Prompter<R, W> {
    input: R,
    output: W,
    interactive: bool,
}

impl Prompter<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stdin, questions on stderr
    pub fn stdio(interactive: bool) -> Self {
        Self::new(io::stdin().lock(), io::stderr(), interactive)
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, interactive: bool) -> Self {
        Self {
            input,
            output,
            interactive,
        }
    }

    /// Ask a question; an empty answer takes `default`
    ///
    /// Without a default the question is repeated until answered. When not
    /// interactive the default is returned without asking.
    ///
    /// # Errors
    /// 输入结束且没有默认值时返回 InvalidInput
    pub fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String, AppError> {
        if !self.interactive {
            return default
                .map(str::to_string)
                .ok_or_else(|| AppError::config(format!("缺少参数: {question}")));
        }

        loop {
            match default {
                Some(default) => write!(self.output, "{question} [{default}]: ")?,
                None => write!(self.output, "{question}: ")?,
            }
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return default
                    .map(str::to_string)
                    .ok_or_else(|| AppError::config(format!("缺少参数: {question}")));
            }

            let answer = line.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
            if let Some(default) = default {
                return Ok(default.to_string());
            }
        }
    }

    /// Script id from the argument, or asked for
    pub fn script(&mut self, arg: Option<&str>) -> Result<ScriptId, AppError> {
        let raw = match arg {
            Some(raw) => raw.to_string(),
            None => self.ask("Script id or URL", None)?,
        };
        Ok(raw.parse::<ScriptId>()?)
    }

    /// Target directory from the argument, or asked for with the slug as default
    pub fn target_dir(
        &mut self,
        arg: Option<&PathBuf>,
        metadata: &ScriptMetadata,
    ) -> Result<PathBuf, AppError> {
        match arg {
            Some(dir) => Ok(dir.clone()),
            None => {
                let default = metadata.default_repo_name();
                Ok(PathBuf::from(self.ask("Repository directory", Some(&default))?))
            }
        }
    }

    /// Script file name from the argument, or asked for
    pub fn script_file(
        &mut self,
        arg: Option<&str>,
        metadata: &ScriptMetadata,
    ) -> Result<String, AppError> {
        match arg {
            Some(file) => Ok(file.to_string()),
            None => {
                let default = metadata.default_script_file();
                self.ask("Script file name", Some(&default))
            }
        }
    }
}
