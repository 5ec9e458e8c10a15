use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sdt-undub", version)]
#[command(about = "Copy the audio of one .sdt dub over another")]
pub struct Cli {
    /// TOML config file; flags override its values.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reject containers without an end-of-stream marker.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Audio formats to substitute, comma separated (e.g. vag,xwma).
    #[arg(long = "audio", global = true, value_delimiter = ',')]
    pub audio_formats: Vec<String>,

    /// Container file extension, without the dot.
    #[arg(long, global = true)]
    pub extension: Option<String>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stitch one source/target pair into a new file.
    Stitch {
        /// Container supplying the audio.
        source: PathBuf,
        /// Container supplying video, subtitles and layout.
        target: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Stitch every container of a target tree with its same-named source.
    Undub {
        /// Tree supplying the audio.
        #[arg(long)]
        source: Option<PathBuf>,
        /// Tree supplying everything else.
        #[arg(long)]
        target: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List files that exist in only one of two trees.
    Diff { first: PathBuf, second: PathBuf },

    /// Summarize the streams of one or more containers.
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stitch() {
        let cli = Cli::parse_from(["sdt-undub", "stitch", "jp.sdt", "us.sdt", "-o", "out.sdt"]);
        match cli.command {
            Command::Stitch {
                source,
                target,
                output,
            } => {
                assert_eq!(source, PathBuf::from("jp.sdt"));
                assert_eq!(target, PathBuf::from("us.sdt"));
                assert_eq!(output, PathBuf::from("out.sdt"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "sdt-undub", "undub", "--source", "jp", "--audio", "vag,msf", "--strict",
        ]);
        assert!(cli.strict);
        assert_eq!(cli.audio_formats, vec!["vag", "msf"]);
        assert!(matches!(cli.command, Command::Undub { target: None, .. }));
    }

    #[test]
    fn test_inspect_requires_files() {
        assert!(Cli::try_parse_from(["sdt-undub", "inspect"]).is_err());
    }
}
