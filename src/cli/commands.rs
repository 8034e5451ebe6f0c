use crate::scan::ScanOutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build, scan and conditionally deploy Gradle artifacts
#[derive(Parser, Debug)]
#[command(
    name = "deploygate",
    about = "Build, scan and conditionally deploy Gradle artifacts",
    version,
    author,
    long_about = "deploygate runs a Gradle build against an artifact repository. With --scan, \
                  the build's own deployment is disabled, the produced artifacts are scanned, \
                  and they are uploaded only when the scan passes: binaries first, then \
                  descriptors."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run a build and conditionally deploy its artifacts",
        long_about = "Runs the given Gradle tasks with the project configuration applied.\n\n\
                      Examples:\n  \
                      deploygate build clean artifactoryPublish\n  \
                      deploygate build artifactoryPublish --scan --threads 4\n  \
                      deploygate build artifactoryPublish --scan --detailed-summary --format json"
    )]
    Build(BuildArgs),

    #[command(
        about = "Write the Gradle init script for dependency resolution",
        long_about = "Generates an init script that resolves dependencies through the \
                      configured repository and writes it to $GRADLE_USER_HOME/init.d.\n\n\
                      Examples:\n  \
                      deploygate init-script --repo libs-release"
    )]
    InitScript(InitScriptArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "TASKS", help = "Gradle tasks to run")]
    pub tasks: Vec<String>,

    #[arg(
        long,
        value_name = "N",
        default_value = "0",
        help = "Parallel build forks and upload threads (0 keeps the defaults)"
    )]
    pub threads: usize,

    #[arg(long, help = "Print the detailed summary after the run")]
    pub detailed_summary: bool,

    #[arg(long, help = "Scan the artifacts and upload them only if the scan passes")]
    pub scan: bool,

    #[arg(
        long,
        value_enum,
        default_value = "table",
        help = "Report format requested from the scanner"
    )]
    pub scan_format: ScanFormatArg,

    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        help = "Project configuration file (defaults to DEPLOYGATE_PROJECT_CONFIG)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "NAME", requires = "build_number", help = "Build name")]
    pub build_name: Option<String>,

    #[arg(long, value_name = "NUMBER", requires = "build_name", help = "Build number")]
    pub build_number: Option<String>,

    #[arg(long, value_name = "KEY", help = "Project key the build belongs to")]
    pub project: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct InitScriptArgs {
    #[arg(long, value_name = "NAME", help = "Repository dependencies are resolved from")]
    pub repo: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFormatArg {
    Table,
    Json,
    SimpleJson,
    Sarif,
}

impl From<ScanFormatArg> for ScanOutputFormat {
    fn from(arg: ScanFormatArg) -> Self {
        match arg {
            ScanFormatArg::Table => ScanOutputFormat::Table,
            ScanFormatArg::Json => ScanOutputFormat::Json,
            ScanFormatArg::SimpleJson => ScanOutputFormat::SimpleJson,
            ScanFormatArg::Sarif => ScanOutputFormat::Sarif,
        }
    }
}
