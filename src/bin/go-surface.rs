use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use go_surface::{Config, ResolveMode, Session, SourceFile};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Print the public surface of a Go file or package directory.
#[derive(Debug, Parser)]
#[command(name = "go-surface", version)]
struct Cli {
    /// A `.go` file or a directory of them
    path: PathBuf,

    /// Only files whose name ends with this pattern (a leading `*` is ignored)
    #[arg(long, value_name = "GLOB-SUFFIX")]
    filter: Option<String>,

    /// Use source text for signatures; skip type checking
    #[arg(long)]
    syntax_only: bool,

    /// Do not attach doc comments
    #[arg(long)]
    no_comments: bool,

    /// Never run the go command to fetch missing dependencies
    #[arg(long)]
    no_acquire: bool,

    /// Also probe fixed Go installation roots for imports
    #[arg(long)]
    legacy_probe: bool,

    /// Print the inferred import path of each file
    #[arg(long)]
    import_path: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::from_env()
            .with_comments(!self.no_comments)
            .with_acquire(!self.no_acquire)
            .with_legacy_probe(self.legacy_probe);
        if self.syntax_only {
            config = config.with_mode(ResolveMode::Syntax);
        }
        if let Some(dir) = self.workspace_dir() {
            config = config.with_workspace_root(dir);
        }
        config
    }

    fn workspace_dir(&self) -> Option<PathBuf> {
        if self.path.is_dir() {
            return Some(self.path.clone());
        }
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

fn main() -> ExitCode {
    if let Ok(filter) = EnvFilter::try_from_env("GO_SURFACE_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();
    let config = cli.config();
    let dependency_root = config.dependency_root.clone();
    let mut session = Session::new(config);

    let result = if cli.path.is_dir() {
        let suffix = cli.filter.as_deref().map(|f| f.trim_start_matches('*').to_owned());
        let keep = move |path: &Path| match &suffix {
            Some(suffix) => path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(suffix.as_str())),
            None => true,
        };
        session.parse_dir(&cli.path, Some(&keep))
    } else {
        session.parse_file(&cli.path).map(|file| vec![file])
    };

    let files = match result {
        Ok(files) => files,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    for file in &files {
        println!("{file:#?}");
        if cli.import_path {
            print_import_path(file, dependency_root.as_deref());
        }
    }
    ExitCode::SUCCESS
}

fn print_import_path(file: &SourceFile, dependency_root: Option<&Path>) {
    match file.import_path(dependency_root) {
        Ok(found) if found.external => println!("import path: {} (external)", found.path),
        Ok(found) => println!("import path: {}", found.path),
        Err(err) => eprintln!("error: {err}"),
    }
}
