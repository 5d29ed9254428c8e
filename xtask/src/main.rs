use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "reservation_lambda";
const DIST_DIR: &str = "infra/dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the table reservations workspace",
    long_about = "Runs tests and CI checks, and packages the Lambda functions of the\n\
                  table reservations workspace as `bootstrap` zip artifacts."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run unit tests for one crate or the whole workspace
    Test {
        #[arg(value_enum)]
        krate: Option<WorkspaceCrate>,
    },
    /// Run CI checks
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and zip Lambda functions for deployment
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Functions to package; all of them when omitted
        #[arg(value_enum, long = "function")]
        functions: Vec<LambdaFunction>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WorkspaceCrate {
    Core,
    Lambda,
}

impl WorkspaceCrate {
    fn package(self) -> &'static str {
        match self {
            Self::Core => "reservation_core",
            Self::Lambda => LAMBDA_PACKAGE,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Debug build of every Lambda package
    Package,
    /// Run check + package
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LambdaFunction {
    ReservationsApi,
    HelloWorld,
    SqsHandler,
    SnsHandler,
}

impl LambdaFunction {
    const ALL: [Self; 4] = [
        Self::ReservationsApi,
        Self::HelloWorld,
        Self::SqsHandler,
        Self::SnsHandler,
    ];

    fn bin_name(self) -> &'static str {
        match self {
            Self::ReservationsApi => "reservations_api",
            Self::HelloWorld => "hello_world",
            Self::SqsHandler => "sqs_handler",
            Self::SnsHandler => "sns_handler",
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_serverless_lambdas(
    target: &str,
    profile: BuildProfile,
    functions: &[LambdaFunction],
) -> Vec<PathBuf> {
    let functions = if functions.is_empty() {
        LambdaFunction::ALL.to_vec()
    } else {
        functions.to_vec()
    };

    ensure_rust_target_installed(target);
    ensure_c_linker_available(target);

    step("Build lambda binaries");
    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for function in &functions {
        cargo_args.extend(["--bin", function.bin_name()]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    functions
        .iter()
        .map(|function| {
            let zip_path = dist_dir.join(format!("{}.zip", function.bin_name()));
            package_lambda_zip(
                &target_dir.join(binary_name(function.bin_name(), target)),
                &zip_path,
            );
            zip_path
        })
        .collect()
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "rust target `{target}` is not installed; run `rustup target add {target}` first"
        );
    }
}

fn ensure_c_linker_available(target: &str) {
    if !cfg!(windows) || !target.ends_with("unknown-linux-gnu") {
        return;
    }

    let overrides = [
        format!("CC_{}", target.replace('-', "_")),
        format!("CC_{target}"),
        "TARGET_CC".to_string(),
        "CC".to_string(),
    ];
    let configured = overrides
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .any(|value| !value.trim().is_empty() && tool_works(value.trim()));
    if configured || tool_works("x86_64-linux-gnu-gcc") {
        return;
    }

    panic!(
        "missing C cross-linker for target `{target}`. install `x86_64-linux-gnu-gcc` (or set CC_x86_64_unknown_linux_gnu).\n\
         Tip: the AWS SDK's TLS stack (aws-lc-sys) needs a Linux C toolchain when cross-compiling from Windows."
    );
}

fn tool_works(program: &str) -> bool {
    let mut parts = program.split_whitespace();
    let Some(bin) = parts.next() else {
        return false;
    };

    Command::new(bin)
        .args(parts)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

/// The `provided.al2023` runtime executes the archive entry named `bootstrap`.
fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    for krate in [WorkspaceCrate::Core, WorkspaceCrate::Lambda] {
        step(&format!("Test {}", krate.package()));
        run_cargo(&["test", "-p", krate.package()]);
    }
}

fn ci_package() {
    let host = std::env::var("XTASK_LAMBDA_TARGET")
        .unwrap_or_else(|_| "x86_64-unknown-linux-gnu".to_string());
    package_serverless_lambdas(&host, BuildProfile::Debug, &[]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test { krate } => match krate {
            Some(krate) => run_cargo(&["test", "-p", krate.package()]),
            None => run_cargo(&["test", "--workspace"]),
        },
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Package => ci_package(),
                CiJob::All => {
                    ci_check();
                    ci_package();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage {
            target,
            profile,
            functions,
        } => {
            let artifacts = package_serverless_lambdas(&target, profile, &functions);
            eprintln!("\nPackaged artifacts:");
            for artifact in artifacts {
                eprintln!("- {}", artifact.display());
            }
        }
    }
}
