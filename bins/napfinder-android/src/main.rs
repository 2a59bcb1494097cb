//! NAP Finder Android CLI
//!
//! Release signing checks, build variant reports and gated Gradle builds
//! for the NAP Finder Flutter app.

use anyhow::Result;
use clap::{Parser, Subcommand};
use napfinder_android::apksigner;
use napfinder_android::gradle::{self, ArtifactKind};
use napfinder_android::signing::{Resolution, SigningIdentity, SigningPolicy, UnsignedReason};
use napfinder_android::{AndroidProject, BuildType, BuildVariant, CredentialField};
use napfinder_cli::output::{self, format_count, format_flag, Status};
use napfinder_core::config::Config;
use napfinder_core::error::{exit_codes, Error};
use napfinder_core::process::command_exists;
use napfinder_telemetry::TelemetryConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "napfinder-android")]
#[command(about = "Release signing and build configuration for NAP Finder Android")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Flutter project root (the directory containing android/)
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output (`--json` reports still print)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the release signing identity
    Signing {
        /// Signing policy: lenient, strict (default from config)
        #[arg(long)]
        policy: Option<SigningPolicy>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the evaluated debug and release variants
    Variants {
        /// Signing policy: lenient, strict (default from config)
        #[arg(long)]
        policy: Option<SigningPolicy>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build project after checking the signing configuration
    Build {
        /// Build configuration: debug, release
        #[arg(long, default_value = "debug")]
        configuration: BuildType,
        /// Clean before building
        #[arg(long)]
        clean: bool,
        /// Build bundle (AAB) instead of APK
        #[arg(long)]
        bundle: bool,
        /// Signing policy: lenient, strict (default from config)
        #[arg(long)]
        policy: Option<SigningPolicy>,
    },

    /// Sign an APK with the release identity using apksigner
    Sign {
        /// APK to sign
        #[arg(long)]
        artifact: PathBuf,
        /// Write the signed APK here instead of in place
        #[arg(long)]
        out: Option<PathBuf>,
        /// Signing policy: lenient, strict (default from config)
        #[arg(long)]
        policy: Option<SigningPolicy>,
    },

    /// Diagnose environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Whether failures should be reported as JSON
    fn json(&self) -> bool {
        match self {
            Commands::Signing { json, .. }
            | Commands::Variants { json, .. }
            | Commands::Doctor { json } => *json,
            Commands::Build { .. } | Commands::Sign { .. } => false,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }
    output::set_quiet(cli.quiet);

    napfinder_telemetry::init_with_config(TelemetryConfig::for_verbosity(cli.verbose, cli.quiet))?;

    let config = match Config::load(cli.config.as_deref(), &cli.project_dir) {
        Ok(config) => config,
        Err(e) => std::process::exit(report_error(&e, cli.command.json())),
    };
    let project = AndroidProject::new(&cli.project_dir, config.schema);

    let exit_code = match cli.command {
        Commands::Signing { policy, json } => {
            run_signing(&project, policy.unwrap_or(project.default_policy()), json)
        }
        Commands::Variants { policy, json } => {
            run_variants(&project, policy.unwrap_or(project.default_policy()), json)
        }
        Commands::Build { configuration, clean, bundle, policy } => {
            run_build(&project, configuration, clean, bundle, policy.unwrap_or(project.default_policy()))
        }
        Commands::Sign { artifact, out, policy } => {
            run_sign(&project, &artifact, out.as_deref(), policy.unwrap_or(project.default_policy()))
        }
        Commands::Doctor { json } => {
            run_doctor(&project, json)
        }
    };

    std::process::exit(exit_code);
}

/// Print an error (with suggestion) and return its exit code
fn report_error(err: &Error, json: bool) -> i32 {
    if json {
        match serde_json::to_string_pretty(&err.to_report()) {
            Ok(report) => println!("{}", report),
            Err(_) => Status::error(&err.message),
        }
    } else {
        Status::error(&format!("[{}] {}", err.code, err.message));
        if let Some(context) = &err.context {
            eprintln!("  {}", context);
        }
        if let Some(suggestion) = &err.suggestion {
            eprintln!("  Suggestion: {}", suggestion);
        }
    }
    err.exit_code()
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            exit_codes::SUCCESS
        }
        Err(e) => report_error(&Error::from(e), false),
    }
}

#[derive(Serialize)]
struct SigningReport<'a> {
    policy: SigningPolicy,
    properties_file: PathBuf,
    signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unsigned_reason: Option<UnsignedReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<&'a SigningIdentity>,
}

fn run_signing(project: &AndroidProject, policy: SigningPolicy, json: bool) -> i32 {
    let resolution = match project.resolve_signing(policy) {
        Ok(resolution) => resolution,
        Err(e) => return report_error(&Error::from(e), json),
    };

    if json {
        return print_json(&SigningReport {
            policy,
            properties_file: project.key_properties_path(),
            signed: resolution.is_signed(),
            unsigned_reason: match &resolution {
                Resolution::Unsigned(reason) => Some(*reason),
                Resolution::Signed(_) => None,
            },
            identity: resolution.identity(),
        });
    }

    Status::header(&format!("Release signing ({} policy)", policy));
    Status::field("Properties file", &project.key_properties_path().display().to_string());

    match &resolution {
        Resolution::Signed(identity) => {
            print_identity(identity, project);
            let missing = identity.missing_fields();
            if missing.is_empty() {
                Status::success("Release builds will be signed");
            } else {
                for field in &missing {
                    Status::warning(&format!(
                        "{} ({}) is missing; signing will fail when it is used",
                        project.property_keys().key_for(*field),
                        field.description()
                    ));
                }
                Status::warning(&format!(
                    "Signing identity incomplete: {}",
                    format_count(missing.len(), "missing field", "missing fields")
                ));
            }
        }
        Resolution::Unsigned(reason) => {
            Status::warning(&format!("Release builds will be unsigned: {}", reason));
        }
    }

    exit_codes::SUCCESS
}

fn print_identity(identity: &SigningIdentity, project: &AndroidProject) {
    Status::field("Key alias", identity.key_alias());
    let store = match identity.store_file_path(&project.app_dir()) {
        Ok(path) => path.display().to_string(),
        Err(_) => "<missing>".to_string(),
    };
    Status::field("Store file", &store);
    Status::field("Key password", if identity.key_password().is_ok() { "<set>" } else { "<missing>" });
    Status::field("Store password", if identity.store_password().is_ok() { "<set>" } else { "<missing>" });
    Status::field("V1 signing", format_flag(identity.v1_signing_enabled()));
    Status::field("V2 signing", format_flag(identity.v2_signing_enabled()));
}

fn run_variants(project: &AndroidProject, policy: SigningPolicy, json: bool) -> i32 {
    let configuration = match project.evaluate(policy) {
        Ok(configuration) => configuration,
        Err(e) => return report_error(&e, json),
    };

    if json {
        return print_json(&configuration);
    }

    let defaults = &configuration.default_config;
    Status::header(&format!("{} defaultConfig", project.schema().general.project_name));
    Status::field("namespace", &defaults.namespace);
    Status::field("applicationId", &defaults.application_id);
    Status::field("compileSdk", &defaults.compile_sdk.to_string());
    Status::field("minSdk", &defaults.min_sdk.to_string());
    Status::field("targetSdk", &defaults.target_sdk.to_string());
    Status::field("ndkVersion", &defaults.ndk_version);
    Status::field("jvmTarget", &defaults.java_version.to_string());
    Status::field("versionCode", &defaults.version_code.to_string());
    Status::field("versionName", &defaults.version_name);
    if let Some(sdk) = &configuration.flutter_sdk {
        Status::field("flutter.sdk", &sdk.display().to_string());
    }

    for variant in configuration.variants.iter() {
        print_variant(variant);
    }

    exit_codes::SUCCESS
}

fn print_variant(variant: &BuildVariant) {
    Status::header(&format!("buildTypes.{}", variant.build_type));
    Status::field("applicationId", &variant.application_id);
    Status::field("app_name", &variant.app_name);
    let signing = match &variant.signing {
        Some(identity) => format!("release (alias {})", identity.key_alias()),
        None => "none".to_string(),
    };
    Status::field("signingConfig", &signing);
    Status::field("minify", format_flag(variant.minify_enabled));
    Status::field("shrinkResources", format_flag(variant.shrink_resources));
}

fn run_build(
    project: &AndroidProject,
    configuration: BuildType,
    clean: bool,
    bundle: bool,
    policy: SigningPolicy,
) -> i32 {
    let android_dir = project.android_dir();

    if clean {
        Status::info("Cleaning...");
        match gradle::clean(&android_dir) {
            Ok(result) if result.success => {}
            Ok(result) => {
                Status::error("Clean failed");
                eprintln!("{}", result.stderr);
                return exit_codes::FAILURE;
            }
            Err(e) => return report_error(&e, false),
        }
    }

    let kind = if bundle { ArtifactKind::Bundle } else { ArtifactKind::Apk };
    Status::info(&format!("Building {} {}...", configuration, kind));

    let outcome = match gradle::build(project, configuration, kind, policy) {
        Ok(outcome) => outcome,
        Err(e) => return report_error(&e, false),
    };

    match gradle::ensure_success(&outcome) {
        Ok(()) => {
            if configuration == BuildType::Release && !outcome.signed {
                Status::warning("Release artifact is unsigned");
            }
            Status::success(&format!("{} succeeded", outcome.task));
            exit_codes::SUCCESS
        }
        Err(e) => report_error(&e, false),
    }
}

fn run_sign(project: &AndroidProject, artifact: &Path, out: Option<&Path>, policy: SigningPolicy) -> i32 {
    Status::info(&format!("Signing {}...", artifact.display()));

    match apksigner::sign(project, policy, artifact, out) {
        Ok(result) if result.success => {
            Status::success(&format!("Signed {}", out.unwrap_or(artifact).display()));
            exit_codes::SUCCESS
        }
        Ok(result) => {
            Status::error("apksigner failed");
            eprintln!("{}", result.stderr);
            exit_codes::FAILURE
        }
        Err(e) => report_error(&e, false),
    }
}

#[derive(Serialize)]
struct DoctorCheck {
    name: &'static str,
    ok: bool,
    detail: String,
}

fn run_doctor(project: &AndroidProject, json: bool) -> i32 {
    let wrapper = gradle::wrapper_path(&project.android_dir());
    let key_properties = project.key_properties_path();
    let local_properties = project.local_properties_path();

    let mut checks = vec![
        DoctorCheck {
            name: "gradlew",
            ok: wrapper.exists(),
            detail: wrapper.display().to_string(),
        },
        DoctorCheck {
            name: "apksigner",
            ok: command_exists("apksigner"),
            detail: "Android SDK build-tools on PATH".to_string(),
        },
        DoctorCheck {
            name: "flutter",
            ok: command_exists("flutter"),
            detail: "Flutter SDK on PATH".to_string(),
        },
        DoctorCheck {
            name: "local.properties",
            ok: local_properties.exists(),
            detail: local_properties.display().to_string(),
        },
    ];

    let strict = project.resolve_signing(SigningPolicy::Strict);
    checks.push(DoctorCheck {
        name: "key.properties",
        ok: strict.is_ok(),
        detail: match &strict {
            Ok(_) => format!("{} complete", key_properties.display()),
            Err(e) => e.to_string(),
        },
    });

    if json {
        return print_json(&checks);
    }

    Status::header(&format!("{} environment check", project.schema().general.project_name));
    for check in &checks {
        let line = format!("{}: {}", check.name, check.detail);
        if check.ok {
            Status::success(&line);
        } else {
            Status::warning(&line);
        }
    }

    if let Err(napfinder_android::SigningError::MissingField { field, .. }) = &strict {
        if *field == CredentialField::KeyAlias {
            Status::info("Without keyAlias, lenient builds produce an unsigned release");
        }
    }

    exit_codes::SUCCESS
}
