//! vmcfg CLI
//!
//! Entry point for the `vmcfg` command-line tool.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use vm_boxes::BoxCollection;
use vm_config::config::{DEFAULT_PROVIDER, MACHINE_FILE_NAME};
use vm_config::{EffectiveConfig, Environment, ValidationReport};
use vm_messages::MessageCatalog;

#[derive(Parser)]
#[command(name = "vmcfg")]
#[command(about = "Merge and validate layered machine configuration", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate machines and report every problem found
    Validate {
        /// Machines to validate (default: all)
        machines: Vec<String>,

        /// Path to the project machine file (default: ./Machinefile.toml)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,

        /// Provider whose overrides apply
        #[arg(long, short = 'p', default_value = DEFAULT_PROVIDER)]
        provider: String,

        /// Box catalog directory (default: ~/.vmcfg/boxes)
        #[arg(long)]
        boxes: Option<PathBuf>,

        /// TOML file overriding the built-in messages
        #[arg(long)]
        locale: Option<PathBuf>,

        /// Skip the host machine file
        #[arg(long)]
        no_host_config: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List defined machines in definition order
    Machines {
        /// Path to the project machine file (default: ./Machinefile.toml)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,

        /// Skip the host machine file
        #[arg(long)]
        no_host_config: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List installed boxes by name and provider
    Boxes {
        /// Box catalog directory (default: ~/.vmcfg/boxes)
        #[arg(long)]
        boxes: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Show {
        /// Machine to show (default: the merged root)
        machine: Option<String>,

        /// Path to the project machine file (default: ./Machinefile.toml)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,

        /// Provider whose overrides apply
        #[arg(long, short = 'p', default_value = DEFAULT_PROVIDER)]
        provider: String,

        /// Skip the host machine file
        #[arg(long)]
        no_host_config: bool,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            machines,
            file,
            provider,
            boxes,
            locale,
            no_host_config,
            json,
        } => {
            run_validate(machines, file, &provider, boxes, locale, no_host_config, json);
        }
        Commands::Machines {
            file,
            no_host_config,
            json,
        } => {
            run_machines(file, no_host_config, json);
        }
        Commands::Boxes { boxes, json } => {
            run_boxes(boxes, json);
        }
        Commands::Show {
            machine,
            file,
            provider,
            no_host_config,
        } => {
            run_show(machine, file, &provider, no_host_config);
        }
    }
}

/// Log level comes from `VMCFG_LOG` (default: warn)
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VMCFG_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn project_path(file: Option<PathBuf>) -> PathBuf {
    file.unwrap_or_else(|| PathBuf::from(MACHINE_FILE_NAME))
}

fn load_config(project: &Path, no_host_config: bool) -> EffectiveConfig {
    let host = if no_host_config {
        None
    } else {
        EffectiveConfig::default_host_path()
    };

    match EffectiveConfig::build(host.as_deref(), Some(project)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    }
}

/// Machines named on the command line, or all of them. Unknown names exit 2.
fn select_machines(config: &EffectiveConfig, requested: Vec<String>) -> Vec<String> {
    let defined = config.machine_names();
    if requested.is_empty() {
        return defined.into_iter().map(String::from).collect();
    }

    requested
        .iter()
        .map(|name| match config.resolve_machine(name) {
            Some(resolved) => resolved,
            None => {
                eprintln!("Machine '{}' is not defined.", name);
                eprintln!("Defined machines: {}", defined.join(", "));
                process::exit(2);
            }
        })
        .collect()
}

fn project_root(project: &Path) -> PathBuf {
    match project.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn box_collection(boxes: Option<PathBuf>) -> BoxCollection {
    let directory = boxes
        .or_else(BoxCollection::default_path)
        .unwrap_or_else(|| PathBuf::from(".vmcfg/boxes"));
    BoxCollection::new(directory)
}

fn run_validate(
    machines: Vec<String>,
    file: Option<PathBuf>,
    provider: &str,
    boxes: Option<PathBuf>,
    locale: Option<PathBuf>,
    no_host_config: bool,
    json_output: bool,
) {
    let project = project_path(file);
    let config = load_config(&project, no_host_config);
    let selected = select_machines(&config, machines);

    let messages = match locale {
        Some(path) => match MessageCatalog::with_locale_file(&path) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Error loading locale file: {}", e);
                process::exit(1);
            }
        },
        None => MessageCatalog::builtin(),
    };

    let env = Environment::new(project_root(&project))
        .with_boxes(box_collection(boxes))
        .with_messages(messages);

    let reports: Vec<(String, ValidationReport)> = selected
        .into_iter()
        .filter_map(|name| {
            config
                .validate_machine(&name, provider, &env)
                .map(|report| (name, report))
        })
        .collect();

    let failed = reports.iter().any(|(_, report)| !report.is_empty());

    if json_output {
        let output: Vec<serde_json::Value> = reports
            .iter()
            .map(|(name, report)| {
                serde_json::json!({
                    "machine": name,
                    "valid": report.is_empty(),
                    "issues": report.issues(),
                })
            })
            .collect();

        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        for (name, report) in &reports {
            if report.is_empty() {
                println!("{}: valid", name);
                continue;
            }

            println!("{}: {} problem(s)", name, report.len());
            for message in report.messages() {
                println!("  * {}", message);
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

fn run_machines(file: Option<PathBuf>, no_host_config: bool, json_output: bool) {
    let project = project_path(file);
    let config = load_config(&project, no_host_config);
    let root = config.root();

    if json_output {
        let output: Vec<serde_json::Value> = config
            .machine_names()
            .into_iter()
            .map(|name| {
                let options = root
                    .machines()
                    .get(name)
                    .map(|def| def.options().clone())
                    .unwrap_or_default();
                serde_json::json!({"name": name, "options": options})
            })
            .collect();

        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let names = config.machine_names();
    println!("Defined machines ({} total):\n", names.len());
    for name in names {
        match root.machines().get(name) {
            Some(def) if !def.options().is_empty() => {
                let options: Vec<String> = def
                    .options()
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                println!("  {} ({})", name, options.join(", "));
            }
            _ => println!("  {}", name),
        }
    }
}

fn run_boxes(boxes: Option<PathBuf>, json_output: bool) {
    let collection = box_collection(boxes);
    let entries = match collection.all() {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading box catalog: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&entries) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if entries.is_empty() {
        println!("No boxes installed in {}", collection.directory().display());
        return;
    }

    println!("Installed boxes ({} total):\n", entries.len());
    for entry in &entries {
        println!("  {} ({})", entry.name, entry.provider);
    }
}

fn run_show(machine: Option<String>, file: Option<PathBuf>, provider: &str, no_host_config: bool) {
    let project = project_path(file);
    let config = load_config(&project, no_host_config);

    let rendered = match machine {
        Some(requested) => {
            let name = select_machines(&config, vec![requested])
                .into_iter()
                .next()
                .unwrap_or_default();
            let machine_config = match config.machine(&name, provider) {
                Some(c) => c,
                None => {
                    eprintln!("Machine '{}' is not defined.", name);
                    process::exit(2);
                }
            };
            config.to_json(Some((name.as_str(), &machine_config)))
        }
        None => config.to_json(None),
    };

    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
