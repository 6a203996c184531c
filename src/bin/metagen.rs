//! Meta description tool.
//!
//! Generates the legalizer and settings sources from the shared definitions and
//! prints the registered targets, instructions, transforms and setting layouts.

use std::path::PathBuf;

use bumpalo::Bump;
use clap::{ArgAction, Parser, Subcommand};
use tpde_meta::base::{self, Definitions};
use tpde_meta::cdsl::settings::{SettingGroup, SettingKind};
use tpde_meta::{gen, isa, MetaError, MetaSession};

/// Environment variable consulted when `--out-dir` is not given.
const OUT_DIR_ENV: &str = "TPDE_META_OUT_DIR";

#[derive(Parser)]
#[command(name = "metagen")]
#[command(about = "Generate backend sources from meta descriptions", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the generated sources
    Generate {
        /// Output directory (defaults to $TPDE_META_OUT_DIR, then the current directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List the supported target ISAs
    Isas,
    /// List the shared instructions
    Instructions,
    /// Print transforms and the classification of their variables
    Xforms {
        /// Only print this transform group
        #[arg(long)]
        group: Option<String>,
    },
    /// Print the layout of a settings group
    Settings {
        /// Target ISA whose settings to print instead of the shared group
        #[arg(long)]
        isa: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn out_dir(arg: Option<PathBuf>) -> PathBuf {
    arg.or_else(|| std::env::var_os(OUT_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_xforms(defs: &Definitions, only: Option<&str>) -> Result<(), MetaError> {
    let groups: Vec<_> = match only {
        Some(name) => {
            vec![defs.transform_group(name)?]
        }
        None => defs.transform_groups.iter().collect(),
    };

    for group in groups {
        println!("{} ({} transforms)", group.name, group.len());
        for xform in group.xforms() {
            println!("  {xform}");
            for (var, kind) in xform.classification().iter() {
                println!("    {var}: {kind}");
            }
        }
    }
    Ok(())
}

fn print_settings(group: &SettingGroup) {
    match group.parent {
        Some(parent) => println!("{} (parent {parent})", group.name),
        None => println!("{}", group.name),
    }
    println!(
        "  {} bytes, booleans from byte {}",
        group.settings_size(),
        group.boolean_offset()
    );
    for setting in group.settings() {
        let kind = match &setting.kind {
            SettingKind::Bool { default } => format!("bool = {default}"),
            SettingKind::Num { default } => format!("num = {default}"),
            SettingKind::Enum { values } => format!("enum {{{}}}", values.join(", ")),
        };
        match setting.predicate {
            Some(p) => println!("  [{}] {} ({kind}, predicate {p})", setting.byte_offset, setting.name),
            None => println!("  [{}] {} ({kind})", setting.byte_offset, setting.name),
        }
        let blurb = setting.blurb();
        if !blurb.is_empty() {
            println!("      {blurb}");
        }
    }
}

fn run(cli: Cli) -> Result<(), MetaError> {
    let defs = base::define()?;

    match cli.command {
        Command::Generate { out_dir: dir } => {
            let arena = Bump::new();
            let session = MetaSession::new(&arena);
            let isas = isa::all_isas(&defs.settings)?;
            gen::generate_all(&session, &defs, &isas, &out_dir(dir))?;
            log::info!("{}", session.stats());
        }
        Command::Isas => {
            for target in isa::all_isas(&defs.settings)? {
                println!("{}", target.name);
            }
        }
        Command::Instructions => {
            for (_, inst) in defs.instructions.iter() {
                println!("{:<14} {}", inst.name, inst.blurb());
            }
        }
        Command::Xforms { group } => print_xforms(&defs, group.as_deref())?,
        Command::Settings { isa: None } => print_settings(&defs.settings),
        Command::Settings { isa: Some(name) } => {
            let target = isa::lookup(&name, &defs.settings)?;
            print_settings(&target.settings);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
