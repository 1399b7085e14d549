use std::path::PathBuf;

use clap::Parser;
use hervor_runtime::{DEFAULT_FRAME_STACK_SIZE, JvmError, VmConfig};
use tracing_log::log::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "A from-scratch virtual machine for JVM class files")]
pub struct Args {
    #[arg(
        short = 'c',
        long = "classpath",
        visible_alias = "cp",
        help = "Classpath entries (directories, archives, wildcards), \
                separated by the platform path separator; defaults to '.'"
    )]
    pub class_path: Option<String>,
    #[arg(
        long = "jre",
        visible_alias = "Xjre",
        help = "JRE directory holding lib/ and lib/ext/; searched as \
                ./jre and $JAVA_HOME/jre when absent"
    )]
    pub jre: Option<PathBuf>,
    #[arg(long = "verbose", visible_alias = "verbose-class", help = "Log class loading")]
    pub verbose_class: bool,
    #[arg(long = "verbose-inst", help = "Log every dispatched instruction")]
    pub verbose_inst: bool,
    #[arg(help = "Main class to run ('.' or '/' separated package form)")]
    pub main_class: String,
    #[arg(trailing_var_arg = true, help = "Arguments passed to main")]
    pub args: Vec<String>,
}

/// The verbose switches select log levels; the runtime logs through the
/// `log` facade, bridged into the fmt subscriber.
fn init_tracing(args: &Args) {
    let mut directives = String::from("error");
    if args.verbose_class {
        directives.push_str(",hervor_runtime=debug,hervor_classfile=debug");
    }
    if args.verbose_inst {
        directives.push_str(",hervor_runtime::interpreter=trace");
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    tracing_log::LogTracer::init().ok();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(&args);
    debug!("Provided command line arguments: {:?}", args);

    let config = VmConfig {
        jre_path: args.jre.clone(),
        class_path: args.class_path.clone(),
        main_class: args.main_class.replace('.', "/"),
        args: args.args.clone(),
        verbose_class: args.verbose_class,
        verbose_inst: args.verbose_inst,
        frame_stack_size: DEFAULT_FRAME_STACK_SIZE,
    };

    if let Err(error) = hervor_runtime::start(config) {
        // an uncaught Java exception has already printed its trace
        if !matches!(error, JvmError::UncaughtException) {
            eprintln!("Error: {error}");
        }
        std::process::exit(1);
    }
}
