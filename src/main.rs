//! Exedore CLI - runs the interception demos against a small `math` object
//!
//! Commands:
//!   exedore before            - log each call before it runs
//!   exedore after             - log each call after it returns
//!   exedore before-and-after  - both of the above on the same slots
//!   exedore wrap              - around advice that logs and forwards
//!   exedore record            - record calls (with results) and print them

use anyhow::Context;
use clap::{Parser, Subcommand};
use exedore::abi::{arg, display_args, Args, Value};
use exedore::runtime::{after, before, intercept, next, wrap, Binding, Object, Recorder};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "exedore")]
#[command(about = "Function interception demos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output the log as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log each call before the original runs
    Before,
    /// Log each call after the original returns
    After,
    /// Install both before and after advice on each slot
    BeforeAndAfter,
    /// Log through around advice that forwards with `next`
    Wrap,
    /// Record every call together with its result
    Record {
        /// Keep at most this many records
        #[arg(long, default_value_t = 100)]
        max_records: usize,
    },
}

type Log = Arc<Mutex<Vec<String>>>;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut math = math_object();

    match cli.command {
        Commands::Before => install_before(&mut math, &log)?,
        Commands::After => install_after(&mut math, &log)?,
        Commands::BeforeAndAfter => {
            install_before(&mut math, &log)?;
            install_after(&mut math, &log)?;
        }
        Commands::Wrap => install_wrap(&mut math, &log)?,
        Commands::Record { max_records } => {
            return record_command(&mut math, max_records, cli.json);
        }
    }

    run_calls(&math)?;
    let entries = log.lock();
    print_log(&entries, cli.json)
}

fn math_object() -> Object<()> {
    Object::new(())
        .with_method("add", |_, args: Args| {
            let a: i64 = arg(&args, 0)?;
            let b: i64 = arg(&args, 1)?;
            Ok(Value::S64(a + b))
        })
        .with_method("multiply", |_, args: Args| {
            let a: i64 = arg(&args, 0)?;
            let b: i64 = arg(&args, 1)?;
            Ok(Value::S64(a * b))
        })
}

fn run_calls(math: &Object<()>) -> anyhow::Result<Vec<Value>> {
    let calls = [("multiply", 3, 9), ("add", 1, 1), ("multiply", 4, 4), ("add", 2, 2)];
    calls
        .iter()
        .map(|&(name, a, b)| {
            math.call(name, vec![Value::S64(a), Value::S64(b)])
                .with_context(|| format!("calling {}({}, {})", name, a, b))
        })
        .collect()
}

fn install_before(math: &mut Object<()>, log: &Log) -> anyhow::Result<()> {
    for name in ["add", "multiply"] {
        let log = Arc::clone(log);
        before(
            math,
            name,
            move |_, original, args| {
                log.lock().push(format!(
                    "Function '{}' called with {}",
                    original.name(),
                    display_args(args)
                ));
                Ok(())
            },
            Binding::Target,
        )?;
    }
    Ok(())
}

fn install_after(math: &mut Object<()>, log: &Log) -> anyhow::Result<()> {
    for name in ["add", "multiply"] {
        let log = Arc::clone(log);
        after(
            math,
            name,
            move |_, original, _| {
                log.lock().push(format!("Function '{}' returned", original.name()));
                Ok(())
            },
            Binding::Target,
        )?;
    }
    Ok(())
}

fn install_wrap(math: &mut Object<()>, log: &Log) -> anyhow::Result<()> {
    for name in ["add", "multiply"] {
        let log = Arc::clone(log);
        wrap(math, name, move |this, original, args| {
            let message = format!(
                "Function {} called with {}",
                original.name(),
                display_args(&args)
            );
            let result = next(this, original, args)?;
            log.lock().push(format!("{} -> {}", message, result));
            Ok(result)
        })?;
    }
    Ok(())
}

fn record_command(math: &mut Object<()>, max_records: usize, json: bool) -> anyhow::Result<()> {
    let recorder = Arc::new(Recorder::with_limits(exedore::runtime::RecordLimits {
        max_records,
    }));
    for name in ["add", "multiply"] {
        intercept(math, name, recorder.clone())?;
    }

    run_calls(math)?;

    if json {
        println!("{}", recorder.to_json()?);
    } else {
        println!("The recorder holds {} calls", recorder.len());
        for record in recorder.records() {
            println!(
                "{}({}) = {}",
                record.function,
                display_args(&record.args),
                record.result
            );
        }
    }
    Ok(())
}

fn print_log(log: &[String], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(log)?);
        return Ok(());
    }
    println!("The log has {} entries", log.len());
    for entry in log {
        println!("{}", entry);
    }
    Ok(())
}
