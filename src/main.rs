use serde_json::json;
use std::env;
use std::time::Duration;
use typesynth::synth::{
    DemoTask, SignatureCatalog, SynthError, Synthesizer, StandardExpander, all_tasks, find_task,
};

#[derive(Clone, Debug, Default)]
struct CliOptions {
    list: bool,
    json: bool,
    only_task: Option<String>,
    max_size: Option<usize>,
    timeout_ms: Option<u64>,
    catalog_path: Option<String>,
}

const USAGE: &str = "usage: typesynth [--list] [--task NAME] [--max-size N] [--timeout-ms N] [--catalog PATH] [--json]";

fn required_value(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    let Some(value) = args.next() else {
        eprintln!("missing value for {flag}");
        std::process::exit(2);
    };
    value
}

fn parse_number<T: std::str::FromStr>(raw: &str, flag: &str) -> T {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("invalid value for {flag}: `{raw}`");
        std::process::exit(2);
    })
}

fn parse_cli_options() -> CliOptions {
    let mut options = CliOptions::default();
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--list" => {
                options.list = true;
            }
            "--json" => {
                options.json = true;
            }
            "--task" => {
                options.only_task = Some(required_value(&mut args, "--task"));
            }
            "--max-size" => {
                let raw = required_value(&mut args, "--max-size");
                options.max_size = Some(parse_number(&raw, "--max-size"));
            }
            "--timeout-ms" => {
                let raw = required_value(&mut args, "--timeout-ms");
                options.timeout_ms = Some(parse_number(&raw, "--timeout-ms"));
            }
            "--catalog" => {
                options.catalog_path = Some(required_value(&mut args, "--catalog"));
            }
            other => {
                eprintln!("unknown argument: {other}");
                eprintln!("{USAGE}");
                std::process::exit(2);
            }
        }
    }

    if options.list && options.only_task.is_some() {
        eprintln!("--list cannot be combined with --task");
        std::process::exit(2);
    }

    options
}

fn load_catalog(options: &CliOptions) -> Result<SignatureCatalog, i32> {
    let Some(path) = &options.catalog_path else {
        return Ok(SignatureCatalog::standard());
    };
    SignatureCatalog::load(path).map_err(|err| {
        eprintln!("failed to load catalog `{path}`: {err}");
        1
    })
}

fn run_task(
    task: &DemoTask,
    synth: &Synthesizer<StandardExpander>,
    options: &CliOptions,
) -> bool {
    let mut ctx = task.context();
    if let Some(max_size) = options.max_size {
        ctx = ctx.with_max_size(max_size);
    }
    if let Some(timeout_ms) = options.timeout_ms {
        ctx = ctx.with_timeout(Duration::from_millis(timeout_ms));
    }
    let mut oracle = task.oracle();
    let outcome = synth.synthesize(&ctx, &mut oracle);

    if options.json {
        let record = match &outcome {
            Ok(solution) => json!({
                "task": task.name,
                "program": solution.program.to_string(),
                "term": solution.program,
                "stats": solution.stats,
            }),
            Err(err) => json!({
                "task": task.name,
                "error": err.to_string(),
                "stats": err.stats(),
            }),
        };
        println!("{record}");
        return outcome.is_ok();
    }

    println!("== {} ==", task.name);
    println!("description: {}", task.description);
    println!("goal: {}", ctx.goal);
    for (name, ty) in &ctx.environment {
        println!("  {name}: {ty}");
    }
    match outcome {
        Ok(solution) => {
            println!("program: {}", solution.program);
            println!("stats: {}", solution.stats);
            for (example, check) in task.examples.iter().zip(oracle.check(&solution.program)) {
                let inputs = example
                    .inputs
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let actual = check
                    .actual
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "<error>".to_string());
                println!("  ({inputs}) -> {actual}");
            }
            println!();
            true
        }
        Err(SynthError::NoSolutionFound { stats }) => {
            println!("no solution found ({stats})");
            println!();
            false
        }
        Err(SynthError::TimedOut { stats }) => {
            println!("timed out ({stats})");
            println!();
            false
        }
        Err(err) => {
            eprintln!("synthesis failed for {}: {err}", task.name);
            false
        }
    }
}

fn main() {
    env_logger::init();
    let options = parse_cli_options();

    if options.list {
        for task in all_tasks() {
            println!("{:<14} {}", task.name, task.description);
        }
        return;
    }

    let catalog = match load_catalog(&options) {
        Ok(catalog) => catalog,
        Err(code) => std::process::exit(code),
    };
    let synth = Synthesizer::new(StandardExpander::default(), catalog);

    let tasks = match &options.only_task {
        Some(name) => match find_task(name) {
            Some(task) => vec![task],
            None => {
                eprintln!("unknown task: {name}");
                std::process::exit(2);
            }
        },
        None => all_tasks(),
    };

    let failures = tasks
        .iter()
        .filter(|task| !run_task(task, &synth, &options))
        .count();
    if failures > 0 {
        eprintln!("{failures} task(s) without a solution");
        std::process::exit(1);
    }
}
