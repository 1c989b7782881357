mod literal;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, bail, miette};
use safe_eval::{Engine, Policy, Value, render_error, stdlib};
use std::io::BufRead;
use std::io::BufReader;
use tracing::debug;

use crate::literal::{LiteralParser, parse_binding};

/// safe-eval - Evaluate untrusted expressions against an allow-list
#[derive(Parser, Debug)]
#[command(name = "safe-eval")]
#[command(about = "Check and evaluate restricted expressions", long_about = None)]
struct Args {
    /// Allow calling a function from the catalog (repeatable)
    #[arg(long = "allow", value_name = "NAME", global = true)]
    allow: Vec<String>,

    /// Log every node the verifier visits
    #[arg(long, global = true)]
    verbose: bool,

    /// Print the parsed syntax tree (for debugging)
    #[arg(long, global = true)]
    debug_parse: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and verify without evaluating
    Check {
        /// Expression to check (if not provided, reads one per line from stdin)
        expression: Option<String>,
    },
    /// Verify and evaluate
    Eval {
        /// Expression to evaluate (if not provided, reads one per line from stdin)
        expression: Option<String>,

        /// Bind a variable to a literal value (repeatable)
        #[arg(long = "bind", value_name = "NAME=LITERAL", value_parser = parse_binding)]
        bindings: Vec<(String, String)>,
    },
    /// Compile once and call with `_` bound to the argument
    Call {
        /// Expression using `_` for the argument
        expression: String,

        /// Argument literal (if not provided, reads one per line from stdin)
        argument: Option<String>,
    },
}

fn build_engine(args: &Args) -> Result<Engine> {
    let mut builder = Policy::builder().verbose(args.verbose);
    for name in &args.allow {
        let Some(function) = stdlib::by_name(name) else {
            let known: Vec<String> = stdlib::catalog()
                .iter()
                .map(|f| f.name().to_string())
                .collect();
            bail!("unknown function '{name}' (available: {})", known.join(", "));
        };
        builder = builder.allow(function).into_diagnostic()?;
    }
    Ok(Engine::new(builder.build()))
}

/// Prints results to stdout and renders errors to stderr. Every method
/// returns whether it succeeded.
struct Runner {
    engine: Engine,
    literals: LiteralParser,
    debug_parse: bool,
}

impl Runner {
    fn debug_parse(&self, input: &str) {
        if self.debug_parse {
            if let Ok(module) = safe_eval::parser::parse(input) {
                println!("=== Parsed AST ===");
                println!("{:#?}", module);
                println!();
            }
        }
    }

    fn check(&self, input: &str) -> bool {
        self.debug_parse(input);
        match self.engine.check(input) {
            Ok(()) => {
                println!("ok");
                true
            }
            Err(e) => {
                render_error(&e, input);
                false
            }
        }
    }

    fn eval(&self, input: &str, bindings: &[(String, Value)]) -> bool {
        self.debug_parse(input);
        let bindings: Vec<(&str, Value)> = bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect();
        match self.engine.evaluate(input, &bindings) {
            Ok(value) => {
                println!("{}", value.repr());
                true
            }
            Err(e) => {
                render_error(&e, input);
                false
            }
        }
    }

    fn literal(&self, text: &str) -> Option<Value> {
        match self.literals.parse(text) {
            Ok(value) => Some(value),
            Err(e) => {
                render_error(&e, text);
                None
            }
        }
    }
}

/// Apply `run` to every non-empty stdin line. Returns the number of failures.
fn for_each_line(mut run: impl FnMut(&str) -> bool) -> Result<usize> {
    let stdin = std::io::stdin();
    let reader = BufReader::new(stdin.lock());

    let mut failures = 0;
    for line in reader.lines() {
        let line = line.into_diagnostic()?;
        if line.trim().is_empty() {
            continue;
        }
        if !run(&line) {
            failures += 1;
        }
    }
    Ok(failures)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG environment variable to control log level
    // Default to WARN if not set, INFO with --verbose
    let default_level = if args.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .into_diagnostic()?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let runner = Runner {
        engine: build_engine(&args)?,
        literals: LiteralParser::new(),
        debug_parse: args.debug_parse,
    };
    debug!(allowed = ?runner.engine.policy().names(), "policy ready");

    let failures = match &args.command {
        Command::Check { expression: Some(expr) } => usize::from(!runner.check(expr)),
        Command::Check { expression: None } => for_each_line(|line| runner.check(line))?,

        Command::Eval {
            expression,
            bindings,
        } => {
            let mut values = Vec::with_capacity(bindings.len());
            for (name, text) in bindings {
                let value = runner
                    .literal(text)
                    .ok_or_else(|| miette!("invalid value for --bind {name}"))?;
                values.push((name.clone(), value));
            }
            match expression {
                Some(expr) => usize::from(!runner.eval(expr, &values)),
                None => for_each_line(|line| runner.eval(line, &values))?,
            }
        }

        Command::Call {
            expression,
            argument,
        } => {
            runner.debug_parse(expression);
            let compiled = match runner.engine.compile(expression) {
                Ok(compiled) => compiled,
                Err(e) => {
                    render_error(&e, expression);
                    bail!("expression rejected");
                }
            };
            let call = |text: &str| {
                let Some(arg) = runner.literal(text) else {
                    return false;
                };
                match compiled.call(arg) {
                    Ok(value) => {
                        println!("{}", value.repr());
                        true
                    }
                    Err(e) => {
                        render_error(&e.into(), expression);
                        false
                    }
                }
            };
            match argument {
                Some(text) => usize::from(!call(text.as_str())),
                None => for_each_line(call)?,
            }
        }
    };

    if failures > 0 {
        bail!("{failures} expression(s) failed");
    }
    Ok(())
}
